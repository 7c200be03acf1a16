use nalgebra::{Isometry3, Matrix4, Translation3, UnitQuaternion, Vector3};
use rand::Rng;

use crate::game::config::CameraConfig;

/// First-person camera riding on the vehicle, with collision shake.
pub struct CameraRig {
    config: CameraConfig,
    pub position: Vector3<f32>,
    pub pitch: f32,
    pub roll: f32,
    shake: f32,
}

impl CameraRig {
    pub fn new(config: CameraConfig) -> Self {
        CameraRig {
            position: Vector3::new(0.0, config.height, config.forward_offset),
            pitch: config.pitch,
            roll: 0.0,
            shake: 0.0,
            config,
        }
    }

    pub fn shake(&self) -> f32 {
        self.shake
    }

    pub fn start_shake(&mut self) {
        self.shake = 1.0;
    }

    pub fn follow<R: Rng>(&mut self, target: &Vector3<f32>, dt: f32, rng: &mut R) {
        self.position = Vector3::new(
            target.x,
            self.config.height,
            target.z + self.config.forward_offset,
        );
        self.roll = -target.x * self.config.roll_per_offset;

        if self.shake > 0.0 {
            self.position.x += (rng.gen::<f32>() - 0.5) * self.config.shake_lateral * self.shake;
            self.position.y += (rng.gen::<f32>() - 0.5) * self.config.shake_vertical * self.shake;
            self.shake = (self.shake - dt.max(0.0) * self.config.shake_decay).max(0.0);
        }
    }

    pub fn view(&self) -> Matrix4<f32> {
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), self.pitch)
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), self.roll);
        let eye = Isometry3::from_parts(
            Translation3::new(self.position.x, self.position.y, self.position.z),
            rotation,
        );
        eye.inverse().to_homogeneous()
    }
}

/// Headlight intensity, briefly flaring after an impact.
pub struct Headlight {
    base: f32,
    pulse_gain: f32,
    decay: f32,
    pulse: f32,
}

impl Headlight {
    pub fn new(config: &CameraConfig) -> Self {
        Headlight {
            base: config.headlight_intensity,
            pulse_gain: config.headlight_pulse,
            decay: config.headlight_decay,
            pulse: 0.0,
        }
    }

    pub fn pulse(&mut self) {
        self.pulse = 1.0;
    }

    pub fn update(&mut self, dt: f32) {
        self.pulse = (self.pulse - dt.max(0.0) * self.decay).max(0.0);
    }

    pub fn intensity(&self) -> f32 {
        self.base + self.pulse * self.pulse_gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn follows_with_fixed_offsets() {
        let mut rig = CameraRig::new(CameraConfig::default());
        let mut rng = SmallRng::seed_from_u64(1);
        rig.follow(&Vector3::new(1.5, 0.0, -120.0), DT, &mut rng);
        assert!((rig.position - Vector3::new(1.5, 2.7, -118.8)).norm() < 1e-4);
        assert!((rig.roll + 0.012).abs() < 1e-6);
    }

    #[test]
    fn shake_is_bounded_and_decays() {
        let mut rig = CameraRig::new(CameraConfig::default());
        let mut rng = SmallRng::seed_from_u64(2);
        let target = Vector3::new(0.0, 0.0, -10.0);
        rig.start_shake();
        let mut last = rig.shake();
        let mut frames = 0;
        while rig.shake() > 0.0 {
            let before = rig.shake();
            rig.follow(&target, DT, &mut rng);
            assert!((rig.position.x - target.x).abs() <= 0.05 * before + 1e-6);
            assert!((rig.position.y - 2.7).abs() <= 0.025 * before + 1e-6);
            assert!(rig.shake() < last);
            last = rig.shake();
            frames += 1;
        }
        assert!((29..=31).contains(&frames));
        rig.follow(&target, DT, &mut rng);
        assert!((rig.position - Vector3::new(0.0, 2.7, -8.8)).norm() < 1e-5);
    }

    #[test]
    fn view_maps_eye_to_origin() {
        let mut rig = CameraRig::new(CameraConfig::default());
        let mut rng = SmallRng::seed_from_u64(3);
        rig.follow(&Vector3::new(-4.5, 0.0, -50.0), DT, &mut rng);
        let eye = Point3::from(rig.position);
        let mapped = rig.view().transform_point(&eye);
        assert!(mapped.coords.norm() < 1e-4);
    }

    #[test]
    fn headlight_pulse_fades_back_to_base() {
        let mut light = Headlight::new(&CameraConfig::default());
        assert_eq!(light.intensity(), 0.8);
        light.pulse();
        assert!((light.intensity() - 2.0).abs() < 1e-6);
        for _ in 0..31 {
            light.update(DT);
        }
        assert_eq!(light.intensity(), 0.8);
    }
}
