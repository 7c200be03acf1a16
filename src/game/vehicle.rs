use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::game::aabb::Aabb;
use crate::game::config::{LaneLayout, VehicleConfig};
use crate::game::smoothing::step_toward;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Control {
    Left,
    Right,
    Accelerate,
    Brake,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VehicleKind {
    Car,
    Motorcycle,
}

impl VehicleKind {
    /// A car body barely rolls, a motorcycle leans fully into the turn.
    fn lean_scale(&self) -> f32 {
        match self {
            VehicleKind::Car => 0.25,
            VehicleKind::Motorcycle => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Regime {
    Accelerating,
    Braking,
    Coasting,
}

/// Cosmetic shaking derived from speed; never fed back into the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vibration {
    pub amplitude: f32,
    pub frequency: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub pivot_roll: f32,
}

pub struct Vehicle {
    config: VehicleConfig,
    lanes: LaneLayout,
    speed: f32,
    max_speed: f32,
    acceleration_rate: f32,
    current_acceleration: f32,
    current_lane: usize,
    target_lateral_offset: f32,
    position: Vector3<f32>,
    start_z: f32,
    accelerating: bool,
    braking: bool,
    steering: f32,
    tilt: f32,
    flash_timer: f32,
    elapsed: f32,
}

impl Vehicle {
    pub fn new(config: VehicleConfig, lanes: LaneLayout) -> Self {
        let current_lane = config.start_lane.min(lanes.last_lane());
        let target_lateral_offset = lanes.center(current_lane);
        Vehicle {
            speed: 0.0,
            max_speed: config.max_speed,
            acceleration_rate: config.acceleration_rate,
            current_acceleration: 0.0,
            current_lane,
            target_lateral_offset,
            position: Vector3::new(target_lateral_offset, 0.0, 0.0),
            start_z: 0.0,
            accelerating: false,
            braking: false,
            steering: 0.0,
            tilt: 0.0,
            flash_timer: 0.0,
            elapsed: 0.0,
            config,
            lanes,
        }
    }

    pub fn kind(&self) -> VehicleKind {
        self.config.kind
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn current_acceleration(&self) -> f32 {
        self.current_acceleration
    }

    pub fn current_lane(&self) -> usize {
        self.current_lane
    }

    pub fn target_lateral_offset(&self) -> f32 {
        self.target_lateral_offset
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn steering(&self) -> f32 {
        self.steering
    }

    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    pub fn is_flashing(&self) -> bool {
        self.flash_timer > 0.0
    }

    pub fn distance_travelled(&self) -> f32 {
        self.start_z - self.position.z
    }

    pub fn regime(&self) -> Regime {
        if self.braking {
            Regime::Braking
        } else if self.accelerating {
            Regime::Accelerating
        } else {
            Regime::Coasting
        }
    }

    /// Lane presses step one lane at a time; accelerate and brake are latches.
    pub fn handle_input(&mut self, control: Control, pressed: bool) {
        match control {
            Control::Left => {
                if pressed && self.current_lane > 0 {
                    self.current_lane -= 1;
                    self.update_lane_target();
                }
            }
            Control::Right => {
                if pressed && self.current_lane < self.lanes.last_lane() {
                    self.current_lane += 1;
                    self.update_lane_target();
                }
            }
            Control::Accelerate => self.accelerating = pressed,
            Control::Brake => self.braking = pressed,
        }
    }

    fn update_lane_target(&mut self) {
        self.target_lateral_offset = self.lanes.center(self.current_lane);
        log::debug!("lane {} -> target x {:.2}", self.current_lane, self.target_lateral_offset);
    }

    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.elapsed += dt;

        // endless difficulty ramp
        self.max_speed += self.config.max_speed_growth;
        self.acceleration_rate += self.config.acceleration_rate_growth;

        let (target, step) = match self.regime() {
            Regime::Accelerating => (self.config.max_acceleration, self.acceleration_rate * dt),
            Regime::Braking => (-self.config.max_deceleration, 2.0 * self.config.deceleration_rate * dt),
            Regime::Coasting => (-self.config.engine_brake, self.config.deceleration_rate * dt),
        };
        self.current_acceleration = step_toward(self.current_acceleration, target, step)
            .clamp(-self.config.max_deceleration, self.config.max_acceleration);

        self.speed = (self.speed + self.current_acceleration * dt).clamp(0.0, self.max_speed);

        let smoothing = self.config.smoothing;
        self.position.x = smoothing.approach(self.position.x, self.target_lateral_offset, dt);

        let lateral_error = self.target_lateral_offset - self.position.x;
        self.steering = smoothing.approach(self.steering, lateral_error * self.config.steering_gain, dt);
        let max_tilt = self.config.max_tilt;
        let lean = (-lateral_error * self.config.tilt_gain * self.config.kind.lean_scale()).clamp(-max_tilt, max_tilt);
        self.tilt = smoothing.approach(self.tilt, lean, dt);

        self.position.z -= self.speed * self.config.frame_scale * dt;

        if self.flash_timer > 0.0 {
            self.flash_timer = (self.flash_timer - dt).max(0.0);
        }
    }

    pub fn hit(&mut self) {
        self.speed = (self.speed - self.config.hit_speed_penalty).max(0.0);
        self.flash_timer = self.config.hit_flash_duration;
        log::info!("vehicle hit, speed now {:.3}", self.speed);
    }

    pub fn bounds(&self) -> Aabb {
        let [hx, hy, hz] = self.config.half_extents;
        let center = Vector3::new(self.position.x, self.config.body_center_y, self.position.z);
        Aabb::from_center_half_extents(center, Vector3::new(hx, hy, hz))
    }

    pub fn speed_ratio(&self) -> f32 {
        if self.max_speed > 0.0 {
            (self.speed / self.max_speed).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn vibration(&self) -> Vibration {
        let ratio = self.speed_ratio();
        let mut amplitude = self.config.road_noise * ratio;
        if self.accelerating && ratio < 0.3 {
            amplitude += self.config.launch_shudder * (1.0 - ratio / 0.3);
        }
        let frequency = self.config.base_frequency + self.config.frequency_per_speed * self.speed;
        let phase = self.elapsed * frequency * TAU;
        Vibration {
            amplitude,
            frequency,
            offset_x: amplitude * 0.5 * (phase * 1.7).sin(),
            offset_y: amplitude * (phase.sin() + 0.5 * (phase * 2.3).sin()),
            pivot_roll: amplitude * 2.0 * (phase * 0.9 + 0.4).sin(),
        }
    }
}
