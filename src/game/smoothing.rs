use serde::{Deserialize, Serialize};

/// Exponential approach used for lateral drift, steering and spawn growth.
///
/// `PerFrame` applies a flat factor every update regardless of the elapsed
/// time, so its convergence speed depends on the frame rate. `TimeScaled`
/// derives the factor from `dt` and converges at the same wall-clock rate
/// whatever the frame rate is.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Smoothing {
    PerFrame { factor: f32 },
    TimeScaled { rate: f32 },
}

/// Decay rate whose 60 Hz step equals a per-frame factor of 0.1.
pub const REFERENCE_RATE: f32 = 6.321_631;

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing::TimeScaled { rate: REFERENCE_RATE }
    }
}

impl Smoothing {
    pub fn alpha(&self, dt: f32) -> f32 {
        match *self {
            Smoothing::PerFrame { factor } => factor.clamp(0.0, 1.0),
            Smoothing::TimeScaled { rate } => 1.0 - (-rate * dt.max(0.0)).exp(),
        }
    }

    pub fn approach(&self, current: f32, target: f32, dt: f32) -> f32 {
        current + (target - current) * self.alpha(dt)
    }
}

/// Moves `current` toward `target` by at most `step`, never overshooting.
pub fn step_toward(current: f32, target: f32, step: f32) -> f32 {
    if current < target {
        (current + step).min(target)
    } else {
        (current - step).max(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_time_scaled() {
        assert!(matches!(Smoothing::default(), Smoothing::TimeScaled { .. }));
    }

    #[test]
    fn modes_agree_at_sixty_hz() {
        let per_frame = Smoothing::PerFrame { factor: 0.1 };
        let scaled = Smoothing::default();
        assert!((per_frame.alpha(1.0 / 60.0) - scaled.alpha(1.0 / 60.0)).abs() < 1e-4);
    }

    #[test]
    fn per_frame_ignores_frame_rate() {
        let per_frame = Smoothing::PerFrame { factor: 0.1 };
        let mut slow = 0.0;
        let mut fast = 0.0;
        for _ in 0..30 {
            slow = per_frame.approach(slow, 1.0, 1.0 / 30.0);
        }
        for _ in 0..60 {
            fast = per_frame.approach(fast, 1.0, 1.0 / 60.0);
        }
        // one second of wall time, different progress
        assert!(fast - slow > 0.01);
    }

    #[test]
    fn time_scaled_is_frame_rate_independent() {
        let scaled = Smoothing::default();
        let mut slow = 0.0;
        let mut fast = 0.0;
        for _ in 0..30 {
            slow = scaled.approach(slow, 1.0, 1.0 / 30.0);
        }
        for _ in 0..60 {
            fast = scaled.approach(fast, 1.0, 1.0 / 60.0);
        }
        assert!((fast - slow).abs() < 1e-4);
    }

    #[test]
    fn zero_dt_holds_position() {
        assert_eq!(Smoothing::default().approach(2.0, 5.0, 0.0), 2.0);
    }

    #[test]
    fn step_toward_clamps_at_target() {
        assert_eq!(step_toward(0.0, 1.0, 0.3), 0.3);
        assert_eq!(step_toward(0.9, 1.0, 0.3), 1.0);
        assert_eq!(step_toward(0.5, -1.0, 0.2), 0.3);
        assert_eq!(step_toward(-0.95, -1.0, 0.2), -1.0);
    }
}
