use serde::{Deserialize, Serialize};

use crate::game::smoothing::Smoothing;
use crate::game::vehicle::VehicleKind;

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ModelConfig {
    pub path: String,
    pub scale: f32,
    pub rotation_offset_x: f32,
    pub rotation_offset_y: f32,
    pub rotation_offset_z: f32,
    pub position_offset_y: f32,
}

impl ModelConfig {
    pub fn at(path: &str) -> Self {
        ModelConfig { path: path.to_string(), ..Default::default() }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            path: String::new(),
            scale: 1.0,
            rotation_offset_x: 0.0,
            rotation_offset_y: 0.0,
            rotation_offset_z: 0.0,
            position_offset_y: 0.0,
        }
    }
}

/// Discrete driving channels across the road.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct LaneLayout {
    pub count: usize,
    pub road_width: f32,
}

impl Default for LaneLayout {
    fn default() -> Self {
        LaneLayout { count: 4, road_width: 12.0 }
    }
}

impl LaneLayout {
    pub fn lane_width(&self) -> f32 {
        self.road_width / self.count.max(1) as f32
    }

    pub fn last_lane(&self) -> usize {
        self.count.saturating_sub(1)
    }

    pub fn center(&self, lane: usize) -> f32 {
        -self.road_width / 2.0 + self.lane_width() * (lane as f32 + 0.5)
    }

    /// Lateral positions of the lines separating adjacent lanes.
    pub fn boundaries(&self) -> Vec<f32> {
        (1..self.count)
            .map(|i| -self.road_width / 2.0 + self.lane_width() * i as f32)
            .collect()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct VehicleConfig {
    pub kind: VehicleKind,
    pub start_lane: usize,
    pub max_speed: f32,
    pub max_acceleration: f32,
    pub max_deceleration: f32,
    pub engine_brake: f32,
    pub acceleration_rate: f32,
    pub deceleration_rate: f32,
    pub max_speed_growth: f32,
    pub acceleration_rate_growth: f32,
    pub frame_scale: f32,
    pub smoothing: Smoothing,
    pub steering_gain: f32,
    pub tilt_gain: f32,
    pub max_tilt: f32,
    pub hit_speed_penalty: f32,
    pub hit_flash_duration: f32,
    pub half_extents: [f32; 3],
    pub body_center_y: f32,
    pub road_noise: f32,
    pub launch_shudder: f32,
    pub base_frequency: f32,
    pub frequency_per_speed: f32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        VehicleConfig {
            kind: VehicleKind::Motorcycle,
            start_lane: 1,
            max_speed: 0.5,
            max_acceleration: 0.12,
            max_deceleration: 0.4,
            engine_brake: 0.03,
            acceleration_rate: 0.2,
            deceleration_rate: 0.3,
            max_speed_growth: 0.00001,
            acceleration_rate_growth: 0.000001,
            frame_scale: 60.0,
            smoothing: Smoothing::default(),
            steering_gain: 2.0,
            tilt_gain: 0.12,
            max_tilt: 0.35,
            hit_speed_penalty: 0.1,
            hit_flash_duration: 0.2,
            half_extents: [0.9, 0.85, 2.0],
            body_center_y: 0.1,
            road_noise: 0.015,
            launch_shudder: 0.02,
            base_frequency: 6.0,
            frequency_per_speed: 30.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct RoadConfig {
    pub segment_count: usize,
    pub segment_length: f32,
    pub paved_width: f32,
    pub ground_width: f32,
    pub segment_recycle_margin: f32,
    pub decoration_recycle_margin: f32,
    pub recycle_jitter: f32,
    pub tree_spacing: f32,
    pub grass_spacing: f32,
    pub rocks_per_segment: usize,
    pub frame_scale: f32,
}

impl Default for RoadConfig {
    fn default() -> Self {
        RoadConfig {
            segment_count: 6,
            segment_length: 100.0,
            paved_width: 16.0,
            ground_width: 80.0,
            segment_recycle_margin: 50.0,
            decoration_recycle_margin: 30.0,
            recycle_jitter: 1.0,
            tree_spacing: 25.0,
            grass_spacing: 7.0,
            rocks_per_segment: 6,
            frame_scale: 60.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct HazardConfig {
    pub enabled: bool,
    pub min_spawn_interval: f32,
    pub base_chance: f32,
    pub chance_per_distance: f32,
    pub max_chance: f32,
    pub spawn_distance: f32,
    pub spawn_jitter: f32,
    pub base_height: f32,
    pub closing_speed: f32,
    pub spin_speed: f32,
    pub bob_amplitude: f32,
    pub retire_margin: f32,
    pub collision_margin: f32,
    pub initial_scale: f32,
}

impl Default for HazardConfig {
    fn default() -> Self {
        HazardConfig {
            enabled: true,
            min_spawn_interval: 1.5,
            base_chance: 0.1,
            chance_per_distance: 0.001,
            max_chance: 0.5,
            spawn_distance: 40.0,
            spawn_jitter: 20.0,
            base_height: 0.6,
            closing_speed: 5.0,
            spin_speed: 0.5,
            bob_amplitude: 0.1,
            retire_margin: 10.0,
            collision_margin: 0.5,
            initial_scale: 0.1,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct CameraConfig {
    pub height: f32,
    pub forward_offset: f32,
    pub pitch: f32,
    pub roll_per_offset: f32,
    pub shake_lateral: f32,
    pub shake_vertical: f32,
    pub shake_decay: f32,
    pub fov_degrees: f32,
    pub far: f32,
    pub headlight_intensity: f32,
    pub headlight_pulse: f32,
    pub headlight_decay: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            height: 2.7,
            forward_offset: 1.2,
            pitch: -0.15,
            roll_per_offset: 0.008,
            shake_lateral: 0.1,
            shake_vertical: 0.05,
            shake_decay: 2.0,
            fov_degrees: 75.0,
            far: 4000.0,
            headlight_intensity: 0.8,
            headlight_pulse: 1.2,
            headlight_decay: 3.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AudioConfig {
    pub engine_path: String,
    pub hit_path: String,
    pub volume: f32,
    pub muted: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig {
            engine_path: "/sounds/engine.mp3".to_string(),
            hit_path: "/sounds/hit.mp3".to_string(),
            volume: 0.6,
            muted: false,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AppConfig {
    pub vehicle_model: Option<ModelConfig>,
    pub tree_model: ModelConfig,
    pub grass_model: ModelConfig,
    pub lanes: LaneLayout,
    pub vehicle: VehicleConfig,
    pub road: RoadConfig,
    pub hazards: HazardConfig,
    pub camera: CameraConfig,
    pub audio: AudioConfig,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            vehicle_model: None,
            tree_model: ModelConfig::at("/models/arbre.glb"),
            grass_model: ModelConfig::at("/models/grass.glb"),
            lanes: LaneLayout::default(),
            vehicle: VehicleConfig::default(),
            road: RoadConfig::default(),
            hazards: HazardConfig::default(),
            camera: CameraConfig::default(),
            audio: AudioConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    /// Repairs values a hand-edited config can get wrong.
    pub fn validated(mut self) -> Self {
        if self.lanes.count == 0 {
            log::warn!("lanes.count must be at least 1; using a single lane");
            self.lanes.count = 1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_centers_match_formula() {
        let lanes = LaneLayout::default();
        assert_eq!(lanes.lane_width(), 3.0);
        assert_eq!(lanes.center(0), -4.5);
        assert_eq!(lanes.center(1), -1.5);
        assert_eq!(lanes.center(3), 4.5);
        assert_eq!(lanes.boundaries(), vec![-3.0, 0.0, 3.0]);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let json = r#"{
            "vehicle": { "kind": "car", "max_speed": 0.8 },
            "hazards": { "enabled": false },
            "log_level": "debug"
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.vehicle.kind, VehicleKind::Car);
        assert_eq!(config.vehicle.max_speed, 0.8);
        assert_eq!(config.vehicle.start_lane, 1);
        assert!(!config.hazards.enabled);
        assert_eq!(config.road.segment_count, 6);
        assert_eq!(config.tree_model.path, "/models/arbre.glb");
        assert!(config.vehicle_model.is_none());
        assert_eq!(config.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let config = AppConfig { log_level: "chatty".to_string(), ..Default::default() };
        assert_eq!(config.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn zero_lanes_become_one() {
        let json = r#"{ "lanes": { "count": 0 } }"#;
        let config: AppConfig = serde_json::from_str::<AppConfig>(json).unwrap().validated();
        assert_eq!(config.lanes.count, 1);
        assert_eq!(config.lanes.lane_width(), 12.0);
        assert_eq!(config.lanes.center(0), 0.0);
        assert!(config.lanes.boundaries().is_empty());

        let raw = LaneLayout { count: 0, road_width: 12.0 };
        assert!(raw.center(0).is_finite());
    }

    #[test]
    fn smoothing_mode_is_configurable() {
        let json = r#"{ "vehicle": { "smoothing": { "mode": "per_frame", "factor": 0.2 } } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.vehicle.smoothing, Smoothing::PerFrame { factor: 0.2 });
    }
}
