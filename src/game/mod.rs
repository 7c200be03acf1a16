pub mod aabb;
pub mod camera;
pub mod config;
pub mod hazards;
pub mod input;
pub mod road;
pub mod simulation;
pub mod smoothing;
pub mod vehicle;

use nalgebra::{Matrix4, Perspective3, Vector3};
use wasm_bindgen::JsValue;

use crate::engine::audio::AudioManager;
use crate::engine::mesh::Mesh;
use crate::engine::renderer::{Atmosphere, GpuMesh, Renderer};
use crate::game::config::{AppConfig, ModelConfig};
use crate::game::hazards::{HazardFate, PartShape};
use crate::game::road::DecorationKind;
use crate::game::simulation::Simulation;
use crate::game::vehicle::Vehicle;

const ENGINE_SOUND: &str = "engine";
const HIT_SOUND: &str = "hit";

const SKY: [f32; 3] = [0.02, 0.03, 0.07];
const FLASH_TINT: [f32; 3] = [1.0, 0.15, 0.1];

/// CPU-side meshes handed over by the loader, one per template slot.
pub struct LoadedMeshes {
    pub vehicle: Mesh,
    pub tree: Mesh,
    pub grass: Mesh,
    pub rock: Mesh,
}

struct Template {
    mesh: GpuMesh,
    model: ModelConfig,
}

/// Shared GPU meshes; instances only carry a class tag and a transform.
struct Templates {
    vehicle: Template,
    decorations: Vec<Template>,
    parts: Vec<GpuMesh>,
}

impl Templates {
    fn upload(renderer: &Renderer, config: &AppConfig, meshes: LoadedMeshes) -> Result<Self, JsValue> {
        let vehicle_model = config.vehicle_model.clone().unwrap_or_default();

        let mut decorations = Vec::with_capacity(DecorationKind::ALL.len());
        for kind in DecorationKind::ALL {
            let (mesh, model) = match kind {
                DecorationKind::Tree => (&meshes.tree, config.tree_model.clone()),
                DecorationKind::Grass => (&meshes.grass, config.grass_model.clone()),
                DecorationKind::Rock => (&meshes.rock, ModelConfig::default()),
            };
            debug_assert_eq!(decorations.len(), kind.template_index());
            decorations.push(Template { mesh: renderer.upload(mesh)?, model });
        }

        let mut parts = Vec::with_capacity(PartShape::ALL.len());
        for shape in PartShape::ALL {
            let mesh = match shape {
                PartShape::Cone => crate::engine::mesh::spike(),
                PartShape::Column => crate::engine::mesh::column(),
                PartShape::Body => crate::engine::mesh::body(),
                PartShape::Head => crate::engine::mesh::head(),
            };
            parts.push(renderer.upload(&mesh)?);
        }

        Ok(Templates {
            vehicle: Template { mesh: renderer.upload(&meshes.vehicle)?, model: vehicle_model },
            decorations,
            parts,
        })
    }
}

/// Model matrix for one instance of a template, applying its import offsets.
pub fn instance_matrix(model: &ModelConfig, position: Vector3<f32>, rotation: Vector3<f32>, scale: f32) -> Matrix4<f32> {
    let offset = Vector3::new(0.0, model.position_offset_y, 0.0);
    let s = model.scale * scale;
    Matrix4::new_translation(&(position + offset)) *
        Matrix4::from_euler_angles(
            rotation.x + model.rotation_offset_x,
            rotation.y + model.rotation_offset_y,
            rotation.z + model.rotation_offset_z,
        ) *
        Matrix4::new_scaling(s)
}

/// Engine loop loudness: an idle floor plus a share that follows speed.
pub fn engine_volume(base: f32, speed_ratio: f32) -> f64 {
    (base * (0.3 + 0.7 * speed_ratio.clamp(0.0, 1.0))) as f64
}

/// Speed in km/h and distance in metres, one world unit being a metre.
pub fn hud_readout(vehicle: &Vehicle, frame_scale: f32) -> (u32, u32) {
    let kmh = vehicle.speed() * frame_scale * 3.6;
    (kmh.round() as u32, vehicle.distance_travelled().max(0.0) as u32)
}

pub struct Game {
    renderer: Renderer,
    config: AppConfig,
    pub sim: Simulation,
    templates: Templates,
    audio: AudioManager,
    engine_running: bool,
    last_timestamp: Option<f64>,
}

impl Game {
    pub fn new(renderer: Renderer, config: AppConfig, meshes: LoadedMeshes, audio: AudioManager, seed: u64) -> Result<Self, JsValue> {
        let templates = Templates::upload(&renderer, &config, meshes)?;
        let sim = Simulation::new(&config, seed);
        log::info!(
            "game ready: {:?}, {} lanes, {} road segments, hazards {}",
            config.vehicle.kind,
            config.lanes.count,
            sim.road.segments().len(),
            if sim.hazards.enabled() { "on" } else { "off" }
        );
        Ok(Game {
            renderer,
            config,
            sim,
            templates,
            audio,
            engine_running: false,
            last_timestamp: None,
        })
    }

    pub fn handle_key(&mut self, key: &str, pressed: bool) -> bool {
        let handled = self.sim.input.key(key, pressed, &mut self.sim.vehicle);
        if handled {
            self.start_engine();
        }
        handled
    }

    pub fn touch(&mut self, button: &str, pressed: bool) {
        if self.sim.input.button(button, pressed, &mut self.sim.vehicle) {
            self.start_engine();
        }
    }

    pub fn release_all(&mut self) {
        self.sim.input.release_all(&mut self.sim.vehicle);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.audio.mute_all(muted);
        if muted && self.engine_running {
            self.audio.stop(ENGINE_SOUND);
            self.engine_running = false;
        }
    }

    pub fn is_muted(&self) -> bool {
        self.audio.is_muted()
    }

    // Browsers only allow playback after a user gesture.
    fn start_engine(&mut self) {
        if !self.engine_running {
            self.engine_running = true;
            let volume = engine_volume(self.config.audio.volume, self.sim.vehicle.speed_ratio());
            self.audio.play(ENGINE_SOUND, true, volume);
        }
    }

    /// Advances and draws one animation frame; `timestamp` is in milliseconds.
    pub fn frame(&mut self, timestamp: f64) {
        let dt = match self.last_timestamp {
            Some(last) => ((timestamp - last) / 1000.0).max(0.0) as f32,
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp);

        let report = self.sim.step(dt);

        if self.engine_running {
            let volume = engine_volume(self.config.audio.volume, self.sim.vehicle.speed_ratio());
            self.audio.set_volume(ENGINE_SOUND, volume);
        }
        for removed in &report.removed {
            if removed.fate == HazardFate::Collided {
                self.audio.play(HIT_SOUND, false, self.config.audio.volume as f64);
            }
        }

        self.render();
    }

    pub fn hud(&self) -> (u32, u32) {
        hud_readout(&self.sim.vehicle, self.config.vehicle.frame_scale)
    }

    fn render(&self) {
        let Some(canvas) = self.renderer.canvas() else {
            return;
        };
        let width = canvas.width();
        let height = canvas.height().max(1);
        self.renderer.resize(width as i32, height as i32);

        let camera = &self.config.camera;
        let aspect = width as f32 / height as f32;
        let projection = Perspective3::new(aspect, camera.fov_degrees.to_radians(), 0.1, camera.far).to_homogeneous();
        self.renderer.set_projection(&projection);
        self.renderer.set_atmosphere(&Atmosphere {
            sky: SKY,
            headlight: self.sim.headlight.intensity(),
            ..Atmosphere::default()
        });
        self.renderer.clear(SKY[0], SKY[1], SKY[2]);

        let view = self.sim.camera.view();
        self.draw_road(&view);
        self.draw_decorations(&view);
        self.draw_hazards(&view);
        self.draw_vehicle(&view);
    }

    fn draw_road(&self, view: &Matrix4<f32>) {
        let road = self.sim.road.config();
        let lanes = self.sim.road.lanes();
        let length = road.segment_length;
        let boundaries = lanes.boundaries();

        for segment in self.sim.road.segments() {
            let z = segment.z;
            self.renderer.draw_cube(0.0, -0.6, z, road.ground_width, 0.1, length, 0.05, 0.12, 0.06, view);
            self.renderer.draw_cube(0.0, -0.5, z, road.paved_width, 0.1, length, 0.12, 0.12, 0.13, view);

            for side in [-1.0, 1.0] {
                let edge = side * lanes.road_width / 2.0;
                self.renderer.draw_cube(edge, -0.44, z, 0.15, 0.02, length, 0.8, 0.8, 0.75, view);
            }

            let dashes = (length / 10.0).floor() as usize;
            for x in &boundaries {
                for k in 0..dashes {
                    let dash_z = z - length / 2.0 + 10.0 * k as f32 + 5.0;
                    self.renderer.draw_cube(*x, -0.44, dash_z, 0.12, 0.02, 4.0, 0.85, 0.85, 0.6, view);
                }
            }
        }
    }

    fn draw_decorations(&self, view: &Matrix4<f32>) {
        for decoration in self.sim.road.decorations() {
            let template = &self.templates.decorations[decoration.kind.template_index()];
            let model = instance_matrix(
                &template.model,
                Vector3::new(decoration.x, decoration.y - 0.45, decoration.z),
                Vector3::new(0.0, decoration.rotation_y, 0.0),
                decoration.scale,
            );
            self.renderer.draw_mesh(&template.mesh, &model, view, None);
        }
    }

    fn draw_hazards(&self, view: &Matrix4<f32>) {
        for hazard in self.sim.hazards.hazards() {
            let placement = Matrix4::new_translation(&hazard.position) *
                Matrix4::from_euler_angles(0.0, hazard.rotation_y, 0.0);
            for part in &hazard.parts {
                let model = placement *
                    Matrix4::new_translation(&(part.offset * hazard.scale)) *
                    Matrix4::new_scaling(hazard.scale);
                let mesh = &self.templates.parts[part.shape.template_index()];
                self.renderer.draw_mesh(mesh, &model, view, None);
            }
        }
    }

    fn draw_vehicle(&self, view: &Matrix4<f32>) {
        let vehicle = &self.sim.vehicle;
        let vibration = vehicle.vibration();
        let position = vehicle.position();
        let body = Vector3::new(
            position.x + vibration.offset_x,
            self.config.vehicle.body_center_y + vibration.offset_y,
            position.z,
        );
        let rotation = Vector3::new(0.0, -vehicle.steering() * 0.1, vehicle.tilt() + vibration.pivot_roll);
        let model = instance_matrix(&self.templates.vehicle.model, body, rotation, 1.0);
        let tint = vehicle.is_flashing().then_some((FLASH_TINT, 0.6));
        self.renderer.draw_mesh(&self.templates.vehicle.mesh, &model, view, tint);
    }
}
