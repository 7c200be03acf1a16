use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::game::camera::{CameraRig, Headlight};
use crate::game::config::AppConfig;
use crate::game::hazards::{HazardManager, HazardPart, PartShape, RemovedHazard};
use crate::game::input::InputRouter;
use crate::game::road::Road;
use crate::game::vehicle::Vehicle;

/// What happened during one step, for the presentation layer.
#[derive(Debug, Default)]
pub struct FrameReport {
    pub collided: bool,
    pub spawned: Option<u64>,
    pub removed: Vec<RemovedHazard>,
}

/// Hazard parts currently in play, counted per shape.
///
/// Parts are taken when a hazard enters play and handed back from its
/// removal record, so the count only drifts if a removal goes missing.
#[derive(Debug, Default)]
pub struct PartLedger {
    live: [usize; PartShape::ALL.len()],
}

impl PartLedger {
    pub fn acquire(&mut self, parts: &[HazardPart]) {
        for part in parts {
            self.live[part.shape.template_index()] += 1;
        }
    }

    pub fn release(&mut self, removed: &RemovedHazard) {
        for part in &removed.parts {
            let slot = &mut self.live[part.shape.template_index()];
            match slot.checked_sub(1) {
                Some(left) => *slot = left,
                None => log::warn!("hazard {} returned an untracked {:?}", removed.id, part.shape),
            }
        }
        log::debug!(
            "hazard {} ({:?}) {:?}: {} part(s) returned, {} live",
            removed.id,
            removed.kind,
            removed.fate,
            removed.parts.len(),
            self.total()
        );
    }

    pub fn live(&self, shape: PartShape) -> usize {
        self.live[shape.template_index()]
    }

    pub fn total(&self) -> usize {
        self.live.iter().sum()
    }
}

/// Everything that moves, stepped in a fixed order once per animation frame.
pub struct Simulation {
    pub vehicle: Vehicle,
    pub road: Road,
    pub hazards: HazardManager,
    pub camera: CameraRig,
    pub headlight: Headlight,
    pub input: InputRouter,
    pub parts: PartLedger,
    elapsed: f32,
    frames: u64,
    rng: SmallRng,
}

impl Simulation {
    pub fn new(config: &AppConfig, seed: u64) -> Self {
        Simulation {
            vehicle: Vehicle::new(config.vehicle.clone(), config.lanes),
            road: Road::new(config.road.clone(), config.lanes, seed),
            hazards: HazardManager::new(
                config.hazards.clone(),
                config.lanes,
                config.vehicle.smoothing,
                seed.wrapping_add(1),
            ),
            camera: CameraRig::new(config.camera.clone()),
            headlight: Headlight::new(&config.camera),
            input: InputRouter::new(),
            parts: PartLedger::default(),
            elapsed: 0.0,
            frames: 0,
            rng: SmallRng::seed_from_u64(seed.wrapping_add(2)),
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn step(&mut self, dt: f32) -> FrameReport {
        let dt = dt.max(0.0);
        self.elapsed += dt;
        self.frames += 1;

        self.input.sync(&mut self.vehicle);
        self.vehicle.update(dt);
        let position = self.vehicle.position();

        self.road.advance(dt, self.vehicle.speed(), position.z);
        self.headlight.update(dt);

        let mut report = FrameReport::default();
        if self.hazards.enabled() {
            report.spawned = self.hazards.spawn_if_due(dt, &position);
        }
        for id in self.hazards.drain_spawned() {
            if let Some(hazard) = self.hazards.hazards().iter().find(|h| h.id == id) {
                self.parts.acquire(&hazard.parts);
            }
        }
        if self.hazards.enabled() {
            self.hazards.advance(dt, &position);
        }
        report.collided = self.hazards.check_collision(&self.vehicle.bounds());
        if report.collided {
            self.vehicle.hit();
            self.camera.start_shake();
            self.headlight.pulse();
        }

        self.camera.follow(&position, dt, &mut self.rng);
        report.removed = self.hazards.drain_removed();
        for removed in &report.removed {
            self.parts.release(removed);
        }

        if self.frames % 600 == 0 {
            log::debug!(
                "frame {} | speed {:.3}/{:.3} | distance {:.0} | hazards {}",
                self.frames,
                self.vehicle.speed(),
                self.vehicle.max_speed(),
                self.vehicle.distance_travelled(),
                self.hazards.len()
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::HazardConfig;
    use crate::game::hazards::{HazardFate, HazardKind, PartShape};
    use crate::game::vehicle::Control;

    const DT: f32 = 1.0 / 60.0;

    fn calm_config() -> AppConfig {
        AppConfig {
            hazards: HazardConfig { enabled: false, ..Default::default() },
            ..Default::default()
        }
    }

    #[test]
    fn driving_streams_the_road_and_moves_the_camera() {
        let mut sim = Simulation::new(&calm_config(), 9);
        sim.input.key("ArrowRight", true, &mut sim.vehicle);
        sim.input.key("w", true, &mut sim.vehicle);
        assert!(sim.input.is_held(Control::Accelerate));
        for _ in 0..1200 {
            sim.step(DT);
        }
        assert!(sim.vehicle.speed() > 0.3);
        assert!(sim.road.recycled_segments() > 0);
        assert_eq!(sim.vehicle.current_lane(), 2);

        let vz = sim.vehicle.position().z;
        let mut zs: Vec<f32> = sim.road.segments().iter().map(|s| s.z).collect();
        zs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for pair in zs.windows(2) {
            assert!((pair[1] - pair[0] - 100.0).abs() < 0.1);
        }
        assert!(zs.iter().all(|z| *z <= vz + 50.0));

        if sim.camera.shake() == 0.0 {
            assert!((sim.camera.position.z - (vz + 1.2)).abs() < 1e-3);
            assert!((sim.camera.position.x - sim.vehicle.position().x).abs() < 1e-5);
        }
        assert_eq!(sim.frames(), 1200);
    }

    #[test]
    fn collision_triggers_feedback() {
        let mut sim = Simulation::new(&calm_config(), 1);
        sim.input.key("ArrowUp", true, &mut sim.vehicle);
        for _ in 0..240 {
            sim.step(DT);
        }
        sim.input.key("ArrowUp", false, &mut sim.vehicle);
        let speed_before = sim.vehicle.speed();

        let center = sim.vehicle.bounds().center();
        sim.hazards.insert(HazardKind::Brute, 1, center);
        let report = sim.step(DT);

        assert!(report.collided);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].fate, HazardFate::Collided);
        assert!(sim.vehicle.speed() < speed_before - 0.09);
        assert!(sim.vehicle.is_flashing());
        assert!((sim.camera.shake() - (1.0 - 2.0 * DT)).abs() < 1e-5);
        assert!(sim.headlight.intensity() > 1.9);
        assert_eq!(report.removed[0].parts.len(), 2);
        assert_eq!(sim.parts.total(), 0);

        let report = sim.step(DT);
        assert!(!report.collided);
    }

    #[test]
    fn disabled_hazards_never_spawn() {
        let mut sim = Simulation::new(&calm_config(), 4);
        sim.input.key("z", true, &mut sim.vehicle);
        for _ in 0..3600 {
            let report = sim.step(DT);
            assert!(report.spawned.is_none());
            assert!(!report.collided);
        }
        assert!(sim.hazards.is_empty());
    }

    #[test]
    fn enabled_hazards_eventually_spawn_and_clear() {
        let mut sim = Simulation::new(&AppConfig::default(), 12);
        let mut spawned = 0;
        let mut removed = 0;
        for _ in 0..60 * 60 {
            let report = sim.step(DT);
            spawned += report.spawned.is_some() as usize;
            removed += report.removed.len();
        }
        assert!(spawned > 0);
        assert_eq!(spawned, removed + sim.hazards.len());
        let in_play: usize = sim.hazards.hazards().iter().map(|h| h.parts.len()).sum();
        assert_eq!(sim.parts.total(), in_play);
    }

    #[test]
    fn ledger_returns_every_part_of_removed_hazards() {
        let mut sim = Simulation::new(&calm_config(), 3);
        sim.hazards.spawn(HazardKind::Brute, 0, -400.0);
        sim.hazards.spawn(HazardKind::Spike, 3, -400.0);
        sim.step(DT);
        assert_eq!(sim.parts.live(PartShape::Body), 1);
        assert_eq!(sim.parts.live(PartShape::Head), 1);
        assert_eq!(sim.parts.live(PartShape::Cone), 1);
        assert_eq!(sim.parts.total(), 3);

        let center = sim.vehicle.bounds().center();
        sim.hazards.insert(HazardKind::Pillar, 1, center);
        let report = sim.step(DT);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].kind, HazardKind::Pillar);
        assert_eq!(sim.parts.live(PartShape::Column), 0);
        assert_eq!(sim.parts.total(), 3);

        let mut ledger = PartLedger::default();
        ledger.acquire(&HazardKind::Brute.parts());
        let removed = RemovedHazard {
            id: 0,
            kind: HazardKind::Brute,
            fate: HazardFate::Retired,
            parts: HazardKind::Brute.parts(),
        };
        ledger.release(&removed);
        ledger.release(&removed);
        assert_eq!(ledger.total(), 0);
    }

    #[test]
    fn same_seed_same_run() {
        let mut a = Simulation::new(&AppConfig::default(), 77);
        let mut b = Simulation::new(&AppConfig::default(), 77);
        for sim in [&mut a, &mut b] {
            sim.input.key("ArrowUp", true, &mut sim.vehicle);
        }
        for i in 0..2000 {
            if i == 500 {
                for sim in [&mut a, &mut b] {
                    sim.input.key("a", true, &mut sim.vehicle);
                }
            }
            let ra = a.step(DT);
            let rb = b.step(DT);
            assert_eq!(ra.collided, rb.collided);
            assert_eq!(ra.spawned, rb.spawned);
        }
        assert_eq!(a.vehicle.position(), b.vehicle.position());
        assert_eq!(a.hazards.len(), b.hazards.len());
    }
}
