use nalgebra::Vector3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

use crate::game::aabb::Aabb;
use crate::game::config::{HazardConfig, LaneLayout};
use crate::game::smoothing::Smoothing;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HazardKind {
    Spike,
    Pillar,
    Brute,
}

impl HazardKind {
    pub const ALL: [HazardKind; 3] = [HazardKind::Spike, HazardKind::Pillar, HazardKind::Brute];

    /// Parts making up one creature, in local space at unit scale.
    pub fn parts(&self) -> Vec<HazardPart> {
        match self {
            HazardKind::Spike => vec![HazardPart {
                shape: PartShape::Cone,
                offset: Vector3::zeros(),
                half_extents: Vector3::new(0.4, 0.6, 0.4),
            }],
            HazardKind::Pillar => vec![HazardPart {
                shape: PartShape::Column,
                offset: Vector3::zeros(),
                half_extents: Vector3::new(0.3, 0.75, 0.3),
            }],
            HazardKind::Brute => vec![
                HazardPart {
                    shape: PartShape::Body,
                    offset: Vector3::zeros(),
                    half_extents: Vector3::repeat(0.5),
                },
                HazardPart {
                    shape: PartShape::Head,
                    offset: Vector3::new(0.0, 0.8, 0.0),
                    half_extents: Vector3::repeat(0.3),
                },
            ],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartShape {
    Cone,
    Column,
    Body,
    Head,
}

impl PartShape {
    pub const ALL: [PartShape; 4] = [PartShape::Cone, PartShape::Column, PartShape::Body, PartShape::Head];

    pub fn template_index(&self) -> usize {
        match self {
            PartShape::Cone => 0,
            PartShape::Column => 1,
            PartShape::Body => 2,
            PartShape::Head => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HazardPart {
    pub shape: PartShape,
    pub offset: Vector3<f32>,
    pub half_extents: Vector3<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HazardState {
    Spawned,
    Advancing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HazardFate {
    Retired,
    Collided,
}

#[derive(Clone, Debug)]
pub struct Hazard {
    pub id: u64,
    pub kind: HazardKind,
    pub lane: usize,
    pub state: HazardState,
    pub position: Vector3<f32>,
    pub base_y: f32,
    pub rotation_y: f32,
    pub scale: f32,
    pub parts: Vec<HazardPart>,
}

impl Hazard {
    pub fn bounds(&self) -> Aabb {
        self.parts
            .iter()
            .map(|p| Aabb::from_center_half_extents(p.offset * self.scale, p.half_extents * self.scale))
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| Aabb::from_center_half_extents(Vector3::zeros(), Vector3::zeros()))
            .translated(self.position)
    }
}

/// A hazard taken out of play, with the parts it owned.
#[derive(Clone, Debug)]
pub struct RemovedHazard {
    pub id: u64,
    pub kind: HazardKind,
    pub fate: HazardFate,
    pub parts: Vec<HazardPart>,
}

pub struct HazardManager {
    config: HazardConfig,
    lanes: LaneLayout,
    growth: Smoothing,
    hazards: Vec<Hazard>,
    fresh: Vec<u64>,
    removed: Vec<RemovedHazard>,
    spawn_timer: f32,
    elapsed: f32,
    next_id: u64,
    rng: SmallRng,
}

impl HazardManager {
    pub fn new(config: HazardConfig, lanes: LaneLayout, growth: Smoothing, seed: u64) -> Self {
        HazardManager {
            config,
            lanes,
            growth,
            hazards: Vec::new(),
            fresh: Vec::new(),
            removed: Vec::new(),
            spawn_timer: 0.0,
            elapsed: 0.0,
            next_id: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    pub fn len(&self) -> usize {
        self.hazards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hazards.is_empty()
    }

    pub fn spawn_chance(&self, vehicle_position: &Vector3<f32>) -> f32 {
        (self.config.base_chance + vehicle_position.norm() * self.config.chance_per_distance)
            .min(self.config.max_chance)
    }

    /// Rolls for a new hazard once the minimum interval has passed.
    pub fn spawn_if_due(&mut self, dt: f32, vehicle_position: &Vector3<f32>) -> Option<u64> {
        self.spawn_timer += dt.max(0.0);
        if self.spawn_timer <= self.config.min_spawn_interval {
            return None;
        }
        let chance = self.spawn_chance(vehicle_position);
        if self.rng.gen::<f32>() >= chance {
            return None;
        }
        self.spawn_timer = 0.0;

        let lane = self.rng.gen_range(0..self.lanes.count.max(1));
        let distance = self.config.spawn_distance + self.rng.gen::<f32>() * self.config.spawn_jitter;
        let kind = HazardKind::ALL[self.rng.gen_range(0..HazardKind::ALL.len())];
        Some(self.spawn(kind, lane, vehicle_position.z - distance))
    }

    /// Places a hazard at the centre of `lane`, `z` in world space.
    pub fn spawn(&mut self, kind: HazardKind, lane: usize, z: f32) -> u64 {
        let lane = lane.min(self.lanes.last_lane());
        let x = self.lanes.center(lane);
        let position = Vector3::new(x, self.config.base_height, z);
        self.insert(kind, lane, position)
    }

    pub(crate) fn insert(&mut self, kind: HazardKind, lane: usize, position: Vector3<f32>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let rotation_y = self.rng.gen::<f32>() * TAU;
        self.hazards.push(Hazard {
            id,
            kind,
            lane,
            state: HazardState::Spawned,
            position,
            base_y: position.y,
            rotation_y,
            scale: self.config.initial_scale,
            parts: kind.parts(),
        });
        self.fresh.push(id);
        log::debug!("hazard {} ({:?}) spawned in lane {} at z {:.1}", id, kind, lane, position.z);
        id
    }

    pub fn advance(&mut self, dt: f32, vehicle_position: &Vector3<f32>) {
        let dt = dt.max(0.0);
        self.elapsed += dt;
        for (i, hazard) in self.hazards.iter_mut().enumerate() {
            hazard.state = HazardState::Advancing;
            hazard.position.y = hazard.base_y + (self.elapsed + i as f32).sin() * self.config.bob_amplitude;
            hazard.rotation_y += dt * self.config.spin_speed;
            hazard.position.z += dt * self.config.closing_speed;
            hazard.scale = self.growth.approach(hazard.scale, 1.0, dt);
        }

        let limit = vehicle_position.z + self.config.retire_margin;
        let mut i = 0;
        while i < self.hazards.len() {
            if self.hazards[i].position.z > limit {
                let hazard = self.hazards.remove(i);
                self.release(hazard, HazardFate::Retired);
            } else {
                i += 1;
            }
        }
    }

    /// Removes the oldest hazard touching the (margin-expanded) vehicle box.
    /// At most one hazard is reported per call.
    pub fn check_collision(&mut self, vehicle_bounds: &Aabb) -> bool {
        let target = vehicle_bounds.expanded(self.config.collision_margin);
        match self.hazards.iter().position(|h| h.bounds().intersects(&target)) {
            Some(index) => {
                let hazard = self.hazards.remove(index);
                self.release(hazard, HazardFate::Collided);
                true
            }
            None => false,
        }
    }

    fn release(&mut self, hazard: Hazard, fate: HazardFate) {
        log::debug!(
            "hazard {} {:?}, releasing {} part(s)",
            hazard.id,
            fate,
            hazard.parts.len()
        );
        self.removed.push(RemovedHazard {
            id: hazard.id,
            kind: hazard.kind,
            fate,
            parts: hazard.parts,
        });
    }

    /// Ids placed since the last call, oldest first.
    pub fn drain_spawned(&mut self) -> Vec<u64> {
        std::mem::take(&mut self.fresh)
    }

    pub fn drain_removed(&mut self) -> Vec<RemovedHazard> {
        std::mem::take(&mut self.removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::VehicleConfig;
    use crate::game::vehicle::Vehicle;

    const DT: f32 = 1.0 / 60.0;

    fn manager() -> HazardManager {
        HazardManager::new(HazardConfig::default(), LaneLayout::default(), Smoothing::default(), 5)
    }

    fn parked_vehicle(lane: usize) -> Vehicle {
        let config = VehicleConfig { start_lane: lane, ..Default::default() };
        Vehicle::new(config, LaneLayout::default())
    }

    #[test]
    fn nothing_spawns_before_interval() {
        let mut m = manager();
        let origin = Vector3::zeros();
        for _ in 0..89 {
            assert!(m.spawn_if_due(DT, &origin).is_none());
        }
        assert!(m.is_empty());
    }

    #[test]
    fn spawns_ahead_in_a_lane() {
        let mut m = manager();
        let position = Vector3::new(0.0, 0.0, -100.0);
        let mut spawned = None;
        for _ in 0..10_000 {
            spawned = m.spawn_if_due(DT, &position);
            if spawned.is_some() {
                break;
            }
        }
        assert!(spawned.is_some());
        let h = &m.hazards()[0];
        assert!(h.position.z <= -140.0 && h.position.z >= -160.0);
        assert_eq!(h.position.x, LaneLayout::default().center(h.lane));
        assert_eq!(h.state, HazardState::Spawned);
        assert_eq!(h.scale, 0.1);
    }

    #[test]
    fn spawn_chance_grows_with_distance_and_caps() {
        let m = manager();
        assert!((m.spawn_chance(&Vector3::zeros()) - 0.1).abs() < 1e-6);
        assert!((m.spawn_chance(&Vector3::new(0.0, 0.0, -200.0)) - 0.3).abs() < 1e-5);
        assert_eq!(m.spawn_chance(&Vector3::new(0.0, 0.0, -10_000.0)), 0.5);
    }

    #[test]
    fn hazards_close_in_and_retire_behind() {
        let mut m = manager();
        let vehicle = Vector3::zeros();
        m.spawn(HazardKind::Pillar, 0, -5.0);
        m.advance(DT, &vehicle);
        assert_eq!(m.hazards()[0].state, HazardState::Advancing);
        assert!((m.hazards()[0].position.z - (-5.0 + 5.0 * DT)).abs() < 1e-5);

        for _ in 0..199 {
            m.advance(DT, &vehicle);
        }
        assert!(m.is_empty());
        let removed = m.drain_removed();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].fate, HazardFate::Retired);
        assert_eq!(removed[0].parts.len(), 1);
        assert!(m.drain_removed().is_empty());
    }

    #[test]
    fn brute_releases_both_parts() {
        let mut m = manager();
        m.spawn(HazardKind::Brute, 1, 20.0);
        m.advance(DT, &Vector3::zeros());
        let removed = m.drain_removed();
        assert_eq!(removed[0].parts.len(), 2);
    }

    #[test]
    fn exact_overlap_collides_within_one_frame() {
        let mut m = manager();
        let vehicle = parked_vehicle(1);
        let bounds = vehicle.bounds();
        m.insert(HazardKind::Spike, 1, bounds.center());
        assert!(m.check_collision(&bounds));
        assert!(m.is_empty());
        assert!(!m.check_collision(&bounds));
    }

    #[test]
    fn hazard_outside_margin_never_flagged() {
        let mut m = manager();
        let vehicle = parked_vehicle(1);
        let bounds = vehicle.bounds();
        for kind in HazardKind::ALL {
            let id = m.insert(kind, 1, bounds.center());
            m.hazards.iter_mut().for_each(|h| h.scale = 1.0);
            let reach = m.hazards()[0].bounds().max.x - bounds.center().x;
            let clear = bounds.max.x + 0.5 + reach + 0.01;
            m.hazards[0].position.x = clear;
            assert!(!m.check_collision(&bounds), "{:?} flagged outside margin", kind);
            m.hazards[0].position.x = clear - 0.02;
            assert!(m.check_collision(&bounds), "{:?} missed inside margin", kind);
            assert_eq!(m.drain_removed()[0].id, id);
        }
    }

    #[test]
    fn neighbouring_lane_never_collides() {
        let mut m = manager();
        let vehicle = parked_vehicle(1);
        for kind in HazardKind::ALL {
            m.spawn(kind, 2, vehicle.position().z);
        }
        m.hazards.iter_mut().for_each(|h| h.scale = 1.0);
        assert!(!m.check_collision(&vehicle.bounds()));
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn lane_two_hazard_hits_aligned_vehicle_once() {
        let mut m = manager();
        let vehicle = parked_vehicle(2);
        m.spawn(HazardKind::Spike, 2, vehicle.position().z - 30.0);

        let mut reports = 0;
        for _ in 0..600 {
            m.advance(DT, &vehicle.position());
            if m.check_collision(&vehicle.bounds()) {
                reports += 1;
            }
        }
        assert_eq!(reports, 1);
        assert!(m.is_empty());
        let removed = m.drain_removed();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].fate, HazardFate::Collided);
    }

    #[test]
    fn only_first_overlap_is_reported_per_call() {
        let mut m = manager();
        let vehicle = parked_vehicle(1);
        let first = m.insert(HazardKind::Spike, 1, vehicle.bounds().center());
        m.insert(HazardKind::Pillar, 1, vehicle.bounds().center());
        assert!(m.check_collision(&vehicle.bounds()));
        assert_eq!(m.len(), 1);
        assert_eq!(m.drain_removed()[0].id, first);
        assert!(m.check_collision(&vehicle.bounds()));
        assert!(m.is_empty());
    }

    #[test]
    fn spawn_growth_approaches_full_size() {
        let mut m = manager();
        m.spawn(HazardKind::Spike, 0, -40.0);
        for _ in 0..120 {
            m.advance(DT, &Vector3::zeros());
        }
        assert!(m.hazards()[0].scale > 0.99);
    }
}
