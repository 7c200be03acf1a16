use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::{PI, TAU};

use crate::game::config::{LaneLayout, RoadConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecorationKind {
    Tree,
    Grass,
    Rock,
}

impl DecorationKind {
    pub const ALL: [DecorationKind; 3] = [DecorationKind::Tree, DecorationKind::Grass, DecorationKind::Rock];

    /// Slot of the shared mesh template this class draws with.
    pub fn template_index(&self) -> usize {
        match self {
            DecorationKind::Tree => 0,
            DecorationKind::Grass => 1,
            DecorationKind::Rock => 2,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Segment {
    pub z: f32,
}

#[derive(Clone, Debug)]
pub struct Decoration {
    pub kind: DecorationKind,
    pub anchor_x: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rotation_y: f32,
    pub scale: f32,
}

/// Fixed pool of road tiles and scenery scrolled past the vehicle.
///
/// Nothing is allocated after construction: items that fall behind the
/// vehicle wrap to the far end of the ring.
pub struct Road {
    config: RoadConfig,
    lanes: LaneLayout,
    segments: Vec<Segment>,
    // slot of the segment nearest the vehicle, and its z; every other
    // segment is laid out behind it from this single offset
    front: usize,
    front_z: f32,
    decorations: Vec<Decoration>,
    rng: SmallRng,
    recycled_segments: u64,
}

impl Road {
    pub fn new(config: RoadConfig, lanes: LaneLayout, seed: u64) -> Self {
        let mut road = Road {
            segments: Vec::with_capacity(config.segment_count),
            front: 0,
            front_z: 0.0,
            decorations: Vec::new(),
            rng: SmallRng::seed_from_u64(seed),
            recycled_segments: 0,
            config,
            lanes,
        };
        for i in 0..road.config.segment_count {
            let z = -(i as f32) * road.config.segment_length;
            road.segments.push(Segment { z });
            road.add_trees(z);
            road.add_grass(z);
            road.add_rocks(z);
        }
        log::debug!(
            "road built: {} segments, {} decorations",
            road.segments.len(),
            road.decorations.len()
        );
        road
    }

    fn add_trees(&mut self, center_z: f32) {
        let length = self.config.segment_length;
        let per_side = (length / self.config.tree_spacing).floor() as usize;
        let offset = self.config.paved_width / 2.0 + 12.0;
        for i in 0..per_side {
            let z = center_z - length / 2.0 + i as f32 * self.config.tree_spacing + self.rng.gen::<f32>() * 10.0;
            for side in [-1.0, 1.0] {
                let anchor_x = side * offset + self.rng.gen_range(-1.5..1.5);
                let z = z + self.rng.gen_range(-1.5..1.5);
                let rotation_y = self.rng.gen::<f32>() * TAU;
                let scale = 2.0 + self.rng.gen::<f32>() * 1.2;
                self.decorations.push(Decoration {
                    kind: DecorationKind::Tree,
                    anchor_x,
                    x: anchor_x,
                    y: 0.0,
                    z,
                    rotation_y,
                    scale,
                });
            }
        }
    }

    fn add_grass(&mut self, center_z: f32) {
        let length = self.config.segment_length;
        let per_side = (length / self.config.grass_spacing).floor() as usize;
        let offset = self.config.paved_width / 2.0 + 3.0;
        for i in 0..per_side {
            let z = center_z - length / 2.0 + i as f32 * self.config.grass_spacing + self.rng.gen::<f32>() * 4.0;
            for side in [-1.0, 1.0] {
                for j in 0..2 {
                    let anchor_x = side * offset + j as f32 * 1.6 + self.rng.gen_range(-1.0..1.0);
                    let z = z + self.rng.gen_range(-1.0..1.0);
                    let rotation_y = self.rng.gen::<f32>() * PI;
                    let scale = 2.5 + self.rng.gen::<f32>() * 1.1;
                    self.decorations.push(Decoration {
                        kind: DecorationKind::Grass,
                        anchor_x,
                        x: anchor_x,
                        y: 0.0,
                        z,
                        rotation_y,
                        scale,
                    });
                }
            }
        }
    }

    fn add_rocks(&mut self, center_z: f32) {
        let length = self.config.segment_length;
        for _ in 0..self.config.rocks_per_segment {
            let scale = 0.25 + self.rng.gen::<f32>() * 0.35;
            let side = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let anchor_x = side * (self.config.paved_width / 2.0 + 6.0 + self.rng.gen::<f32>() * 10.0);
            let z = center_z - length / 2.0 + self.rng.gen::<f32>() * length;
            let rotation_y = self.rng.gen::<f32>() * TAU;
            self.decorations.push(Decoration {
                kind: DecorationKind::Rock,
                anchor_x,
                x: anchor_x,
                y: 0.25,
                z,
                rotation_y,
                scale,
            });
        }
    }

    pub fn config(&self) -> &RoadConfig {
        &self.config
    }

    pub fn lanes(&self) -> &LaneLayout {
        &self.lanes
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    pub fn recycled_segments(&self) -> u64 {
        self.recycled_segments
    }

    pub fn ring_span(&self) -> f32 {
        self.config.segment_count as f32 * self.config.segment_length
    }

    /// Scrolls the world toward the vehicle and wraps whatever fell behind it.
    pub fn advance(&mut self, dt: f32, vehicle_speed: f32, vehicle_z: f32) {
        let travel = vehicle_speed * self.config.frame_scale * dt.max(0.0);
        let span = self.ring_span();
        if span <= 0.0 {
            return;
        }

        let length = self.config.segment_length;
        let count = self.segments.len();
        let segment_limit = vehicle_z + self.config.segment_recycle_margin;
        self.front_z += travel;
        while self.front_z > segment_limit {
            self.front_z -= length;
            self.front = (self.front + 1) % count;
            self.recycled_segments += 1;
        }
        for rank in 0..count {
            let slot = (self.front + rank) % count;
            self.segments[slot].z = self.front_z - rank as f32 * length;
        }

        let decoration_limit = vehicle_z + self.config.decoration_recycle_margin;
        let jitter = self.config.recycle_jitter;
        for decoration in &mut self.decorations {
            decoration.z += travel;
            if decoration.z > decoration_limit {
                while decoration.z > decoration_limit {
                    decoration.z -= span;
                }
                decoration.x = decoration.anchor_x + (self.rng.gen::<f32>() - 0.5) * 2.0 * jitter;
            }
        }
    }
}
