use nalgebra::Vector3;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Aabb { min, max }
    }

    pub fn from_center_half_extents(center: Vector3<f32>, half: Vector3<f32>) -> Self {
        Aabb { min: center - half, max: center + half }
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x || self.min.x > other.max.x ||
            self.max.y < other.min.y || self.min.y > other.max.y ||
            self.max.z < other.min.z || self.min.z > other.max.z)
    }

    pub fn expanded(&self, margin: f32) -> Aabb {
        let e = Vector3::repeat(margin);
        Aabb { min: self.min - e, max: self.max + e }
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb { min: self.min.inf(&other.min), max: self.max.sup(&other.max) }
    }

    pub fn translated(&self, offset: Vector3<f32>) -> Aabb {
        Aabb { min: self.min + offset, max: self.max + offset }
    }
}
