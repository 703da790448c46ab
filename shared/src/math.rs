//! Vector math and axis-aligned bounding volumes shared by server and client.

use serde::{Deserialize, Serialize};

/// A position, velocity or extent in world space.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(&self, other: &Vec3) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn scale(&self, factor: f32) -> Vec3 {
        Vec3::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn add(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Linear interpolation toward `target`, with `t` clamped to [0, 1].
    pub fn lerp(&self, target: &Vec3, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        Vec3::new(
            self.x + (target.x - self.x) * t,
            self.y + (target.y - self.y) * t,
            self.z + (target.z - self.z) * t,
        )
    }

    /// Returns a copy whose length does not exceed `max`.
    pub fn clamp_length(&self, max: f32) -> Vec3 {
        let len = self.length();
        if len > max && len > f32::EPSILON {
            self.scale(max / len)
        } else {
            *self
        }
    }
}

/// Axis-aligned bounding box described by its center and half-extents.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Aabb {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center.sub(&self.half_extents)
    }

    pub fn max(&self) -> Vec3 {
        self.center.add(&self.half_extents)
    }

    /// Returns the same box with its half-extents multiplied by `factor`.
    pub fn shrunk(&self, factor: f32) -> Aabb {
        Aabb::new(self.center, self.half_extents.scale(factor))
    }

    /// Returns the same box translated so its center sits at `center`.
    pub fn at(&self, center: Vec3) -> Aabb {
        Aabb::new(center, self.half_extents)
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());

        !(a_max.x <= b_min.x
            || b_max.x <= a_min.x
            || a_max.y <= b_min.y
            || b_max.y <= a_min.y
            || a_max.z <= b_min.z
            || b_max.z <= a_min.z)
    }
}
