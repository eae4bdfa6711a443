//! Minimal world-space geometry used by places and spawn slots.

use serde::{Deserialize, Serialize};

/// A point (or offset/rotation triple) in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance_squared(&self, other: &Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

/// A point of interest with the radius inside which the actor counts as "at" it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub position: Vec3,
    pub radius: f32,
}

impl Place {
    pub const fn new(position: Vec3, radius: f32) -> Self {
        Self { position, radius }
    }

    pub fn contains(&self, point: &Vec3) -> bool {
        self.position.distance_squared(point) <= self.radius * self.radius
    }
}

/// A parking slot a rental vehicle may be issued at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnSlot {
    pub position: Vec3,
    pub heading: f32,
}

impl SpawnSlot {
    pub const fn new(x: f32, y: f32, z: f32, heading: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            heading,
        }
    }
}
