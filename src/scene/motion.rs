//! Smooth motion toward a target position
//!
//! Purely local interpolation, run once per frame. Independent movers never
//! coordinate with each other or with the poll loop.

use glam::Vec3;

use super::Movable;
use crate::consts::{ARRIVAL_EPSILON, DEFAULT_MOVEMENT_SPEED};

/// Glides a position toward its latest target at constant speed
#[derive(Debug, Clone, PartialEq)]
pub struct Mover {
    /// Units per second
    pub speed: f32,
    target: Vec3,
    moving: bool,
}

impl Default for Mover {
    fn default() -> Self {
        Self::new(Vec3::ZERO, DEFAULT_MOVEMENT_SPEED)
    }
}

impl Mover {
    /// A mover at rest on `position`
    pub fn new(position: Vec3, speed: f32) -> Self {
        Self {
            speed,
            target: position,
            moving: false,
        }
    }

    /// Drop the current target and rest at `position`
    pub fn settle(&mut self, position: Vec3) {
        self.target = position;
        self.moving = false;
    }

    /// Advance `position` by one frame
    pub fn step(&mut self, position: &mut Vec3, dt: f32) {
        if !self.moving {
            return;
        }

        *position = move_towards(*position, self.target, self.speed * dt);

        if position.distance(self.target) < ARRIVAL_EPSILON {
            self.moving = false;
        }
    }
}

impl Movable for Mover {
    fn set_target(&mut self, target: Vec3) -> bool {
        if self.target == target {
            return false;
        }
        self.target = target;
        self.moving = true;
        true
    }

    fn target(&self) -> Vec3 {
        self.target
    }

    fn is_moving(&self) -> bool {
        self.moving
    }
}

/// Move `current` toward `target` by at most `max_delta`, landing exactly on it
pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_delta || distance == 0.0 {
        target
    } else {
        current + delta / distance * max_delta
    }
}
