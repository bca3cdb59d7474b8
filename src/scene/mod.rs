//! Visual scene abstraction
//!
//! The sync engine never touches rendering directly. It spawns, moves and
//! despawns opaque visual objects through the [`Scene`] trait. Objects may
//! additionally expose capabilities:
//! - [`Movable`]: glides toward a target instead of snapping
//! - [`Representable`]: reports which visual form it currently uses
//!
//! Static layout objects (walls, doors) implement neither.

pub mod grid;
pub mod headless;
pub mod motion;

pub use grid::{FloorGrid, spawn_floor};
pub use headless::{HeadlessScene, SceneStats};
pub use motion::Mover;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::SceneError;

/// Which visual form an entity is rendered as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Representation {
    Agent,
    /// Firefighter carrying a victim
    AgentCarrying,
    Fire,
    Smoke,
    Poi,
    WallIntact,
    WallDamaged,
    DoorOpen,
    DoorClosed,
    DoorDestroyed,
    FloorTile,
}

impl Representation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Representation::Agent => "agent",
            Representation::AgentCarrying => "agent-carrying",
            Representation::Fire => "fire",
            Representation::Smoke => "smoke",
            Representation::Poi => "poi",
            Representation::WallIntact => "wall-intact",
            Representation::WallDamaged => "wall-damaged",
            Representation::DoorOpen => "door-open",
            Representation::DoorClosed => "door-closed",
            Representation::DoorDestroyed => "door-destroyed",
            Representation::FloorTile => "floor-tile",
        }
    }

    /// Firefighter visuals glide between cells and can swap form
    pub fn is_agent(&self) -> bool {
        matches!(self, Representation::Agent | Representation::AgentCarrying)
    }
}

impl std::fmt::Display for Representation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scene grouping, mirrors separate parent nodes in a scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Backdrop,
    Static,
    Dynamic,
}

/// Opaque reference to a scene object. Never reused once despawned, so a
/// stale handle can always be told apart from its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u64);

/// Position, rotation and scale of a scene object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

/// Something that moves toward a target over time
pub trait Movable {
    /// Retarget; returns false when the target is unchanged
    fn set_target(&mut self, target: Vec3) -> bool;
    fn target(&self) -> Vec3;
    fn is_moving(&self) -> bool;
}

/// Something that knows which visual form it is using
pub trait Representable {
    fn representation(&self) -> Representation;
}

/// A live object in the scene
pub trait VisualObject {
    fn transform(&self) -> Transform;

    /// Place instantly (also cancels any in-flight movement)
    fn set_position(&mut self, position: Vec3);

    fn as_movable(&self) -> Option<&dyn Movable> {
        None
    }

    fn as_movable_mut(&mut self) -> Option<&mut dyn Movable> {
        None
    }

    fn as_representable(&self) -> Option<&dyn Representable> {
        None
    }
}

/// Visual-object collaborator used by the layout store and reconciler
pub trait Scene {
    /// Instantiate a new object; fails only when the scene is out of room
    fn spawn(
        &mut self,
        layer: Layer,
        kind: Representation,
        transform: Transform,
    ) -> Result<ObjectHandle, SceneError>;

    /// Destroy an object; returns false if the handle was already stale
    fn despawn(&mut self, handle: ObjectHandle) -> bool;

    fn object(&self, handle: ObjectHandle) -> Option<&dyn VisualObject>;

    fn object_mut(&mut self, handle: ObjectHandle) -> Option<&mut dyn VisualObject>;

    /// Advance per-frame local motion
    fn advance(&mut self, dt: f32);

    fn is_alive(&self, handle: ObjectHandle) -> bool {
        self.object(handle).is_some()
    }
}
