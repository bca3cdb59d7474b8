//! Static layout store (walls and doors)
//!
//! Objects are keyed by the edge they occupy. Once placed they never move;
//! only their representation may change, by destroy and recreate in place.

use std::collections::HashMap;

use glam::Vec3;

use super::mapper::GridMapper;
use super::snapshot::Edge;
use crate::error::SyncError;
use crate::scene::{Layer, ObjectHandle, Representation, Scene, Transform};

/// Wall damage level, wire values `"0"`, `"1"`, `"2"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallState {
    Intact,
    Damaged,
    Destroyed,
}

impl WallState {
    pub fn parse(state: &str) -> Option<Self> {
        match state.trim() {
            "0" => Some(WallState::Intact),
            "1" => Some(WallState::Damaged),
            "2" => Some(WallState::Destroyed),
            _ => None,
        }
    }

    /// Parse, falling back to an intact wall on unknown input
    pub fn parse_or_intact(state: &str) -> Self {
        Self::parse(state).unwrap_or_else(|| {
            log::warn!("Unknown wall state {:?}, showing intact wall", state);
            WallState::Intact
        })
    }

    /// Visual to show; a destroyed wall has none
    pub fn representation(&self) -> Option<Representation> {
        match self {
            WallState::Intact => Some(Representation::WallIntact),
            WallState::Damaged => Some(Representation::WallDamaged),
            WallState::Destroyed => None,
        }
    }
}

/// Door state, wire values `open`, `closed`, `destroyed` (any case)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Open,
    Closed,
    Destroyed,
}

impl DoorState {
    pub fn parse(state: &str) -> Option<Self> {
        match state.trim().to_lowercase().as_str() {
            "open" => Some(DoorState::Open),
            "closed" => Some(DoorState::Closed),
            "destroyed" => Some(DoorState::Destroyed),
            _ => None,
        }
    }

    /// Parse, falling back to a closed door on unknown input
    pub fn parse_or_closed(state: &str) -> Self {
        Self::parse(state).unwrap_or_else(|| {
            log::warn!("Unknown door state {:?}, showing closed door", state);
            DoorState::Closed
        })
    }

    /// Doors always have a visual, even when broken down
    pub fn representation(&self) -> Option<Representation> {
        Some(match self {
            DoorState::Open => Representation::DoorOpen,
            DoorState::Closed => Representation::DoorClosed,
            DoorState::Destroyed => Representation::DoorDestroyed,
        })
    }
}

/// A placed wall or door
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticEntry {
    pub handle: ObjectHandle,
    pub representation: Representation,
    /// Fixed at creation
    pub position: Vec3,
}

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeChange {
    Created,
    Replaced,
    Removed,
    Unchanged,
}

/// Edge-keyed pool of immovable objects
#[derive(Debug, Clone, Default)]
pub struct LayoutStore {
    entries: HashMap<String, StaticEntry>,
}

impl LayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&StaticEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Bring the object under `key` in line with `desired`
    pub fn upsert_edge<S: Scene>(
        &mut self,
        scene: &mut S,
        mapper: &GridMapper,
        key: &str,
        edge: &Edge,
        desired: Option<Representation>,
        offset: Vec3,
    ) -> Result<EdgeChange, SyncError> {
        let Some(desired) = desired else {
            return Ok(match self.entries.remove(key) {
                Some(entry) => {
                    scene.despawn(entry.handle);
                    log::trace!("{} removed", key);
                    EdgeChange::Removed
                }
                None => EdgeChange::Unchanged,
            });
        };

        match self.entries.get(key).copied() {
            None => {
                let position = mapper.edge(edge) + offset;
                let handle = scene.spawn(Layer::Static, desired, Transform::at(position))?;
                self.entries.insert(
                    key.to_string(),
                    StaticEntry {
                        handle,
                        representation: desired,
                        position,
                    },
                );
                Ok(EdgeChange::Created)
            }
            Some(entry) if entry.representation != desired => {
                // Same spot as before: static objects never move
                self.entries.remove(key);
                scene.despawn(entry.handle);
                let handle = scene.spawn(Layer::Static, desired, Transform::at(entry.position))?;
                self.entries.insert(
                    key.to_string(),
                    StaticEntry {
                        handle,
                        representation: desired,
                        position: entry.position,
                    },
                );
                log::trace!("{} {} -> {}", key, entry.representation, desired);
                Ok(EdgeChange::Replaced)
            }
            Some(_) => Ok(EdgeChange::Unchanged),
        }
    }

    /// Destroy every placed object
    pub fn clear<S: Scene>(&mut self, scene: &mut S) {
        for (_, entry) in self.entries.drain() {
            scene.despawn(entry.handle);
        }
    }
}
