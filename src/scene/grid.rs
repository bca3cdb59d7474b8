//! Backdrop floor grid

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{Layer, ObjectHandle, Representation, Scene, Transform};
use crate::error::SceneError;

/// Layout of the decorative floor tiles under the board
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorGrid {
    pub count_x: u32,
    pub count_y: u32,
    pub spacing: f32,
    pub offset: Vec3,
}

impl Default for FloorGrid {
    fn default() -> Self {
        Self {
            count_x: 5,
            count_y: 5,
            spacing: 1.5,
            offset: Vec3::ZERO,
        }
    }
}

/// Spawn `count_x * count_y` floor tiles, row by row
pub fn spawn_floor<S: Scene>(
    scene: &mut S,
    grid: &FloorGrid,
) -> Result<Vec<ObjectHandle>, SceneError> {
    let mut handles = Vec::with_capacity((grid.count_x * grid.count_y) as usize);
    for y in 0..grid.count_y {
        for x in 0..grid.count_x {
            let position =
                grid.offset + Vec3::new(x as f32 * grid.spacing, y as f32 * grid.spacing, 0.0);
            let handle =
                scene.spawn(Layer::Backdrop, Representation::FloorTile, Transform::at(position))?;
            handles.push(handle);
        }
    }
    log::debug!("Spawned {} floor tiles", handles.len());
    Ok(handles)
}
