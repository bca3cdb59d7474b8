//! Grid to render-space mapping
//!
//! Rows grow upward in render space and the whole board is shifted down by a
//! fixed base offset so it sits centred in view.

use glam::Vec3;

use super::snapshot::{Edge, GridCell};
use crate::consts::{DEFAULT_CELL_SIZE, DEFAULT_VERTICAL_BASE_OFFSET};

/// Pure cell/edge to world-position conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMapper {
    pub cell_size: f32,
    pub vertical_base_offset: f32,
}

impl Default for GridMapper {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE, DEFAULT_VERTICAL_BASE_OFFSET)
    }
}

impl GridMapper {
    pub fn new(cell_size: f32, vertical_base_offset: f32) -> Self {
        Self {
            cell_size,
            vertical_base_offset,
        }
    }

    /// Centre of a cell
    #[inline]
    pub fn cell(&self, cell: GridCell) -> Vec3 {
        Vec3::new(
            cell.col as f32 * self.cell_size,
            cell.row as f32 * self.cell_size - self.vertical_base_offset,
            0.0,
        )
    }

    /// Midpoint of the edge shared by two adjacent cells
    pub fn edge(&self, edge: &Edge) -> Vec3 {
        let (a, b) = (edge.a, edge.b);
        if a.col != b.col {
            Vec3::new(
                (a.col as f32 + b.col as f32) * self.cell_size / 2.0,
                a.row as f32 * self.cell_size - self.vertical_base_offset,
                0.0,
            )
        } else {
            Vec3::new(
                a.col as f32 * self.cell_size,
                (a.row as f32 + b.row as f32) * self.cell_size / 2.0
                    - self.vertical_base_offset,
                0.0,
            )
        }
    }
}
