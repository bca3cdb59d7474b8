//! State reconciliation engine
//!
//! Turns server snapshots into scene objects:
//! - `snapshot`: wire contract and identity keys
//! - `mapper`: grid to render-space positions
//! - `layout`: walls and doors, keyed by edge, never moved
//! - `reconcile`: agents, fire, smoke and POIs, with deferred morphs
//! - `ingest`: validates a snapshot and drives both pools

pub mod ingest;
pub mod layout;
pub mod mapper;
pub mod reconcile;
pub mod snapshot;

pub use ingest::{EdgeTally, IngestReport, Ingestor, dynamic_entities};
pub use layout::{DoorState, EdgeChange, LayoutStore, StaticEntry, WallState};
pub use mapper::GridMapper;
pub use reconcile::{DynamicEntity, DynamicEntry, PassReport, Reconciler};
pub use snapshot::{ApiResponse, Edge, Entry, EntityId, GameState, GameStats, GridCell, keys};
