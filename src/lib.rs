//! Rescue View - live board client for the fire-rescue simulation server
//!
//! Core modules:
//! - `sync`: Snapshot parsing and state reconciliation (layout + dynamic pools)
//! - `scene`: Visual scene abstraction and a headless implementation
//! - `client`: Snapshot fetchers (HTTP, recorded replay)
//! - `session`: Reset handshake, polling loop and frame driver
//! - `status`: Win/loss status display
//! - `settings`: Data-driven client configuration

pub mod client;
pub mod error;
pub mod scene;
pub mod session;
pub mod settings;
pub mod status;
pub mod sync;

pub use client::{HttpStateFetcher, ReplayFetcher, ResetRequest, StateFetcher};
pub use error::{FetchError, IngestError, SceneError, SettingsError, SyncError};
pub use scene::{HeadlessScene, Representation, Scene};
pub use session::{PollPhase, Session};
pub use settings::{Settings, StepEndpoint, Strategy};
pub use sync::{ApiResponse, GridMapper, Ingestor};

/// Client configuration constants
pub mod consts {
    /// Side length of one board cell in render units
    pub const DEFAULT_CELL_SIZE: f32 = 2.0;
    /// Rows are laid out downwards from this height
    pub const DEFAULT_VERTICAL_BASE_OFFSET: f32 = 14.0;

    /// Agent glide speed (units per second)
    pub const DEFAULT_MOVEMENT_SPEED: f32 = 5.0;
    /// Distance at which a moving agent snaps onto its target
    pub const ARRIVAL_EPSILON: f32 = 0.02;

    /// Scene capacity before spawns start failing
    pub const DEFAULT_MAX_OBJECTS: usize = 4096;
    /// Fixed frame rate of the driver loop
    pub const DEFAULT_FRAME_RATE: u32 = 60;

    /// Simulation server defaults
    pub const DEFAULT_API_URL: &str = "http://localhost:8585";
    pub const DEFAULT_POLLING_INTERVAL_SECS: f32 = 2.0;
    pub const DEFAULT_RESET_DELAY_SECS: f32 = 1.0;
    pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

    /// The server refuses more firefighters than this
    pub const MAX_AGENTS: u32 = 6;
}
