//! Error types
//!
//! Only transport, parse and scene exhaustion failures are errors. Malformed
//! entities and unknown wall/door states are logged and skipped instead.

use thiserror::Error;

/// Failure to obtain a snapshot from the simulation server
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request could not complete (connection refused, timeout, ...)
    #[error("transport failure: {message}")]
    Transport { message: String },
    /// Server answered with a non-success status
    #[error("server returned status {code}: {body}")]
    Status { code: u16, body: String },
    /// Payload arrived but is not a valid snapshot envelope
    #[error("could not parse snapshot: {message}")]
    Parse { message: String, raw: String },
}

impl FetchError {
    /// Raw payload, for parse failures
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            FetchError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Failure reported by the visual scene
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// No room left for another visual object
    #[error("scene exhausted: cannot hold more than {capacity} objects")]
    Exhausted { capacity: usize },
}

/// Failure during a reconciliation pass or deferred morph
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Failure to apply a snapshot
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// Envelope carried no `game_state`
    #[error("snapshot has no game_state payload")]
    MissingGameState,
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Failure to load settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// A named option (strategy, step endpoint) that does not exist
    #[error("unknown {field} '{value}'")]
    UnknownValue { field: &'static str, value: String },
}
