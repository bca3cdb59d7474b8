//! Client settings
//!
//! Loaded from an optional JSON file; any field left out keeps its default.

use std::path::Path;
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;
use crate::scene::FloorGrid;
use crate::sync::GridMapper;

/// Firefighter strategy the server should run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Improved,
    Random,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Improved => "improved",
            Strategy::Random => "random",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "improved" => Some(Strategy::Improved),
            "random" => Some(Strategy::Random),
            _ => None,
        }
    }

    /// Like [`Strategy::from_str`], but reports the bad name
    pub fn parse(s: &str) -> Result<Self, SettingsError> {
        Self::from_str(s).ok_or_else(|| SettingsError::UnknownValue {
            field: "strategy",
            value: s.to_string(),
        })
    }
}

/// Server endpoint hit on every poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepEndpoint {
    /// One firefighter action per poll
    #[default]
    Step,
    /// Advance the fire phase
    StepFire,
    /// All remaining action points plus the fire phase
    StepCompleteTurn,
    /// Read state without advancing
    Init,
}

impl StepEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            StepEndpoint::Step => "/step",
            StepEndpoint::StepFire => "/step_fire",
            StepEndpoint::StepCompleteTurn => "/step_complete_turn",
            StepEndpoint::Init => "/init",
        }
    }

    /// The fire and full-turn endpoints only accept POST
    pub fn is_post(&self) -> bool {
        matches!(self, StepEndpoint::StepFire | StepEndpoint::StepCompleteTurn)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().trim_start_matches('/') {
            "step" => Some(StepEndpoint::Step),
            "step_fire" | "fire" => Some(StepEndpoint::StepFire),
            "step_complete_turn" | "turn" => Some(StepEndpoint::StepCompleteTurn),
            "init" => Some(StepEndpoint::Init),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Result<Self, SettingsError> {
        Self::from_str(s).ok_or_else(|| SettingsError::UnknownValue {
            field: "step endpoint",
            value: s.to_string(),
        })
    }
}

/// Client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Server ===
    /// Base URL of the simulation server
    pub api_url: String,
    pub step_endpoint: StepEndpoint,
    /// Seconds between polls
    pub polling_interval_secs: f32,
    /// Pause between the reset handshake and the first poll
    pub reset_delay_secs: f32,
    pub request_timeout_ms: u64,

    // === Game setup ===
    pub number_of_agents: u32,
    pub strategy: Strategy,

    // === Board layout ===
    pub cell_size: f32,
    pub vertical_base_offset: f32,
    pub wall_offset: Vec3,
    pub door_offset: Vec3,
    /// Decorative floor under the board (off when absent)
    pub floor: Option<FloorGrid>,

    // === Scene ===
    /// Agent glide speed, units per second
    pub movement_speed: f32,
    pub frame_rate: u32,
    pub max_objects: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            step_endpoint: StepEndpoint::Step,
            polling_interval_secs: DEFAULT_POLLING_INTERVAL_SECS,
            reset_delay_secs: DEFAULT_RESET_DELAY_SECS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,

            number_of_agents: 3,
            strategy: Strategy::Improved,

            cell_size: DEFAULT_CELL_SIZE,
            vertical_base_offset: DEFAULT_VERTICAL_BASE_OFFSET,
            wall_offset: Vec3::ZERO,
            door_offset: Vec3::ZERO,
            floor: None,

            movement_speed: DEFAULT_MOVEMENT_SPEED,
            frame_rate: DEFAULT_FRAME_RATE,
            max_objects: DEFAULT_MAX_OBJECTS,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Settings = serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Replace out-of-range values with usable ones
    pub fn sanitized(mut self) -> Self {
        let agents = self.number_of_agents.clamp(1, MAX_AGENTS);
        if agents != self.number_of_agents {
            log::warn!(
                "number_of_agents {} out of range, using {}",
                self.number_of_agents,
                agents
            );
            self.number_of_agents = agents;
        }
        if !(self.polling_interval_secs > 0.0) || seconds(self.polling_interval_secs).is_none() {
            log::warn!(
                "polling_interval_secs {} is not a usable interval, using default",
                self.polling_interval_secs
            );
            self.polling_interval_secs = DEFAULT_POLLING_INTERVAL_SECS;
        }
        if seconds(self.reset_delay_secs).is_none() {
            log::warn!(
                "reset_delay_secs {} is not a usable delay, using default",
                self.reset_delay_secs
            );
            self.reset_delay_secs = DEFAULT_RESET_DELAY_SECS;
        }
        if !(self.cell_size > 0.0 && self.cell_size.is_finite()) {
            log::warn!("cell_size must be positive, using default");
            self.cell_size = DEFAULT_CELL_SIZE;
        }
        if !(self.movement_speed > 0.0 && self.movement_speed.is_finite()) {
            log::warn!("movement_speed must be positive, using default");
            self.movement_speed = DEFAULT_MOVEMENT_SPEED;
        }
        if self.frame_rate == 0 {
            self.frame_rate = DEFAULT_FRAME_RATE;
        }
        self.api_url = self.api_url.trim_end_matches('/').to_string();
        self
    }

    pub fn mapper(&self) -> GridMapper {
        GridMapper::new(self.cell_size, self.vertical_base_offset)
    }

    pub fn polling_interval(&self) -> Duration {
        seconds(self.polling_interval_secs)
            .filter(|interval| !interval.is_zero())
            .unwrap_or(Duration::from_secs_f32(DEFAULT_POLLING_INTERVAL_SECS))
    }

    pub fn reset_delay(&self) -> Duration {
        seconds(self.reset_delay_secs)
            .unwrap_or(Duration::from_secs_f32(DEFAULT_RESET_DELAY_SECS))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    /// Fixed frame timestep
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }
}

/// Negative, NaN, infinite and out-of-range values have no duration
fn seconds(value: f32) -> Option<Duration> {
    Duration::try_from_secs_f32(value).ok()
}
