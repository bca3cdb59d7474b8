//! State fetchers
//!
//! Everything that talks to the simulation server, or pretends to.

use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Serialize;

use crate::consts::MAX_AGENTS;
use crate::error::FetchError;
use crate::settings::{Settings, StepEndpoint, Strategy};
use crate::sync::ApiResponse;

/// Body of the one-time `/reset` request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResetRequest {
    pub num_agents: u32,
    pub strategy: Strategy,
}

impl ResetRequest {
    pub fn new(num_agents: u32, strategy: Strategy) -> Self {
        let clamped = num_agents.clamp(1, MAX_AGENTS);
        if clamped != num_agents {
            log::warn!("Server supports 1..={} firefighters, asking for {}", MAX_AGENTS, clamped);
        }
        Self {
            num_agents: clamped,
            strategy,
        }
    }
}

/// Source of snapshots
pub trait StateFetcher {
    /// Start a fresh game; the response usually carries the initial board
    fn reset(&mut self, request: &ResetRequest) -> Result<ApiResponse, FetchError>;

    /// Advance (or read) the game and return the new snapshot
    fn fetch(&mut self) -> Result<ApiResponse, FetchError>;
}

/// Parse a response body, keeping the raw text on failure
pub fn parse_response(body: &str) -> Result<ApiResponse, FetchError> {
    serde_json::from_str(body).map_err(|err| FetchError::Parse {
        message: err.to_string(),
        raw: body.to_string(),
    })
}

/// Blocking HTTP client for the simulation server
#[derive(Debug, Clone)]
pub struct HttpStateFetcher {
    base_url: String,
    step: StepEndpoint,
    client: Client,
}

impl HttpStateFetcher {
    pub fn new(base_url: &str, step: StepEndpoint, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| FetchError::Transport {
                message: err.to_string(),
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            step,
            client,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        Self::new(&settings.api_url, settings.step_endpoint, settings.request_timeout())
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn read(response: Result<Response, reqwest::Error>) -> Result<ApiResponse, FetchError> {
        let response = response.map_err(|err| FetchError::Transport {
            message: err.to_string(),
        })?;
        let status = response.status();
        let body = response.text().map_err(|err| FetchError::Transport {
            message: err.to_string(),
        })?;
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                code: status.as_u16(),
                body,
            });
        }
        parse_response(&body)
    }
}

impl StateFetcher for HttpStateFetcher {
    fn reset(&mut self, request: &ResetRequest) -> Result<ApiResponse, FetchError> {
        let url = self.url("/reset");
        log::info!(
            "Resetting game at {} ({} agents, {} strategy)",
            url,
            request.num_agents,
            request.strategy.as_str()
        );
        Self::read(self.client.post(url).json(request).send())
    }

    fn fetch(&mut self) -> Result<ApiResponse, FetchError> {
        let url = self.url(self.step.path());
        let request = if self.step.is_post() {
            self.client.post(url)
        } else {
            self.client.get(url)
        };
        Self::read(request.send())
    }
}

/// Plays back recorded responses, one per poll
#[derive(Debug, Clone, Default)]
pub struct ReplayFetcher {
    frames: VecDeque<String>,
    initial: Option<String>,
}

impl ReplayFetcher {
    /// Each item is one raw response body
    pub fn new<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let frames: VecDeque<String> = frames.into_iter().map(Into::into).collect();
        Self {
            initial: frames.front().cloned(),
            frames,
        }
    }

    /// JSON-lines file, blank lines ignored
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let frames: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
        log::info!("Replaying {} recorded snapshots from {}", frames.len(), path.display());
        Ok(Self::new(frames))
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl StateFetcher for ReplayFetcher {
    fn reset(&mut self, _request: &ResetRequest) -> Result<ApiResponse, FetchError> {
        match &self.initial {
            Some(body) => parse_response(body),
            None => Err(FetchError::Transport {
                message: "replay is empty".to_string(),
            }),
        }
    }

    fn fetch(&mut self) -> Result<ApiResponse, FetchError> {
        match self.frames.pop_front() {
            Some(body) => parse_response(&body),
            None => Err(FetchError::Transport {
                message: "replay exhausted".to_string(),
            }),
        }
    }
}
