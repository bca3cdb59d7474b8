//! Session driver
//!
//! One thread, two clocks: frames tick at a fixed rate (morph drain plus
//! motion) and every `polling_interval` a poll cycle fetches and ingests the
//! next snapshot. A failed cycle is logged and the loop carries on.

use std::time::Duration;

use crate::client::{ResetRequest, StateFetcher};
use crate::error::{FetchError, IngestError};
use crate::scene::{Scene, spawn_floor};
use crate::settings::Settings;
use crate::status::StatusDisplay;
use crate::sync::{ApiResponse, IngestReport, Ingestor};

/// Poll cycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    #[default]
    Idle,
    Fetching,
    /// Snapshot applied
    ParseOk,
    /// Fetch, parse or apply failed; the next poll runs regardless
    ParseFailed,
}

/// Counters for the lifetime of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub polls: usize,
    pub applied: usize,
    pub failed: usize,
    pub morphs: usize,
}

pub struct Session<F: StateFetcher, S: Scene, D: StatusDisplay> {
    settings: Settings,
    fetcher: F,
    scene: S,
    status: D,
    ingestor: Ingestor,
    phase: PollPhase,
    stats: SessionStats,
    last_report: Option<IngestReport>,
}

impl<F: StateFetcher, S: Scene, D: StatusDisplay> Session<F, S, D> {
    pub fn new(settings: Settings, fetcher: F, scene: S, status: D) -> Self {
        let settings = settings.sanitized();
        let ingestor = Ingestor::new(settings.mapper(), settings.wall_offset, settings.door_offset);
        Self {
            settings,
            fetcher,
            scene,
            status,
            ingestor,
            phase: PollPhase::Idle,
            stats: SessionStats::default(),
            last_report: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn status(&self) -> &D {
        &self.status
    }

    pub fn ingestor(&self) -> &Ingestor {
        &self.ingestor
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn last_report(&self) -> Option<&IngestReport> {
        self.last_report.as_ref()
    }

    /// Ask the server for a fresh game. Failure is logged, never fatal.
    pub fn reset(&mut self) -> Option<IngestReport> {
        let request = ResetRequest::new(self.settings.number_of_agents, self.settings.strategy);
        match self.fetcher.reset(&request) {
            Ok(response) if response.game_state.is_some() => self.apply(&response),
            Ok(response) => {
                log::info!(
                    "Reset acknowledged without a board (status: {})",
                    response.status.as_deref().unwrap_or("none")
                );
                None
            }
            Err(err) => {
                log_fetch_error("Reset", &err);
                None
            }
        }
    }

    /// Run one poll cycle and return its terminal phase
    pub fn poll_once(&mut self) -> PollPhase {
        self.phase = PollPhase::Fetching;
        self.stats.polls += 1;

        let outcome = match self.fetcher.fetch() {
            Ok(response) => match self.apply(&response) {
                Some(_) => PollPhase::ParseOk,
                None => PollPhase::ParseFailed,
            },
            Err(err) => {
                log_fetch_error("Poll", &err);
                PollPhase::ParseFailed
            }
        };

        match outcome {
            PollPhase::ParseOk => self.stats.applied += 1,
            _ => self.stats.failed += 1,
        }
        self.phase = PollPhase::Idle;
        outcome
    }

    /// One frame: drain deferred morphs, then advance motion
    pub fn frame(&mut self, dt: f32) {
        match self.ingestor.run_deferred(&mut self.scene) {
            Ok(applied) => self.stats.morphs += applied,
            Err(err) => log::error!("Deferred morph failed: {}", err),
        }
        self.scene.advance(dt);
    }

    /// Reset, then poll until `max_polls` cycles have run (forever if `None`)
    pub fn run(&mut self, max_polls: Option<usize>) {
        if let Some(floor) = self.settings.floor {
            if let Err(err) = spawn_floor(&mut self.scene, &floor) {
                log::error!("Could not lay out floor: {}", err);
            }
        }

        self.reset();
        std::thread::sleep(self.settings.reset_delay());

        let dt = self.settings.frame_dt();
        let frame = Duration::from_secs_f32(dt);
        let interval = self.settings.polling_interval();
        log::info!(
            "Polling {} every {:.2}s",
            self.settings.step_endpoint.path(),
            interval.as_secs_f32()
        );

        let mut since_poll = interval;
        loop {
            if since_poll >= interval {
                if max_polls.is_some_and(|max| self.stats.polls >= max) {
                    break;
                }
                self.poll_once();
                since_poll = Duration::ZERO;
            }
            self.frame(dt);
            std::thread::sleep(frame);
            since_poll += frame;
        }

        log::info!(
            "Session finished: {} polls, {} applied, {} failed, {} morphs",
            self.stats.polls,
            self.stats.applied,
            self.stats.failed,
            self.stats.morphs
        );
    }

    /// Tear down every synchronised object
    pub fn clear(&mut self) {
        self.ingestor.clear(&mut self.scene);
        self.last_report = None;
    }

    fn apply(&mut self, response: &ApiResponse) -> Option<IngestReport> {
        match self.ingestor.ingest(&mut self.scene, &mut self.status, response) {
            Ok(report) => {
                self.last_report = Some(report);
                Some(report)
            }
            Err(IngestError::MissingGameState) => {
                log::error!(
                    "Snapshot without game_state (status: {})",
                    response.status.as_deref().unwrap_or("none")
                );
                None
            }
            Err(err) => {
                log::error!("Failed to apply snapshot: {}", err);
                None
            }
        }
    }
}

fn log_fetch_error(context: &str, err: &FetchError) {
    log::error!("{} failed: {}", context, err);
    if let Some(raw) = err.raw_payload() {
        log::error!("Raw payload: {}", raw);
    }
}
