//! Game status display
//!
//! Purely informational; nothing here feeds back into reconciliation.

use crate::sync::snapshot::GameStats;

/// Status-display collaborator
pub trait StatusDisplay {
    /// Headline text (outcome once the game is over)
    fn show(&mut self, text: &str);

    /// Latest aggregate stats, every snapshot that carries them
    fn stats(&mut self, stats: &GameStats);
}

/// Headline for the current stats: outcome once the game ends, empty before
pub fn status_text(stats: &GameStats) -> String {
    if !stats.game_over {
        return String::new();
    }
    if stats.game_won {
        "Won! :)".to_string()
    } else {
        "Lost :(".to_string()
    }
}

/// One-line progress summary for logs
pub fn stats_line(stats: &GameStats) -> String {
    format!(
        "rescued {}/{}, lost {}/{}, damage {}/{}",
        stats.victims_rescued,
        stats.win_condition,
        stats.victims_lost,
        stats.lose_victims,
        stats.damage_cubes,
        stats.max_damage
    )
}

/// Logs the status and progress lines whenever they change
#[derive(Debug, Clone, Default)]
pub struct LogStatusDisplay {
    current: String,
    progress: String,
}

impl LogStatusDisplay {
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Last [`stats_line`] seen
    pub fn progress(&self) -> &str {
        &self.progress
    }
}

impl StatusDisplay for LogStatusDisplay {
    fn show(&mut self, text: &str) {
        if self.current != text {
            if !text.is_empty() {
                log::info!("Game status: {}", text);
            }
            self.current = text.to_string();
        }
    }

    fn stats(&mut self, stats: &GameStats) {
        let line = stats_line(stats);
        if self.progress != line {
            log::info!("Progress: {}", line);
            self.progress = line;
        }
    }
}

/// Keeps everything it was shown, for inspection
#[derive(Debug, Clone, Default)]
pub struct RecordingStatus {
    pub shown: Vec<String>,
    pub stats: Vec<GameStats>,
}

impl StatusDisplay for RecordingStatus {
    fn show(&mut self, text: &str) {
        self.shown.push(text.to_string());
    }

    fn stats(&mut self, stats: &GameStats) {
        self.stats.push(stats.clone());
    }
}
