//! Rescue View - headless board client

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use rescue_view::client::{HttpStateFetcher, ReplayFetcher, StateFetcher};
use rescue_view::error::SettingsError;
use rescue_view::scene::HeadlessScene;
use rescue_view::session::Session;
use rescue_view::settings::{Settings, StepEndpoint, Strategy};
use rescue_view::status::LogStatusDisplay;

#[derive(Parser, Debug)]
#[command(name = "rescue-view")]
#[command(about = "Mirror a fire-rescue simulation into a local scene")]
struct Cli {
    /// JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulation server base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Number of firefighters (1-6)
    #[arg(short, long)]
    agents: Option<u32>,

    /// Strategy: improved or random
    #[arg(short, long)]
    strategy: Option<String>,

    /// Endpoint polled each cycle: step, step_fire, step_complete_turn or init
    #[arg(long)]
    step: Option<String>,

    /// Seconds between polls
    #[arg(short, long)]
    interval: Option<f32>,

    /// Stop after this many polls
    #[arg(short, long)]
    polls: Option<usize>,

    /// Replay a JSON-lines recording instead of contacting the server
    #[arg(long)]
    replay: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Rescue View starting...");

    let cli = Cli::parse();
    let settings = match build_settings(&cli) {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let scene = HeadlessScene::new(settings.max_objects, settings.movement_speed);
    let status = LogStatusDisplay::default();

    match &cli.replay {
        Some(path) => match ReplayFetcher::from_file(path) {
            Ok(fetcher) => {
                // A replay ends when the recording does
                let polls = cli.polls.unwrap_or(fetcher.remaining());
                drive(settings, fetcher, scene, status, Some(polls));
            }
            Err(err) => {
                log::error!("Cannot read replay {}: {}", path.display(), err);
                return ExitCode::FAILURE;
            }
        },
        None => match HttpStateFetcher::from_settings(&settings) {
            Ok(fetcher) => drive(settings, fetcher, scene, status, cli.polls),
            Err(err) => {
                log::error!("Cannot build HTTP client: {}", err);
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}

fn build_settings(cli: &Cli) -> Result<Settings, SettingsError> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    if let Some(url) = &cli.api_url {
        settings.api_url = url.clone();
    }
    if let Some(agents) = cli.agents {
        settings.number_of_agents = agents;
    }
    if let Some(name) = &cli.strategy {
        settings.strategy = Strategy::parse(name)?;
    }
    if let Some(name) = &cli.step {
        settings.step_endpoint = StepEndpoint::parse(name)?;
    }
    if let Some(interval) = cli.interval {
        settings.polling_interval_secs = interval;
    }

    Ok(settings.sanitized())
}

fn drive<F: StateFetcher>(
    settings: Settings,
    fetcher: F,
    scene: HeadlessScene,
    status: LogStatusDisplay,
    polls: Option<usize>,
) {
    let mut session = Session::new(settings, fetcher, scene, status);
    session.run(polls);

    let scene = session.scene();
    let stats = scene.stats();
    log::info!(
        "Scene: {} objects ({} spawned, {} despawned, {} moves)",
        scene.len(),
        stats.spawned,
        stats.despawned,
        stats.moves
    );
    for (kind, count) in scene.census() {
        log::info!("  {:<16} {}", kind.as_str(), count);
    }
    let status = session.status();
    if !status.progress().is_empty() {
        log::info!("Final progress: {}", status.progress());
    }
    if !status.current().is_empty() {
        log::info!("Final status: {}", status.current());
    }
}
