use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use periph::board::Board;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::scenario::{Scenario, ScenarioError};

mod scenario;

/// When set, logs go to `<dir>/gpiosim.log` instead of stdout.
const LOG_DIR_ENV: &str = "GPIOSIM_LOG_DIR";

/// Played when no scenario file is given.
const SMOKE_SCENARIO: &str = include_str!("../scenarios/smoke.yaml");

struct Options {
    scenario: Option<PathBuf>,
    /// Print the final peripheral state as YAML.
    dump: bool,
}

impl Options {
    fn from_args() -> Self {
        let mut options = Self {
            scenario: None,
            dump: false,
        };

        for arg in env::args().skip(1) {
            match arg.as_str() {
                "--dump" => options.dump = true,
                _ => options.scenario = Some(PathBuf::from(arg)),
            }
        }

        options
    }
}

fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(dir) = env::var_os(LOG_DIR_ENV) {
        let appender = tracing_appender::rolling::never(dir, "gpiosim.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        None
    }
}

fn run(options: &Options) -> Result<(), ScenarioError> {
    let scenario = match &options.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::from_yaml(SMOKE_SCENARIO)?,
    };

    tracing::info!("gpiosim v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("running scenario '{}'", scenario.name);

    let mut board = Board::new();
    let report = scenario.run(&mut board)?;

    tracing::info!(
        "scenario '{}' passed: {} steps, {} reads, {} checks, {} ticks",
        scenario.name,
        report.steps,
        report.reads,
        report.checks,
        board.gpio().ticks()
    );

    if options.dump {
        match serde_yaml::to_string(&board.gpio().snapshot()) {
            Ok(state) => println!("{state}"),
            Err(e) => tracing::warn!("cannot dump peripheral state: {e}"),
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let _guard = init_tracing();
    let options = Options::from_args();

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
