use crate::error::{CliError, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt::{self},
    prelude::*,
};

/// Prefix shared by the library and binary module paths.
const CRATE_TARGET: &str = "ligopt";

fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Our own crates log at the requested level; dependencies never go below WARN.
fn targets_for(level: LevelFilter) -> Targets {
    Targets::new()
        .with_default(level.min(LevelFilter::WARN))
        .with_target(CRATE_TARGET, level)
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(CliError::Io)
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let level = level_for(verbosity, quiet);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(targets_for(level));

    // The file always records the device layer in full detail.
    let file_layer = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(open_log_file(&path)?)
                .with_ansi(false)
                .with_thread_ids(true)
                .with_filter(targets_for(level.max(LevelFilter::DEBUG))),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ligopt::core::models::size::ConfSize;
    use ligopt::engine::change::StepVector;
    use ligopt::engine::device::HostDevice;
    use serial_test::serial;
    use tracing::Level;

    #[test]
    fn quiet_wins_over_verbosity() {
        assert_eq!(level_for(3, true), LevelFilter::ERROR);
        assert_eq!(level_for(0, false), LevelFilter::WARN);
        assert_eq!(level_for(2, false), LevelFilter::DEBUG);
        assert_eq!(level_for(9, false), LevelFilter::TRACE);
    }

    #[test]
    fn dependencies_are_capped_at_warn() {
        let targets = targets_for(LevelFilter::TRACE);
        assert!(targets.would_enable("ligopt::engine::bfgs", &Level::TRACE));
        assert!(!targets.would_enable("cudarc::driver", &Level::INFO));
        assert!(targets.would_enable("cudarc::driver", &Level::WARN));
    }

    #[test]
    fn quiet_targets_still_pass_errors() {
        let targets = targets_for(level_for(0, true));
        assert!(targets.would_enable("ligopt", &Level::ERROR));
        assert!(!targets.would_enable("ligopt", &Level::WARN));
    }

    #[test]
    #[serial]
    fn step_vector_construction_is_logged_to_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("ligopt.log");

        let file_layer = fmt::layer()
            .with_writer(open_log_file(&log_path).unwrap())
            .with_ansi(false)
            .with_thread_ids(true)
            .with_filter(targets_for(LevelFilter::DEBUG));
        let subscriber = tracing_subscriber::registry().with(file_layer);

        tracing::subscriber::with_default(subscriber, || {
            let device = HostDevice::new();
            let change = ConfSize::single_ligand(2, vec![]).zero_change();
            StepVector::from_change(&device, &change).unwrap();
        });

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("Building step vector."));
        assert!(content.contains("DEBUG"));
        assert!(content.contains("ThreadId"));
    }

    #[test]
    #[serial]
    fn log_file_is_appended_not_truncated() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("ligopt.log");
        std::fs::write(&log_path, "previous run\n").unwrap();

        let file_layer = fmt::layer()
            .with_writer(open_log_file(&log_path).unwrap())
            .with_ansi(false)
            .with_filter(targets_for(LevelFilter::INFO));
        let subscriber = tracing_subscriber::registry().with(file_layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("next run");
        });

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.starts_with("previous run\n"));
        assert!(content.contains("next run"));
    }

    #[test]
    #[serial]
    fn invalid_log_file_path_propagates_error() {
        let invalid_path = PathBuf::from("/");

        if cfg!(unix) && invalid_path.is_dir() {
            let result = setup_logging(0, false, Some(invalid_path));
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }
}
