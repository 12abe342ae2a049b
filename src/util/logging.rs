// logdyn-viewer - util/logging.rs
//
// Structured logging with runtime-selectable debug mode.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --debug
//   - Config file: [logging] level = "debug"
//
// Output: stderr, and additionally a log file when [logging] file is set.
// Mirrored records appear on the `logdyn::console` target, so
// RUST_LOG=logdyn::console=off silences them without hiding diagnostics.

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Initialise the logging subsystem.
///
/// `debug_flag` is true when the user passed --debug on the CLI.
/// `config_level` is the level from config.toml (if present).
/// `log_file` is the optional log file path from config.toml.
///
/// Priority: RUST_LOG env var > CLI --debug flag > config level > default "info".
pub fn init(debug_flag: bool, config_level: Option<&str>, log_file: Option<&str>) {
    let filter = build_filter(
        std::env::var("RUST_LOG").is_ok(),
        debug_flag,
        config_level,
    );

    let file = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Some(f),
            Err(e) => {
                // Subscriber is not installed yet; stderr is the only channel.
                eprintln!("Warning: cannot open log file '{path}': {e}. Logging to stderr only.");
                None
            }
        }
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact();

    match file {
        Some(f) => builder
            .with_writer(std::io::stderr.and(Mutex::new(f)))
            .with_ansi(false)
            .init(),
        None => builder.with_writer(std::io::stderr).init(),
    }

    tracing::debug!(
        app = super::constants::APP_NAME,
        version = super::constants::APP_VERSION,
        log_file = log_file.unwrap_or(""),
        "Logging initialised"
    );
}

/// Resolve the env filter according to the priority order documented on
/// [`init`].
pub(crate) fn build_filter(env_set: bool, debug_flag: bool, config_level: Option<&str>) -> EnvFilter {
    if env_set {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else if let Some(level) = config_level {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL)
    }
}
