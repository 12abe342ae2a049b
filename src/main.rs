// logdyn-viewer - main.rs
//
// Native entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation (debug mode support)
// 3. Replaying a captured channel session through the transport
// 4. Writing the resulting display surface as a standalone HTML document

use logdyn_viewer::app::channel::MemoryChannel;
use logdyn_viewer::app::console::TracingConsole;
use logdyn_viewer::app::renderer::Renderer;
use logdyn_viewer::app::replay;
use logdyn_viewer::app::transport::Transport;
use logdyn_viewer::platform::config::{self, AppConfig};
use logdyn_viewer::ui::html;
use logdyn_viewer::util::constants;
use logdyn_viewer::util::error::{RenderError, ViewerError};

use clap::Parser;
use std::cell::RefCell;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// logdyn-viewer - Live log viewer, replay mode.
///
/// Reads a captured log channel session (one JSON message per line, as sent
/// by the logging endpoint) and renders it as a self-contained HTML page with
/// level styling, search highlighting and level hiding.
#[derive(Parser, Debug)]
#[command(name = "logdyn-viewer", version, about)]
struct Cli {
    /// Captured session to replay ("-" or omitted reads stdin).
    input: Option<PathBuf>,

    /// Search pattern (case-insensitive regex, literal if invalid).
    #[arg(short = 'f', long = "filter")]
    filter: Option<String>,

    /// Hide a level; may be repeated.
    #[arg(long = "hide", value_name = "LEVEL")]
    hide: Vec<String>,

    /// Write the HTML document here instead of stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Surface to write (defaults to the first configured surface).
    #[arg(short = 's', long = "surface")]
    surface: Option<String>,

    /// Explicit config.toml path.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    let (app_config, config_warnings) = match cli.config.as_deref() {
        Some(path) => config::load_config_file(path),
        None => load_default_config(),
    };

    init_logging(&cli, &app_config);

    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        endpoint = %app_config.endpoint_path,
        "logdyn-viewer starting"
    );

    if let Err(e) = run(&cli, &app_config) {
        tracing::error!(error = %e, "Replay failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn load_default_config() -> (AppConfig, Vec<String>) {
    let paths = config::PlatformPaths::resolve();
    config::load_config(&paths.config_dir)
}

#[cfg(target_arch = "wasm32")]
fn load_default_config() -> (AppConfig, Vec<String>) {
    (AppConfig::default(), Vec::new())
}

fn init_logging(cli: &Cli, app_config: &AppConfig) {
    logdyn_viewer::util::logging::init(
        cli.debug,
        app_config.log_level.as_deref(),
        app_config.log_file.as_deref(),
    );
}

fn run(cli: &Cli, app_config: &AppConfig) -> Result<(), ViewerError> {
    let renderer = Rc::new(RefCell::new(Renderer::with_surfaces(
        app_config.surfaces.iter().cloned(),
    )?));

    let target = cli
        .surface
        .clone()
        .or_else(|| app_config.surfaces.first().cloned())
        .unwrap_or_else(|| constants::DEFAULT_SURFACE_NAME.to_string());

    // Startup state first, so replayed records are filtered as they arrive.
    {
        let mut r = renderer.try_borrow_mut().map_err(|_| RenderError::Busy)?;
        for surface in &app_config.surfaces {
            for level in &app_config.hidden_levels {
                r.toggle_level_visible(surface, level, true)?;
            }
            if let Some(pattern) = &app_config.filter {
                r.filter(surface, pattern)?;
            }
        }
        for level in &cli.hide {
            r.toggle_level_visible(&target, level, true)?;
        }
        if let Some(pattern) = &cli.filter {
            r.filter(&target, pattern)?;
        }
    }

    let mut transport = Transport::new(
        MemoryChannel::new(),
        TracingConsole,
        app_config.transport_config(),
    )
    .with_renderer(Box::new(Rc::clone(&renderer)));

    let summary = match cli.input.as_deref() {
        None => replay_stdin(&mut transport)?,
        Some(path) if path == Path::new("-") => replay_stdin(&mut transport)?,
        Some(path) => {
            let file = std::fs::File::open(path).map_err(|e| ViewerError::Io {
                path: path.to_path_buf(),
                operation: "open replay input",
                source: e,
            })?;
            replay::replay(BufReader::new(file), path, &mut transport)?
        }
    };

    if summary.rejected > 0 {
        eprintln!(
            "Warning: {} of {} lines could not be read",
            summary.rejected, summary.lines
        );
    }

    let r = renderer.try_borrow().map_err(|_| RenderError::Busy)?;
    let surface = r.surface(&target).ok_or_else(|| RenderError::UnknownSurface {
        name: target.clone(),
    })?;
    let document = html::render_document(surface, constants::APP_NAME);

    write_output(cli.output.as_deref(), &document)?;
    tracing::info!(
        surface = %target,
        fragments = surface.len(),
        shown = surface.displayed().count(),
        "Document written"
    );
    Ok(())
}

fn replay_stdin(
    transport: &mut Transport<MemoryChannel, TracingConsole>,
) -> Result<replay::ReplaySummary, ViewerError> {
    let stdin = std::io::stdin();
    replay::replay(stdin.lock(), Path::new("<stdin>"), transport)
}

fn write_output(output: Option<&Path>, document: &str) -> Result<(), ViewerError> {
    match output {
        Some(path) => std::fs::write(path, document).map_err(|e| ViewerError::Io {
            path: path.to_path_buf(),
            operation: "write document",
            source: e,
        }),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(document.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|e| ViewerError::Io {
                    path: PathBuf::from("<stdout>"),
                    operation: "write document",
                    source: e,
                })
        }
    }
}
