//! beacon-bridge console host
//!
//! Runs the bridge without a web view. Each stdin line is an IPC envelope
//! exactly as the page would post it (`{"name": ..., "body": ...}`), and
//! every script the host would evaluate in the page is printed to stdout.

use beacon_bridge::bridge::{DirectoryExporter, Presentation};
use beacon_bridge::config::Config;
use beacon_bridge::fetch::ReqwestClient;
use beacon_bridge::notify::LogNotifier;
use beacon_bridge::script::ChannelExecutor;
use beacon_bridge::speech::{create_synth, event_channel};
use beacon_bridge::{Bridge, BridgeParts, Result};
use log::{debug, error, info};
use std::io::{self, BufRead, Write};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Presentation layer for a terminal: reports instead of drawing
#[derive(Default)]
struct ConsolePresentation {
    closed: AtomicBool,
}

impl Presentation for ConsolePresentation {
    fn on_library_load_error(&self, message: &str) {
        eprintln!("Widget failed to load: {}", message);
    }

    fn close_widget(&self) {
        eprintln!("Widget closed");
        self.closed.store(true, Ordering::Release);
    }
}

fn main() {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let debug_mode = args.iter().any(|arg| arg == "--debug" || arg == "-d");

    // Initialize logger
    if debug_mode {
        // Debug mode: write to beacon-bridge.log
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("beacon-bridge.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open beacon-bridge.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "beacon-bridge version {} starting (debug mode, logging to beacon-bridge.log)",
            beacon_bridge::VERSION
        );
    } else {
        // Normal mode: RUST_LOG decides, warnings and errors always shown
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Warn)
            .parse_default_env()
            .init();
    }

    if let Err(e) = run(&args, debug_mode) {
        error!("Fatal error: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Value following `--config`, if given
fn config_path(args: &[String]) -> Option<&str> {
    args.iter()
        .position(|arg| arg == "--config" || arg == "-c")
        .and_then(|idx| args.get(idx + 1))
        .map(String::as_str)
}

fn run(args: &[String], debug_mode: bool) -> Result<()> {
    let config = match config_path(args) {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    info!("Configuration loaded from {:?}", config.path());

    let mut widget = config.widget()?;
    widget.debug |= debug_mode;
    let speech = config.speech();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let (executor, scripts) = ChannelExecutor::new();
    let (events_tx, events_rx) = event_channel();
    let synth = create_synth(events_tx, &speech)?;
    let presentation = Arc::new(ConsolePresentation::default());

    let bridge = Bridge::new(
        widget,
        &speech,
        BridgeParts {
            executor: Arc::new(executor),
            synth,
            synth_events: Some(events_rx),
            http: Arc::new(ReqwestClient::new(&config.fetch())?),
            presentation: presentation.clone(),
            exporter: Arc::new(DirectoryExporter::new(config.export_dir())),
            notifier: Arc::new(LogNotifier),
            runtime: runtime.handle().clone(),
        },
    )?;

    // The "UI thread": the only place scripts are evaluated
    let ui = thread::Builder::new()
        .name("ui".to_string())
        .spawn(move || {
            for script in scripts {
                let mut out = io::stdout().lock();
                if writeln!(out, "{}", script).and_then(|_| out.flush()).is_err() {
                    break;
                }
            }
            debug!("UI loop finished");
        })?;

    bridge.on_page_loaded()?;
    eprintln!(
        "beacon-bridge {} ready for org {} - one JSON envelope per line, EOF to quit",
        beacon_bridge::VERSION,
        bridge.config().org_id
    );

    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        bridge.on_ipc(&line);
        if presentation.closed.load(Ordering::Acquire) {
            break;
        }
    }

    bridge.teardown();
    runtime.shutdown_timeout(Duration::from_secs(1));
    drop(bridge);
    if ui.join().is_err() {
        error!("UI loop panicked");
    }

    info!("beacon-bridge exiting");
    Ok(())
}
