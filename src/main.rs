//! event-horizon: vulnerability triage dashboard client.
//!
//! Submits files to the Event Horizon analysis engine and shows the
//! resulting reachability and MITRE technique on a terminal dashboard.
//! Falls back to a local simulation when the engine is down.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use event_horizon::app::Session;
use event_horizon::config::{self, Config};
use event_horizon::input::drop_folder::DropFolderWatcher;
use event_horizon::input::{IngestFile, InputController, drop_server};
use event_horizon::logging;

/// Event Horizon triage client
#[derive(Parser, Debug)]
#[command(name = "event-horizon", version, about = "Event Horizon triage dashboard client")]
struct Args {
    /// Files to ingest (any type; contents are not inspected locally)
    files: Vec<PathBuf>,

    /// Analysis engine base URL (overrides config)
    #[arg(short, long)]
    engine: Option<String>,

    /// Path to config.toml (default: ~/.config/event-horizon/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Watch this folder and ingest files moved into it
    #[arg(long)]
    drop_folder: Option<PathBuf>,

    /// Serve POST /drop uploads on this address (e.g. 127.0.0.1:8700)
    #[arg(long)]
    listen: Option<SocketAddr>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = logging::init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    let result = runtime.block_on(run(args));

    runtime.shutdown_timeout(std::time::Duration::from_secs(1));
    result
}

fn load_config(args: &Args) -> Result<Config> {
    let path = match &args.config {
        Some(path) => Some(path.clone()),
        None => {
            let default = config::default_config_path();
            if let Some(path) = &default {
                config::ensure_default_config(path, &config::default_config_content());
            }
            default
        }
    };

    let mut config = match &path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(engine) = &args.engine {
        config.engine.base_url = engine.clone();
        config.base_url()?;
    }
    if args.drop_folder.is_some() {
        config.drop.folder = args.drop_folder.clone();
    }
    if args.listen.is_some() {
        config.drop.listen = args.listen;
    }
    Ok(config)
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let session = Session::new(&config)?;

    println!("event-horizon v{}", env!("CARGO_PKG_VERSION"));
    println!("Engine: {}", config.engine.base_url);

    session.probe.check_status().await;

    let (controller, sender) = InputController::new(session.analysis.clone());

    for path in &args.files {
        match IngestFile::from_path(path).await {
            Ok(file) => {
                let _ = sender.send(file);
            }
            Err(e) => {
                warn!(target: "input", "skipping {}: {:#}", path.display(), e);
                eprintln!("Skipping {}: {:#}", path.display(), e);
            }
        }
    }

    let watching = config.drop.folder.is_some() || config.drop.listen.is_some();
    if !watching {
        drop(sender);
        controller.run().await;
        session.renderer.wait_for_animations().await;
        println!("\n{}", session.render());
        return Ok(());
    }

    let _watcher = match &config.drop.folder {
        Some(folder) => {
            let watcher = DropFolderWatcher::start(folder.clone(), sender.clone())?;
            println!("Drop folder: {}", watcher.folder().display());
            Some(watcher)
        }
        None => None,
    };
    let server = match config.drop.listen {
        Some(addr) => {
            let (bound, handle) = drop_server::start(addr, sender.clone()).await?;
            println!("Drop endpoint: http://{bound}/drop");
            Some(handle)
        }
        None => None,
    };
    drop(sender);

    println!("\n{}", session.render());
    let printer = tokio::spawn(print_on_settle(session.clone()));

    tokio::select! {
        finished = controller.run_with(drop) => {
            info!(target: "input", finished, "all input sources closed");
        }
        _ = tokio::signal::ctrl_c() => {}
    }

    printer.abort();
    if let Some(server) = server {
        server.abort();
    }
    let cancelled = session.renderer.scheduler().cancel_all();
    debug!(target: "dashboard", cancelled, "shutting down");
    Ok(())
}

/// Reprint the dashboard each time a submission has fully rendered.
async fn print_on_settle(session: Session) {
    let mut rx = session.renderer.subscribe();
    let mut printed: Option<u64> = None;
    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();
        if state.animation_settled() && state.last_applied != printed {
            printed = state.last_applied;
            println!("\n{}", session.render());
        }
    }
}
