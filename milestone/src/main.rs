#![deny(clippy::all)]
#![deny(clippy::pedantic)]
// use log crate
#![deny(clippy::print_stdout)]

use std::io;
use std::time::Instant;

#[cfg(not(unix))]
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use milestone::config::{LoadConfiguration, MilestoneConfig};
use milestone::server::AdvancementServer;
use milestone::stop_server;

const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    let time = Instant::now();

    let config_dir = match std::env::current_dir() {
        Ok(dir) => dir.join("config"),
        Err(err) => {
            eprintln!("Unable to resolve the working directory: {err}");
            std::process::exit(1);
        }
    };
    let config = match MilestoneConfig::load(&config_dir) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    milestone::logging::init_logger(&config.logging);
    log::info!("Starting Milestone {CARGO_PKG_VERSION}");
    log::debug!(
        "Build info: OS: \"{}\", ARCH: \"{}\", BUILD: \"{}\"",
        std::env::consts::OS,
        std::env::consts::ARCH,
        if cfg!(debug_assertions) {
            "Debug"
        } else {
            "Release"
        }
    );

    tokio::spawn(async {
        if let Err(err) = setup_sighandler().await {
            log::error!("Unable to set up signal handlers: {err}");
        }
    });

    let mut server = AdvancementServer::new(config);
    let count = server.load_datapacks();
    log::info!(
        "Loaded {count} advancement(s); took {}ms",
        time.elapsed().as_millis()
    );
    log::info!("Type `help` for a list of commands");

    milestone::run_console(server).await;
    log::info!("Stopped.");
}

fn handle_interrupt() {
    log::warn!("Received interrupt signal; stopping...");
    stop_server();
}

// Non-UNIX Ctrl-C handling
#[cfg(not(unix))]
async fn setup_sighandler() -> io::Result<()> {
    if ctrl_c().await.is_ok() {
        handle_interrupt();
    }

    Ok(())
}

// Unix signal handling
#[cfg(unix)]
async fn setup_sighandler() -> io::Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = interrupt.recv() => {}
        _ = hangup.recv() => {}
        _ = terminate.recv() => {}
    }
    handle_interrupt();

    Ok(())
}
