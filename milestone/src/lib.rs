#![deny(clippy::all)]
#![deny(clippy::pedantic)]
// to keep consistency
#![deny(clippy::use_self)]
#![deny(clippy::redundant_clone)]
#![deny(clippy::needless_collect)]
// use log crate
#![deny(clippy::print_stdout)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::select;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

use crate::command::Command;
use crate::server::AdvancementServer;

pub mod advancement;
pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;
pub mod storage;

pub static SHOULD_STOP: AtomicBool = AtomicBool::new(false);
pub static STOP_INTERRUPT: LazyLock<Notify> = LazyLock::new(Notify::new);

pub fn stop_server() {
    SHOULD_STOP.store(true, Ordering::Relaxed);
    STOP_INTERRUPT.notify_waiters();
}

/// Reads console commands until `stop` or an interrupt, autosaving on the
/// configured interval. Saves every player before returning.
pub async fn run_console(mut server: AdvancementServer) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let autosave = server.config.autosave_interval;
    let mut autosave_timer = tokio::time::interval(Duration::from_secs(autosave.max(1)));
    autosave_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    autosave_timer.tick().await;

    while !SHOULD_STOP.load(Ordering::Relaxed) {
        select! {
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => handle_line(&mut server, &line),
                Ok(None) => {
                    log::debug!("Console input closed; waiting for a stop signal");
                    stdin_open = false;
                }
                Err(err) => {
                    log::error!("Failed to read console input: {err}");
                    stdin_open = false;
                }
            },
            _ = autosave_timer.tick(), if autosave > 0 => {
                log::debug!("Autosaving player advancements");
                server.save_all();
            }
            () = STOP_INTERRUPT.notified() => break,
        }
    }

    log::info!("Saving player advancements...");
    server.save_all();
}

fn handle_line(server: &mut AdvancementServer, line: &str) {
    let command = match Command::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return,
        Err(err) => {
            log::warn!("{err}");
            return;
        }
    };
    if matches!(command, Command::Stop) {
        stop_server();
        return;
    }
    match command.execute(server) {
        Ok(feedback) => log::info!("{feedback}"),
        Err(err) => log::warn!("{err}"),
    }
}
