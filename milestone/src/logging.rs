use std::fs::File;
use std::str::FromStr;

use log::{Level, LevelFilter};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};

use crate::config::LoggingConfig;

/// Level from `RUST_LOG`, falling back to the configured level and then to
/// `info`.
#[must_use]
pub fn log_level(config: &LoggingConfig) -> LevelFilter {
    std::env::var("RUST_LOG")
        .ok()
        .as_deref()
        .map(LevelFilter::from_str)
        .and_then(Result::ok)
        .or_else(|| LevelFilter::from_str(&config.level).ok())
        .unwrap_or(LevelFilter::Info)
}

/// Installs the global logger. Does nothing when logging is disabled.
pub fn init_logger(config: &LoggingConfig) {
    if !config.enabled {
        return;
    }

    let mut builder = ConfigBuilder::new();
    if config.timestamp {
        builder.set_time_format_custom(time::macros::format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ));
        builder.set_time_level(LevelFilter::Error);
        let _ = builder.set_time_offset_to_local();
    } else {
        builder.set_time_level(LevelFilter::Off);
    }

    if config.threads {
        builder.set_thread_level(LevelFilter::Info);
    } else {
        builder.set_thread_level(LevelFilter::Off);
    }

    let level = log_level(config);
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::with_capacity(2);

    if !config.file.is_empty() {
        match File::create(&config.file) {
            Ok(file) => {
                let mut file_config = builder.clone();
                for level in Level::iter() {
                    file_config.set_level_color(level, None);
                }
                loggers.push(WriteLogger::new(level, file_config.build(), file));
            }
            Err(err) => eprintln!("Failed to open log file {}: {err}", config.file),
        }
    }

    if !config.color {
        for level in Level::iter() {
            builder.set_level_color(level, None);
        }
    }
    let color = if config.color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    loggers.push(TermLogger::new(
        level,
        builder.build(),
        TerminalMode::Mixed,
        color,
    ));

    if CombinedLogger::init(loggers).is_err() {
        eprintln!("Failed to set logger; already initialized");
    }
}
