use crate::config::LoggingConfig;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use std::fs::OpenOptions;

pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info, // Default to Info for any other value
    }
}

/// Installs the global logger. Records go to stderr so progress and summary
/// lines on stdout stay clean, and are also appended to the configured file.
pub fn setup_logger(logging: &LoggingConfig) -> Result<(), log::SetLoggerError> {
    let log_level = parse_level(logging.level());

    let colors = ColoredLevelConfig::new()
        .trace(Color::BrightBlack)
        .debug(Color::BrightBlue)
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red);

    let mut dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(log_level)
        .chain(std::io::stderr());

    if let Some(file_path) = logging.file() {
        match OpenOptions::new().create(true).append(true).open(file_path) {
            Ok(file) => dispatch = dispatch.chain(file),
            Err(e) => {
                eprintln!("Warning: Failed to open log file '{}': {}", file_path, e);
                eprintln!("Continuing without file logging.");
            }
        }
    }

    dispatch.apply()?;

    log::debug!("Logger initialized with level: {}", logging.level());
    Ok(())
}
