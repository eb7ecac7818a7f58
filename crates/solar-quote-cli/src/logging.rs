use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};

/// Environment variable consulted when `--log-level` is not given.
pub const LOG_LEVEL_ENV: &str = "SOLAR_QUOTE_LOG_LEVEL";

/// Quiet by default: stdout carries the computation output.
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Initialise the `fern` logger on stderr.
///
/// The level comes from the command line, then `SOLAR_QUOTE_LOG_LEVEL`, then
/// the default. Colours are used only when stderr is a terminal.
pub fn init(level_from_cli: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let level = match level_from_cli {
        Some(level) => level.to_string(),
        None => env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string()),
    };
    let level = parse_level(&level)?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let use_colour = atty::is(atty::Stream::Stderr);

    Dispatch::new()
        .format(move |out, message, record| {
            if use_colour {
                write_log(out, colours.color(record.level()), record, message);
            } else {
                write_log(out, record.level(), record, message);
            }
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}

fn parse_level(level: &str) -> Result<LevelFilter, Box<dyn std::error::Error>> {
    level
        .parse::<LevelFilter>()
        .map_err(|_| format!("Unknown log level: {level}").into())
}

fn write_log<T: Display>(out: FormatCallback, level: T, record: &Record, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");
    out.finish(format_args!(
        "[{timestamp} {level} {}] {message}",
        record.target()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_is_case_insensitive() {
        assert_eq!(parse_level("DEBUG").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::Off);
    }

    #[test]
    fn test_unknown_level_rejected() {
        let err = parse_level("loud").unwrap_err();
        assert_eq!(err.to_string(), "Unknown log level: loud");
    }

    #[test]
    fn test_default_level_parses() {
        assert_eq!(parse_level(DEFAULT_LOG_LEVEL).unwrap(), LevelFilter::Warn);
    }
}
