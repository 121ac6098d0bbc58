//! Logging configuration types.

use std::path::PathBuf;

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Timestamp, level, target and fields.
    #[default]
    Full,
    /// Level and message only.
    Compact,
    /// One JSON object per line.
    Json,
}

/// Rotation of file logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogRotation {
    /// Rotate every minute.
    Minutely,
    /// Rotate every hour.
    Hourly,
    /// Rotate every day.
    Daily,
    /// Never rotate.
    #[default]
    Never,
}

/// Default file name prefix of file logs.
pub const DEFAULT_LOG_FILE_PREFIX: &str = "txflood.log";

/// Configuration for file logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLogConfig {
    /// Directory the log files are written to.
    pub directory_path: PathBuf,
    /// File name, or file name prefix when rotating.
    pub file_prefix: String,
    /// Format of file logs.
    pub format: LogFormat,
    /// Rotation of file logs.
    pub rotation: LogRotation,
}

/// Configuration for stdout logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdoutLogConfig {
    /// Format of stdout logs.
    pub format: LogFormat,
}

/// Global logging configuration. Defaults to INFO on stdout in full format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Global verbosity.
    pub global_level: LevelFilter,
    /// Stdout logging, disabled when `None`.
    pub stdout_logs: Option<StdoutLogConfig>,
    /// File logging, disabled when `None`.
    pub file_logs: Option<FileLogConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global_level: LevelFilter::INFO,
            stdout_logs: Some(StdoutLogConfig { format: LogFormat::Full }),
            file_logs: None,
        }
    }
}

/// Maps a `-v` count onto a level: 1=ERROR, 2=WARN, 3=INFO, 4=DEBUG, 5+=TRACE, 0=OFF.
pub const fn verbosity_to_level_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::OFF,
        1 => LevelFilter::ERROR,
        2 => LevelFilter::WARN,
        3 => LevelFilter::INFO,
        4 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, LevelFilter::OFF)]
    #[case(1, LevelFilter::ERROR)]
    #[case(2, LevelFilter::WARN)]
    #[case(3, LevelFilter::INFO)]
    #[case(4, LevelFilter::DEBUG)]
    #[case(5, LevelFilter::TRACE)]
    #[case(9, LevelFilter::TRACE)]
    fn verbosity_levels(#[case] verbosity: u8, #[case] expected: LevelFilter) {
        assert_eq!(verbosity_to_level_filter(verbosity), expected);
    }
}
