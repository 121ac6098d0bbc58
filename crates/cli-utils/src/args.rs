//! Logging CLI arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::{
    DEFAULT_LOG_FILE_PREFIX, FileLogConfig, LogConfig, LogFormat, LogRotation, StdoutLogConfig,
    verbosity_to_level_filter,
};

/// Log-related CLI arguments.
///
/// Verbosity levels: 1=ERROR, 2=WARN, 3=INFO (default), 4=DEBUG, 5=TRACE.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
pub struct LogArgs {
    /// Increase logging verbosity (1=ERROR, 2=WARN, 3=INFO, 4=DEBUG, 5=TRACE).
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        default_value = "3",
        env = "TXFLOOD_LOG_LEVEL",
        global = true
    )]
    pub level: u8,

    /// Suppress stdout logging.
    #[arg(long = "quiet", short = 'q', global = true)]
    pub stdout_quiet: bool,

    /// Stdout log format.
    #[arg(long = "log-format", default_value = "full", env = "TXFLOOD_LOG_FORMAT", global = true)]
    pub stdout_format: LogFormat,

    /// Directory for file logging (enables file logging when set).
    #[arg(long = "log-dir", env = "TXFLOOD_LOG_DIR", global = true)]
    pub file_directory: Option<PathBuf>,

    /// File name of file logs; rotated files get a date suffix.
    #[arg(long = "log-file-prefix", default_value = DEFAULT_LOG_FILE_PREFIX, global = true)]
    pub file_prefix: String,

    /// File log format.
    #[arg(long = "log-file-format", default_value = "json", global = true)]
    pub file_format: LogFormat,

    /// File log rotation strategy.
    #[arg(long = "log-rotation", default_value = "never", global = true)]
    pub file_rotation: LogRotation,
}

impl Default for LogArgs {
    fn default() -> Self {
        Self {
            level: 3,
            stdout_quiet: false,
            stdout_format: LogFormat::Full,
            file_directory: None,
            file_prefix: DEFAULT_LOG_FILE_PREFIX.to_string(),
            file_format: LogFormat::Json,
            file_rotation: LogRotation::Never,
        }
    }
}

impl From<LogArgs> for LogConfig {
    fn from(args: LogArgs) -> Self {
        let stdout_logs =
            (!args.stdout_quiet).then_some(StdoutLogConfig { format: args.stdout_format });

        let file_logs = args.file_directory.map(|dir| FileLogConfig {
            directory_path: dir,
            file_prefix: args.file_prefix,
            format: args.file_format,
            rotation: args.file_rotation,
        });

        Self { global_level: verbosity_to_level_filter(args.level), stdout_logs, file_logs }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        log: LogArgs,
    }

    fn parse(args: &[&str]) -> LogArgs {
        TestCli::parse_from(std::iter::once("test").chain(args.iter().copied())).log
    }

    #[rstest]
    #[case::single_v(&["-v"], 1)]
    #[case::double_v(&["-vv"], 2)]
    #[case::quad_v(&["-vvvv"], 4)]
    fn verbosity_parsing(#[case] args: &[&str], #[case] expected: u8) {
        assert_eq!(parse(args).level, expected);
    }

    #[rstest]
    #[case::full("full", LogFormat::Full)]
    #[case::compact("compact", LogFormat::Compact)]
    #[case::json("json", LogFormat::Json)]
    fn format_parsing(#[case] format: &str, #[case] expected: LogFormat) {
        assert_eq!(parse(&["--log-format", format]).stdout_format, expected);
    }

    #[test]
    fn quiet_disables_stdout() {
        let config: LogConfig = parse(&["--quiet"]).into();
        assert!(config.stdout_logs.is_none());
    }

    #[test]
    fn file_prefix_is_configurable() {
        let config: LogConfig =
            parse(&["--log-dir", "/tmp/txflood", "--log-file-prefix", "blast.log"]).into();
        assert_eq!(config.file_logs.map(|file| file.file_prefix).as_deref(), Some("blast.log"));
    }

    #[test]
    fn default_config() {
        let config: LogConfig = LogArgs::default().into();
        assert_eq!(config.global_level, LevelFilter::INFO);
        assert!(config.stdout_logs.is_some());
        assert!(config.file_logs.is_none());
    }

    #[test]
    fn log_dir_enables_file_logging() {
        let config: LogConfig =
            parse(&["--log-dir", "/tmp/txflood", "--log-rotation", "daily"]).into();
        let file = config.file_logs.expect("file logging enabled");
        assert_eq!(file.directory_path, PathBuf::from("/tmp/txflood"));
        assert_eq!(file.file_prefix, DEFAULT_LOG_FILE_PREFIX);
        assert_eq!(file.format, LogFormat::Json);
        assert_eq!(file.rotation, LogRotation::Daily);
    }
}
