//! Tracing subscriber initialization.

use std::{io, sync::Once};

use tracing::Subscriber;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{MakeWriter, layer},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::{FileLogConfig, LogConfig, LogFormat, LogRotation};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

impl LogConfig {
    /// Installs the global tracing subscriber. `RUST_LOG` directives override the level.
    ///
    /// When file logging is enabled the returned guard flushes the file writer on drop, so
    /// it has to be held until the process is done logging.
    pub fn init_tracing_subscriber(&self) -> eyre::Result<Option<WorkerGuard>> {
        let filter =
            EnvFilter::builder().with_default_directive(self.global_level.into()).from_env_lossy();

        let stdout = self.stdout_logs.map(|stdout| formatted(stdout.format, io::stdout, true));
        let (file, guard) = match &self.file_logs {
            Some(config) => {
                let (layer, guard) = file_layer(config);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(stdout)
            .with(file)
            .try_init()
            .map_err(|e| eyre::eyre!("Failed to initialize tracing subscriber: {}", e))?;
        Ok(guard)
    }
}

/// A fmt layer writing `format` to `writer`.
fn formatted<S, W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a> + Send + Sync,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = layer().with_writer(writer).with_ansi(ansi);
    match format {
        LogFormat::Full => Box::new(base),
        LogFormat::Compact => Box::new(base.compact()),
        LogFormat::Json => Box::new(base.json()),
    }
}

/// A non-blocking layer appending to `<dir>/<prefix>[.<date>]`.
fn file_layer<S>(config: &FileLogConfig) -> (BoxedLayer<S>, WorkerGuard)
where
    S: Subscriber + for<'a> LookupSpan<'a> + Send + Sync,
{
    let rotation = match config.rotation {
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    };
    let appender =
        RollingFileAppender::new(rotation, &config.directory_path, &config.file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    (formatted(config.format, writer, false), guard)
}

/// Initializes test-writer tracing once per process.
pub fn init_test_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
            .from_env_lossy();

        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tracing_subscriber::Registry;

    use super::*;

    #[test]
    fn init_test_tracing_is_idempotent() {
        init_test_tracing();
        init_test_tracing();
    }

    #[test]
    fn file_layer_writes_under_the_configured_prefix() {
        let dir: PathBuf =
            std::env::temp_dir().join(format!("txflood-logs-{}", std::process::id()));
        let config = FileLogConfig {
            directory_path: dir.clone(),
            file_prefix: "blast.log".to_string(),
            format: LogFormat::Json,
            rotation: LogRotation::Never,
        };

        let (_layer, guard) = file_layer::<Registry>(&config);
        drop(guard);

        assert!(dir.join("blast.log").exists());
        let _ = std::fs::remove_dir_all(dir);
    }
}
