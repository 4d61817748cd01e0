//! Logging configuration for query-gate.
//!
//! Every event goes to stderr and to a size-capped log file that keeps a
//! fixed number of numbered backups (`app.log.1`, ...). Audit entries share
//! the same file under the `audit` target. File lines read
//! `2024-03-01 10:00:00,123 - WARNING - message`.

use crate::config::LoggingConfig;
use crate::error::{GateError, Result};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging to stderr and the rotating log file.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let file_writer = RotatingWriter::open(&config.file, config.max_bytes, config.backups)
        .map_err(|e| {
            GateError::config(format!(
                "Could not open log file {}: {e}",
                config.file.display()
            ))
        })?;

    tracing_subscriber::registry()
        .with(file_layer(file_writer).with_filter(env_filter()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(env_filter()),
        )
        .try_init()
        .map_err(|e| GateError::internal(format!("Logging already initialized: {e}")))
}

/// Initializes stderr-only logging, used before the config is known.
pub fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter()).try_init();
}

/// Formatting layer that writes `<timestamp> - <LEVEL> - <message>` lines.
pub fn file_layer<S>(writer: RotatingWriter) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .event_format(LineFormat)
}

struct LineFormat;

fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        _ => "TRACE",
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} - {} - ",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            level_name(event.metadata().level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

struct RollingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    file: Option<File>,
    current_size: u64,
}

impl RollingFile {
    fn new(path: &Path, max_bytes: u64, backups: usize) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut rolling = Self {
            path: path.to_path_buf(),
            max_bytes,
            backups,
            file: None,
            current_size: 0,
        };
        rolling.reopen()?;
        if rolling.current_size > rolling.max_bytes {
            rolling.rotate()?;
        }
        Ok(rolling)
    }

    fn reopen(&mut self) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.current_size = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }

        if self.backups == 0 {
            // No backups kept: start the file over.
            File::create(&self.path)?;
            return self.reopen();
        }

        let oldest = self.backup_path(self.backups);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for idx in (1..self.backups).rev() {
            let src = self.backup_path(idx);
            if src.exists() {
                fs::rename(&src, self.backup_path(idx + 1))?;
            }
        }
        if self.path.exists() {
            fs::rename(&self.path, self.backup_path(1))?;
        }

        self.reopen()
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.current_size > 0 && self.current_size + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))?;
        file.write_all(buf)?;
        self.current_size += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Cloneable handle to the rotating file; each formatted event is written
/// under the lock in one call, so lines never interleave.
#[derive(Clone)]
pub struct RotatingWriter {
    inner: Arc<Mutex<RollingFile>>,
}

impl RotatingWriter {
    /// Opens (or creates) the log file at `path`.
    pub fn open(path: &Path, max_bytes: u64, backups: usize) -> io::Result<Self> {
        Ok(Self {
            inner: Arc::new(Mutex::new(RollingFile::new(path, max_bytes, backups)?)),
        })
    }
}

/// Per-event writer handed out by [`RotatingWriter`].
pub struct RotatingWriterGuard {
    inner: Arc<Mutex<RollingFile>>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for RotatingWriter {
    type Writer = RotatingWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriterGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Write for RotatingWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        guard.flush()
    }
}
