//! Shared logging setup for the SOAR console binaries.
//!
//! Everything goes to `<logs>/<app>.log`, rolled by size into numbered
//! generations (`<app>.log.1` is the newest). Stderr gets the same events
//! unless the TUI owns the terminal.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use soar_protocol::paths::default_logs_dir as logs_dir;

const DEFAULT_LOG_FILTER: &str = "soar_console=info,soar_api=info";
const KEPT_GENERATIONS: usize = 4;
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// Keep stderr quiet so the alternate screen is not corrupted
    pub tui_mode: bool,
}

/// Install the file and stderr layers. Fails if a subscriber is already set.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = ensure_logs_dir().context("Failed to ensure log directory")?;
    let log = SizeRolledLog::open(log_dir, config.app_name, KEPT_GENERATIONS, MAX_LOG_BYTES)
        .with_context(|| format!("Failed to open log file for {}", config.app_name))?;

    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let stderr_filter = stderr_filter(&config, &file_filter);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(log))
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_filter(stderr_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

fn stderr_filter(config: &LogConfig<'_>, file_filter: &EnvFilter) -> EnvFilter {
    if config.tui_mode && !config.verbose {
        EnvFilter::new("warn")
    } else {
        EnvFilter::new(file_filter.to_string())
    }
}

pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

/// Append-only log file that starts a new generation once `max_bytes` would
/// be exceeded. At most `kept` old generations survive.
struct SizeRolledLog {
    dir: PathBuf,
    name: String,
    kept: usize,
    max_bytes: u64,
    file: File,
    written: u64,
}

impl SizeRolledLog {
    fn open(dir: PathBuf, name: &str, kept: usize, max_bytes: u64) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        let name = name.replace(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '-'), "_");
        let (file, written) = open_append(&dir.join(format!("{name}.log")))?;
        let mut log = Self {
            dir,
            name,
            kept,
            max_bytes,
            file,
            written,
        };
        if log.written > log.max_bytes {
            log.roll()?;
        }
        Ok(log)
    }

    /// Generation 0 is the live file.
    fn generation(&self, n: usize) -> PathBuf {
        match n {
            0 => self.dir.join(format!("{}.log", self.name)),
            n => self.dir.join(format!("{}.log.{}", self.name, n)),
        }
    }

    fn roll(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.kept == 0 {
            fs::remove_file(self.generation(0))?;
        } else {
            let oldest = self.generation(self.kept);
            if oldest.exists() {
                fs::remove_file(oldest)?;
            }
            for n in (0..self.kept).rev() {
                let from = self.generation(n);
                if from.exists() {
                    fs::rename(from, self.generation(n + 1))?;
                }
            }
        }
        let (file, written) = open_append(&self.generation(0))?;
        self.file = file;
        self.written = written;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<(File, u64)> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let len = file.metadata()?.len();
    Ok((file, len))
}

impl Write for SizeRolledLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.roll()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
