// file: src/report/miss_log.rs
// description: per-run csv log of paths that were not found
// reference: https://docs.rs/chrono

use crate::config::LogConfig;
use crate::error::{CheckerError, Result};
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

const MAX_NAME_ATTEMPTS: usize = 100;

/// Appends one `<message>;<path>` line per missing path to a log created
/// fresh for each run. Writes are buffered; everything is durable once
/// [`MissLogger::close`] returns. Safe to share between tasks.
pub struct MissLogger {
    path: PathBuf,
    message: String,
    writer: Mutex<Option<BufWriter<File>>>,
    entries: AtomicUsize,
}

impl MissLogger {
    pub fn create(config: &LogConfig) -> Result<Self> {
        Self::create_in(&config.resolve_directory(), config, Local::now())
    }

    pub fn create_in(directory: &Path, config: &LogConfig, now: DateTime<Local>) -> Result<Self> {
        fs::create_dir_all(directory).map_err(|source| CheckerError::LogCreate {
            path: directory.to_path_buf(),
            source,
        })?;

        let stem = format!("{} {}", config.file_prefix, timestamp(config, now)?);
        let (path, file) = open_fresh(directory, &stem)?;

        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", config.header).map_err(|source| CheckerError::LogCreate {
            path: path.clone(),
            source,
        })?;

        debug!("Created miss log {}", path.display());

        Ok(Self {
            path,
            message: config.message.clone(),
            writer: Mutex::new(Some(writer)),
            entries: AtomicUsize::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, missing_path: &str) -> Result<()> {
        let mut guard = self.writer.lock();
        let writer = guard.as_mut().ok_or_else(|| {
            CheckerError::LogWrite(std::io::Error::other("miss log is already closed"))
        })?;

        writeln!(writer, "{};{}", self.message, missing_path).map_err(CheckerError::LogWrite)?;
        self.entries.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn entries_written(&self) -> usize {
        self.entries.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.writer.lock().is_none()
    }

    /// Flushes and releases the file. Later calls are no-ops.
    pub fn close(&self) -> Result<()> {
        let Some(mut writer) = self.writer.lock().take() else {
            return Ok(());
        };

        writer.flush().map_err(CheckerError::LogWrite)?;
        writer.get_ref().sync_all().map_err(CheckerError::LogWrite)?;
        debug!(
            "Closed miss log {} ({} entries)",
            self.path.display(),
            self.entries_written()
        );
        Ok(())
    }

    /// Closes the log and deletes it when no entry was ever written.
    /// Returns whether the file was removed.
    pub fn discard_if_empty(&self) -> Result<bool> {
        self.close()?;
        if self.entries_written() > 0 {
            return Ok(false);
        }

        fs::remove_file(&self.path).map_err(CheckerError::LogWrite)?;
        debug!("Removed empty miss log {}", self.path.display());
        Ok(true)
    }
}

impl Drop for MissLogger {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.get_mut().take()
            && let Err(e) = writer.flush()
        {
            warn!("Failed to flush miss log {}: {}", self.path.display(), e);
        }
    }
}

fn timestamp(config: &LogConfig, now: DateTime<Local>) -> Result<String> {
    let mut stamp = String::new();
    write!(stamp, "{}", now.format(&config.timestamp_format)).map_err(|_| {
        CheckerError::Config(format!(
            "invalid log timestamp format '{}'",
            config.timestamp_format
        ))
    })?;

    Ok(stamp.replace(['/', '\\', ':'], "-"))
}

/// Opens `<stem>.csv`, or `<stem> (n).csv` when an earlier run in the same
/// second already took the name.
fn open_fresh(directory: &Path, stem: &str) -> Result<(PathBuf, File)> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = if attempt == 0 {
            format!("{}.csv", stem)
        } else {
            format!("{} ({}).csv", stem, attempt)
        };
        let path = directory.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(source) => return Err(CheckerError::LogCreate { path, source }),
        }
    }

    Err(CheckerError::LogCreate {
        path: directory.join(format!("{}.csv", stem)),
        source: std::io::Error::new(
            ErrorKind::AlreadyExists,
            "no free log file name for this timestamp",
        ),
    })
}
