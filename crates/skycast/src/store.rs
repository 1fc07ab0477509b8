//! CSV-backed rolling history store.
//!
//! The whole file is read at the start of a cycle and rewritten after every
//! append. Rewrites go through a sibling temp file and a rename, so the
//! history on disk is always either the previous or the new version.

use std::path::{Path, PathBuf};

use crate::reading::{History, Reading};

/// Errors from history persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Single-writer rolling history on disk.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    retention: usize,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, retention: usize) -> Self {
        Self {
            path: path.into(),
            retention,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Whether a history file has been written yet.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load every stored reading, oldest first.
    ///
    /// A missing file is the normal "no history yet" state and yields an
    /// empty vector. Rows that do not decode are skipped with a warning. A
    /// file where no row decodes is an error, so the next append cannot
    /// overwrite it.
    pub fn load_all(&self) -> Result<Vec<Reading>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| self.csv_error(e))?;

        let mut readings = Vec::new();
        let mut first_error = None;
        let mut skipped = 0usize;
        for row in reader.deserialize::<Reading>() {
            match row {
                Ok(reading) => readings.push(reading),
                Err(e) if e.is_io_error() => return Err(self.csv_error(e)),
                Err(e) => {
                    log::warn!("Skipping history row in {}: {}", self.path.display(), e);
                    skipped += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if readings.is_empty() => Err(self.csv_error(e)),
            _ => {
                if skipped > 0 {
                    log::warn!(
                        "Skipped {} unreadable rows in {}",
                        skipped,
                        self.path.display()
                    );
                }
                Ok(readings)
            }
        }
    }

    /// Load the history capped at the retention window.
    pub fn load_history(&self) -> Result<History> {
        Ok(History::from_readings(self.load_all()?, self.retention))
    }

    /// Append one reading, truncate to the retention window, rewrite the file.
    ///
    /// Returns the number of readings stored afterwards.
    pub fn append(&self, reading: Reading) -> Result<usize> {
        let mut history = self.load_history()?;
        history.push(reading);
        self.write_all(history.iter())?;
        Ok(history.len())
    }

    /// Replace the file contents with `readings`.
    pub fn write_all<'a>(&self, readings: impl IntoIterator<Item = &'a Reading>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.tmp_path();
        {
            let mut writer = csv::Writer::from_path(&tmp_path).map_err(|e| self.csv_error(e))?;
            for reading in readings {
                writer.serialize(reading).map_err(|e| self.csv_error(e))?;
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        log::debug!("History rewritten at {}", self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn csv_error(&self, source: csv::Error) -> StoreError {
        StoreError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}
