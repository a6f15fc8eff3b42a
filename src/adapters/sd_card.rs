//! SD card record store.
//!
//! Implements [`RecordStore`] as an append-only CSV file under the FAT
//! mount point.  The card is mounted once at boot (see `main.rs`); if
//! that fails the store reports itself unavailable for the whole run
//! and every append is refused without touching the filesystem.
//!
//! A missing or empty log file gets [`CSV_HEADER`] written first.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::alert_log::{CSV_HEADER, LOG_PATH, LogRecord};
use crate::app::ports::RecordStore;
use crate::error::StorageError;

/// Default VFS mount point of the card.
pub const MOUNT_POINT: &str = "/sdcard";

pub struct SdCardStore {
    file: PathBuf,
    available: bool,
    written: u32,
}

impl SdCardStore {
    /// `mounted` is the outcome of the boot-time mount.
    pub fn new(mount_point: &Path, mounted: bool) -> Self {
        let file = mount_point.join(LOG_PATH.trim_start_matches('/'));
        if mounted {
            info!("SD: log file {}", file.display());
        } else {
            warn!("SD: card not mounted, logging disabled");
        }
        Self {
            file,
            available: mounted,
            written: 0,
        }
    }

    /// Write the header if the file is missing or empty.
    pub fn ensure_header(&mut self) -> Result<(), StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        let empty = std::fs::metadata(&self.file).map_or(true, |m| m.len() == 0);
        if empty {
            self.write_line(CSV_HEADER)?;
            info!("SD: created {} with header", self.file.display());
        }
        Ok(())
    }

    pub fn records_written(&self) -> u32 {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    fn write_line(&self, line: &str) -> Result<(), StorageError> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file)
            .map_err(|e| {
                warn!("SD: open failed: {}", e);
                StorageError::WriteFailed
            })?;
        writeln!(f, "{}", line).map_err(|e| {
            warn!("SD: write failed: {}", e);
            StorageError::WriteFailed
        })
    }
}

impl RecordStore for SdCardStore {
    fn is_available(&self) -> bool {
        self.available
    }

    fn append(&mut self, record: &LogRecord) -> Result<(), StorageError> {
        self.ensure_header()?;
        self.write_line(&record.to_csv_row())?;
        self.written = self.written.saturating_add(1);
        Ok(())
    }
}
