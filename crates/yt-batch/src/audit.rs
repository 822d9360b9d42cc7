//! Append-only audit trail of every attempted action.

use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;

use crate::action::ActionKind;
use crate::error::BatchError;

pub const DEFAULT_AUDIT_LOG: &str = "Logs.csv";
pub const AUDIT_HEADER: [&str; 5] = ["timestamp", "action", "target_id", "status", "note"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Success,
    Failed,
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuditStatus::Success => "success",
            AuditStatus::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub timestamp: String,
    pub action: ActionKind,
    pub target_id: String,
    pub status: AuditStatus,
    pub note: String,
}

impl AuditRecord {
    /// Record stamped with the current local time
    pub fn now(
        action: ActionKind,
        target_id: impl Into<String>,
        status: AuditStatus,
        note: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            action,
            target_id: target_id.into(),
            status,
            note: note.into(),
        }
    }

    fn as_row(&self) -> [String; 5] {
        [
            self.timestamp.clone(),
            self.action.to_string(),
            self.target_id.clone(),
            self.status.to_string(),
            self.note.clone(),
        ]
    }
}

/// Append-only record of every attempted item
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord) -> Result<(), BatchError>;
}

/// CSV file that only ever grows; the header is written once
#[derive(Debug)]
pub struct CsvAuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for CsvAuditLog {
    fn record(&self, record: &AuditRecord) -> Result<(), BatchError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| BatchError::write(parent, err))?;
        }
        let needs_header = std::fs::metadata(&self.path).map_or(true, |meta| meta.len() == 0);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| BatchError::write(&self.path, err))?;
        let mut writer = csv::Writer::from_writer(file);
        if needs_header {
            writer.write_record(AUDIT_HEADER)?;
        }
        writer.write_record(record.as_row())?;
        writer
            .flush()
            .map_err(|err| BatchError::write(&self.path, err))?;
        Ok(())
    }
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemoryAudit {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, record: &AuditRecord) -> Result<(), BatchError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }
}
