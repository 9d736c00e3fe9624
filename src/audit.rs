use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};

use crate::error::Result;

/// One zero-grade write that the remote service accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeRecord {
    pub assignment_id: i64,
    pub user_id: i64,
    pub user_name: String,
}

/// Receives the audit trail of auto-grading runs.
pub trait AuditSink {
    fn run_started(&mut self, assignment_id: i64) -> Result<()>;
    fn graded(&mut self, record: &GradeRecord) -> Result<()>;
}

/// Appends audit lines to a plain text file, never truncating it.
#[derive(Debug, Clone)]
pub struct FileAuditLog {
    path: PathBuf,
}

impl FileAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        writeln!(file, "{now} {line}")?;
        Ok(())
    }
}

impl AuditSink for FileAuditLog {
    fn run_started(&mut self, assignment_id: i64) -> Result<()> {
        self.append(&format!("--auto-grading-- asn_id={assignment_id}"))
    }

    fn graded(&mut self, record: &GradeRecord) -> Result<()> {
        self.append(&format!(
            "asn_id={}, usr_id={}, user_name={:?}",
            record.assignment_id, record.user_id, record.user_name
        ))
    }
}

/// Keeps records in memory. Useful where no audit file is wanted.
#[derive(Debug, Default, Clone)]
pub struct MemoryAudit {
    pub runs: Vec<i64>,
    pub records: Vec<GradeRecord>,
}

impl AuditSink for MemoryAudit {
    fn run_started(&mut self, assignment_id: i64) -> Result<()> {
        self.runs.push(assignment_id);
        Ok(())
    }

    fn graded(&mut self, record: &GradeRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
