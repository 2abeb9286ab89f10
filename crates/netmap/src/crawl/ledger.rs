//! Append-only record of failed dispatches, one JSON object per line.

use crate::crawl::dispatch::DispatchRoute;
use crate::errors::{NetmapError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub timestamp: DateTime<Utc>,
    pub route: DispatchRoute,
    /// The `network:address` target that was sent.
    pub payload: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct FailureLedger {
    path: PathBuf,
}

impl FailureLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, route: DispatchRoute, payload: &str, error: &str) -> Result<()> {
        self.append(&FailureRecord {
            timestamp: Utc::now(),
            route,
            payload: payload.to_string(),
            error: error.to_string(),
        })
    }

    pub fn append(&self, record: &FailureRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Every record in the ledger, oldest first. A missing ledger is empty.
    pub fn read_all(&self) -> Result<Vec<FailureRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str::<FailureRecord>(line).map_err(NetmapError::from))
            .collect()
    }
}
