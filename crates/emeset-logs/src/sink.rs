//! Log records and the destinations they are written to.

use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;

use crate::error::LogError;
use crate::level::Level;

/// One log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Context the entry belongs to (a controller, a command, a job).
    pub channel: String,
    /// Who triggered it: `cron`, `guest`, `user` or an admin nickname.
    pub user: String,
    pub level: Level,
    pub message: String,
    pub time: NaiveDateTime,
}

impl LogRecord {
    /// Builds a record stamped with the local time.
    pub fn now(
        channel: impl Into<String>,
        user: impl Into<String>,
        level: Level,
        message: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            user: user.into(),
            level,
            message: message.into(),
            time: chrono::Local::now().naive_local(),
        }
    }
}

/// A destination for log records.
///
/// Sinks are shared with `tracing` layers, hence `Send + Sync`.
pub trait LogSink: Send + Sync {
    fn write(&self, record: &LogRecord) -> Result<(), LogError>;
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn write(&self, record: &LogRecord) -> Result<(), LogError> {
        (**self).write(record)
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn write(&self, record: &LogRecord) -> Result<(), LogError> {
        (**self).write(record)
    }
}

/// Keeps records in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records written so far.
    pub fn records(&self) -> Vec<LogRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl LogSink for MemorySink {
    fn write(&self, record: &LogRecord) -> Result<(), LogError> {
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_clones_share_records() {
        let sink = MemorySink::new();
        let shared: Arc<dyn LogSink> = Arc::new(sink.clone());

        shared
            .write(&LogRecord::now("auth", "guest", Level::Notice, "login"))
            .unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].channel, "auth");
        assert_eq!(records[0].level, Level::Notice);
    }
}
