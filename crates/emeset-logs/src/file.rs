//! Daily log files.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::LogError;
use crate::sink::{LogRecord, LogSink};

/// Directory under the project root that holds the log files.
pub const LOG_DIR: &str = "Log";

/// Appends records to `<dir>/dd-mm-YYYY.log`, one file per day.
///
/// Each line reads `[YYYY-mm-dd HH:MM:SS] LEVEL: [channel] (user) message`.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Sink writing to `<root>/Log`.
    pub fn in_project(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join(LOG_DIR))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that records of `date` go to.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.log", date.format("%d-%m-%Y")))
    }

    pub fn format(record: &LogRecord) -> String {
        format!(
            "[{}] {}: [{}] ({}) {}\n",
            record.time.format("%Y-%m-%d %H:%M:%S"),
            record.level.name(),
            record.channel,
            record.user,
            record.message
        )
    }
}

impl LogSink for FileSink {
    fn write(&self, record: &LogRecord) -> Result<(), LogError> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(record.time.date()))?;
        file.write_all(Self::format(record).as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use chrono::NaiveDateTime;

    fn record(message: &str) -> LogRecord {
        LogRecord {
            channel: "auth".into(),
            user: "guest".into(),
            level: Level::Warning,
            message: message.into(),
            time: NaiveDateTime::parse_from_str("2024-03-07 09:15:02", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
        }
    }

    #[test]
    fn test_format_line() {
        assert_eq!(
            FileSink::format(&record("bad password")),
            "[2024-03-07 09:15:02] WARNING: [auth] (guest) bad password\n"
        );
    }

    #[test]
    fn test_write_appends_to_daily_file() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::in_project(tmp.path());

        sink.write(&record("first")).unwrap();
        sink.write(&record("second")).unwrap();

        let path = tmp.path().join("Log").join("07-03-2024.log");
        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("(guest) first"));
        assert!(lines[1].ends_with("(guest) second"));
    }
}
