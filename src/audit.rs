//! Append-only audit log of `exchange` command usage.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::Result;

/// Timestamp format used in audit lines.
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H-%M-%S";

/// One audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    /// When the command ran.
    pub timestamp: DateTime<Local>,
    /// Display name of the invoking session.
    pub username: String,
    /// Lookback window after clamping.
    pub days_requested: u32,
}

impl AuditRecord {
    /// Create a record.
    pub fn new(
        username: impl Into<String>,
        days_requested: u32,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            timestamp,
            username: username.into(),
            days_requested,
        }
    }

    /// Format the record as a log line, without the trailing newline.
    pub fn format(&self) -> String {
        format!(
            "{} {} executed 'exchange' command for {} days.",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.username,
            self.days_requested
        )
    }
}

/// Writes audit records to a local append-only file.
///
/// Appends are serialized so concurrent callers never interleave partial lines.
pub struct AuditLogger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AuditLogger {
    /// Create a logger writing to `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Append a record for `username` requesting `days_requested` days.
    pub async fn append(
        &self,
        username: &str,
        days_requested: u32,
        timestamp: DateTime<Local>,
    ) -> Result<()> {
        self.write(&AuditRecord::new(username, days_requested, timestamp))
            .await
    }

    /// Append a record stamped with the current local time.
    pub async fn record_now(&self, username: &str, days_requested: u32) -> Result<()> {
        self.append(username, days_requested, Local::now()).await
    }

    /// Append a prepared record.
    pub async fn write(&self, record: &AuditRecord) -> Result<()> {
        let mut line = record.format();
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
    }

    #[test]
    fn test_record_format() {
        let record = AuditRecord::new("Alice Baker", 3, timestamp());
        assert_eq!(
            record.format(),
            "05-03-2024 14-07-09 Alice Baker executed 'exchange' command for 3 days."
        );
    }

    #[tokio::test]
    async fn test_append_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("exchange.log");
        let logger = AuditLogger::new(&path);

        logger.append("Alice Baker", 0, timestamp()).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "05-03-2024 14-07-09 Alice Baker executed 'exchange' command for 0 days.\n"
        );
    }

    #[tokio::test]
    async fn test_append_keeps_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exchange.log");
        std::fs::write(&path, "earlier line\n").unwrap();
        let logger = AuditLogger::new(&path);

        logger.append("Bob Clark", 10, timestamp()).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "earlier line");
        assert!(lines[1].ends_with("Bob Clark executed 'exchange' command for 10 days."));
    }

    #[tokio::test]
    async fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exchange.log");
        let logger = Arc::new(AuditLogger::new(&path));

        let mut handles = Vec::new();
        for i in 0..20 {
            let logger = Arc::clone(&logger);
            handles.push(tokio::spawn(async move {
                logger.record_now(&format!("User {i}"), i % 11).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 20);
        for line in lines {
            assert!(line.contains(" executed 'exchange' command for "));
            assert!(line.ends_with(" days."));
        }
    }
}
