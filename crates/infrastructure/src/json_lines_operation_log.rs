use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pokebot_application::OperationLogRepository;
use pokebot_core::{AppError, AppResult};
use pokebot_domain::OperationLogEntry;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

/// File name of the operation log inside the logs directory.
pub const OPERATION_LOG_FILE_NAME: &str = "server.log";

const TAIL_BLOCK_SIZE: u64 = 4096;

/// Operation log appending one JSON object per line to `server.log`.
#[derive(Debug)]
pub struct JsonLinesOperationLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesOperationLog {
    /// Creates a log writing to `<logs_directory>/server.log`.
    #[must_use]
    pub fn in_directory(logs_directory: impl AsRef<Path>) -> Self {
        Self {
            path: logs_directory.as_ref().join(OPERATION_LOG_FILE_NAME),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Creates the logs directory when missing.
    pub async fn ensure_directory(&self) -> AppResult<()> {
        let Some(directory) = self.path.parent() else {
            return Ok(());
        };
        tokio::fs::create_dir_all(directory).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to create logs directory '{}': {error}",
                directory.display()
            ))
        })
    }

    fn io_error(&self, action: &str, error: std::io::Error) -> AppError {
        AppError::Internal(format!(
            "failed to {action} operation log '{}': {error}",
            self.path.display()
        ))
    }
}

#[async_trait]
impl OperationLogRepository for JsonLinesOperationLog {
    async fn append_entry(&self, entry: &OperationLogEntry) -> AppResult<()> {
        let mut line = entry.to_json_line();
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|error| self.io_error("open", error))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|error| self.io_error("append to", error))
    }

    async fn tail_lines(&self, count: usize) -> AppResult<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(self.io_error("open", error)),
        };

        let size = file
            .metadata()
            .await
            .map_err(|error| self.io_error("inspect", error))?
            .len();

        // Read backwards until the buffer holds more than `count` complete
        // lines, so a partially read leading line can be discarded.
        let mut position = size;
        let mut buffer: Vec<u8> = Vec::new();
        while position > 0 && newline_count(&buffer) <= count {
            let step = TAIL_BLOCK_SIZE.min(position);
            position -= step;

            file.seek(SeekFrom::Start(position))
                .await
                .map_err(|error| self.io_error("seek", error))?;
            let mut chunk = vec![0_u8; usize::try_from(step).unwrap_or(0)];
            file.read_exact(&mut chunk)
                .await
                .map_err(|error| self.io_error("read", error))?;

            chunk.extend_from_slice(&buffer);
            buffer = chunk;
        }

        let text = String::from_utf8_lossy(&buffer);
        let lines: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .collect();
        let start = lines.len().saturating_sub(count);

        Ok(lines[start..].iter().map(|line| (*line).to_owned()).collect())
    }
}

fn newline_count(buffer: &[u8]) -> usize {
    buffer.iter().filter(|byte| **byte == b'\n').count()
}

#[cfg(test)]
mod tests {
    use pokebot_application::OperationLogRepository;
    use pokebot_domain::{OperationKind, OperationLogEntry};

    use super::{JsonLinesOperationLog, OPERATION_LOG_FILE_NAME};

    fn temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap_or_else(|_| panic!("test"))
    }

    #[tokio::test]
    async fn missing_log_tails_empty() {
        let root = temp_dir();
        let log = JsonLinesOperationLog::in_directory(root.path());

        assert!(log.tail_lines(5).await.unwrap_or_else(|_| panic!("test")).is_empty());
    }

    #[tokio::test]
    async fn tail_returns_most_recent_lines_in_order() {
        let root = temp_dir();
        let log = JsonLinesOperationLog::in_directory(root.path());

        for index in 0..12 {
            let entry =
                OperationLogEntry::new(OperationKind::PurchaseStore, true).with_field("seq", index);
            assert!(log.append_entry(&entry).await.is_ok());
        }

        let lines = log.tail_lines(5).await.unwrap_or_else(|_| panic!("test"));

        assert_eq!(lines.len(), 5);
        for (offset, line) in lines.iter().enumerate() {
            assert!(line.ends_with(&format!("\"seq\":{}}}", 7 + offset)), "{line}");
        }
        assert!(root.path().join(OPERATION_LOG_FILE_NAME).is_file());
    }

    #[tokio::test]
    async fn tail_spans_multiple_blocks() {
        let root = temp_dir();
        let log = JsonLinesOperationLog::in_directory(root.path());
        let padding = "x".repeat(900);

        for index in 0..20 {
            let entry = OperationLogEntry::new(OperationKind::Inbound, false)
                .with_field("seq", index)
                .with_field("padding", padding.as_str());
            assert!(log.append_entry(&entry).await.is_ok());
        }

        let lines = log.tail_lines(9).await.unwrap_or_else(|_| panic!("test"));

        assert_eq!(lines.len(), 9);
        assert!(lines[0].contains("\"seq\":11"));
        assert!(lines[8].contains("\"seq\":19"));
        assert!(lines.iter().all(|line| line.starts_with('{')));
    }

    #[tokio::test]
    async fn tail_larger_than_file_returns_everything() {
        let root = temp_dir();
        let log = JsonLinesOperationLog::in_directory(root.path());

        for _ in 0..3 {
            let entry = OperationLogEntry::new(OperationKind::DecisionStore, true);
            assert!(log.append_entry(&entry).await.is_ok());
        }

        assert_eq!(log.tail_lines(5000).await.unwrap_or_default().len(), 3);
    }

    #[tokio::test]
    async fn ensure_directory_creates_nested_logs_directory() {
        let root = temp_dir();
        let log = JsonLinesOperationLog::in_directory(root.path().join("var").join("logs"));

        assert!(log.ensure_directory().await.is_ok());
        let entry = OperationLogEntry::new(OperationKind::PurchaseStore, true);
        assert!(log.append_entry(&entry).await.is_ok());
        assert!(log.path().is_file());
    }
}
