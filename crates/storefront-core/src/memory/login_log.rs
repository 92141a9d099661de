use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::store::LoginLog;
use crate::{Error, ErrorKind, Result, TRACING_TARGET_MEMORY};

/// Default per-file size limit of 1 MiB.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;

/// Text file shares kept in process memory.
#[derive(Debug, Clone)]
pub struct MemoryLoginLog {
    shares: Arc<Mutex<HashMap<String, HashMap<String, String>>>>,
    max_file_bytes: u64,
}

impl Default for MemoryLoginLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLoginLog {
    /// Creates an empty log with the default file size limit.
    pub fn new() -> Self {
        Self::with_max_file_bytes(DEFAULT_MAX_FILE_BYTES)
    }

    /// Creates an empty log whose files may not grow past `max_file_bytes`.
    pub fn with_max_file_bytes(max_file_bytes: u64) -> Self {
        Self {
            shares: Arc::default(),
            max_file_bytes,
        }
    }

    fn check_size(&self, file: &str, size: usize) -> Result<()> {
        if size as u64 > self.max_file_bytes {
            return Err(Error::new(ErrorKind::LimitExceeded).with_message(format!(
                "file '{file}' would exceed {} bytes",
                self.max_file_bytes
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LoginLog for MemoryLoginLog {
    async fn append(&self, share: &str, file: &str, line: &str) -> Result<()> {
        let mut shares = self.shares.lock().await;
        let content = shares
            .entry(share.to_owned())
            .or_default()
            .entry(file.to_owned())
            .or_default();

        self.check_size(file, content.len() + line.len())?;
        content.push_str(line);

        tracing::trace!(
            target: TRACING_TARGET_MEMORY,
            share = %share,
            file = %file,
            size = content.len(),
            "Appended to file"
        );
        Ok(())
    }

    async fn write(&self, share: &str, file: &str, content: &str) -> Result<()> {
        self.check_size(file, content.len())?;
        self.shares
            .lock()
            .await
            .entry(share.to_owned())
            .or_default()
            .insert(file.to_owned(), content.to_owned());
        Ok(())
    }

    async fn read(&self, share: &str, file: &str) -> Result<Option<String>> {
        Ok(self
            .shares
            .lock()
            .await
            .get(share)
            .and_then(|files| files.get(file))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_creates_and_extends() -> anyhow::Result<()> {
        let log = MemoryLoginLog::new();
        log.append("logreport", "report.txt", "a\n").await?;
        log.append("logreport", "report.txt", "b\n").await?;

        assert_eq!(
            log.read("logreport", "report.txt").await?.as_deref(),
            Some("a\nb\n")
        );
        Ok(())
    }

    #[tokio::test]
    async fn append_past_limit_fails_and_keeps_content() -> anyhow::Result<()> {
        let log = MemoryLoginLog::with_max_file_bytes(4);
        log.append("s", "f", "abc").await?;

        let error = log.append("s", "f", "de").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::LimitExceeded);
        assert_eq!(log.read("s", "f").await?.as_deref(), Some("abc"));
        Ok(())
    }

    #[tokio::test]
    async fn write_replaces() -> anyhow::Result<()> {
        let log = MemoryLoginLog::new();
        log.write("s", "f", "one").await?;
        log.write("s", "f", "two").await?;

        assert_eq!(log.read("s", "f").await?.as_deref(), Some("two"));
        assert!(log.read("s", "missing").await?.is_none());
        Ok(())
    }
}
