//! Backup output channel

use std::io::{self, Write};

use super::StoreError;

/// File name offered to clients downloading a backup
pub const BACKUP_FILENAME: &str = "alertboard.db";

/// Response metadata announced before any backup bytes are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupMetadata {
    pub content_type: &'static str,
    pub content_disposition: String,
    /// Exact number of bytes that follow
    pub content_length: u64,
}

impl BackupMetadata {
    pub fn new(content_length: u64) -> Self {
        Self {
            content_type: "application/octet-stream",
            content_disposition: format!("attachment; filename=\"{}\"", BACKUP_FILENAME),
            content_length,
        }
    }
}

/// Destination of a backup stream
///
/// `begin` is called once, before the first write. `fail` may be called
/// at any point, including after some bytes were written.
pub trait BackupSink: Write + Send {
    fn begin(&mut self, meta: &BackupMetadata);

    fn fail(&mut self, err: StoreError);
}

/// Sink that keeps the whole backup in memory
#[derive(Debug, Default)]
pub struct BufferedSink {
    pub metadata: Option<BackupMetadata>,
    pub body: Vec<u8>,
    pub error: Option<StoreError>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The backup bytes, or the reported failure
    pub fn into_result(self) -> Result<(BackupMetadata, Vec<u8>), StoreError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let meta = self
            .metadata
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "backup never started"))?;
        Ok((meta, self.body))
    }
}

impl Write for BufferedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl BackupSink for BufferedSink {
    fn begin(&mut self, meta: &BackupMetadata) {
        self.metadata = Some(meta.clone());
    }

    fn fail(&mut self, err: StoreError) {
        self.error = Some(err);
    }
}
