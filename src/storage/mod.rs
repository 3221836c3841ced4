//! Alert storage
//!
//! [`AlertStore`] is the capability set every backing engine provides:
//! put, get, delete, prefix scan and full backup. [`RedbStore`] is the
//! durable engine; [`MemoryStore`] substitutes for it where a file is not
//! wanted.

pub mod backup;
pub mod engine;
pub mod memory;

pub use backup::{BackupMetadata, BackupSink, BufferedSink, BACKUP_FILENAME};
pub use engine::RedbStore;
pub use memory::MemoryStore;

use crate::alerts::Alert;

/// Name of the single namespace holding alert documents
pub const ALERTS_TABLE: &str = "alerts";

/// Storage operations over alert documents
///
/// Each call runs as one complete transaction against the backing engine.
/// Nothing is retried; a failed transaction is returned as-is.
pub trait AlertStore: Send + Sync {
    /// Fill write-time defaults and store the alert under its ID,
    /// overwriting any previous document.
    fn put_alert(&self, alert: Alert) -> Result<(), StoreError>;

    /// Raw stored document for an exact ID. A missing ID is `Ok(None)`.
    fn get_alert(&self, id: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Remove an ID. Removing a missing ID succeeds.
    fn delete_alert(&self, id: &str) -> Result<(), StoreError>;

    /// All alerts whose ID starts with `prefix`, in byte order of the ID,
    /// encoded as one JSON array.
    ///
    /// A stored value that fails to decode stops the scan. The alerts read
    /// before it are still returned, inside [`PartialScan`].
    fn alerts_by_prefix(&self, prefix: &str) -> Result<AlertBatch, PartialScan>;

    /// Stream a consistent snapshot of the whole store into `sink`.
    ///
    /// Errors go to [`BackupSink::fail`] because part of the body may
    /// already have been written.
    fn backup(&self, sink: &mut dyn BackupSink);
}

/// Result of a prefix scan
#[derive(Debug, Clone, PartialEq)]
pub struct AlertBatch {
    /// JSON array of the matched alerts
    pub data: Vec<u8>,
    /// Number of alerts in `data`
    pub count: usize,
}

impl AlertBatch {
    /// Encode collected alerts as one JSON array
    pub fn encode(alerts: &[Alert]) -> Result<Self, StoreError> {
        Ok(Self {
            data: serde_json::to_vec(alerts)?,
            count: alerts.len(),
        })
    }
}

/// A prefix scan that stopped early, with everything read before the failure
#[derive(Debug, thiserror::Error)]
#[error("prefix scan stopped after {} alerts: {source}", .batch.count)]
pub struct PartialScan {
    pub batch: AlertBatch,
    #[source]
    pub source: StoreError,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Cannot open database: {0}")]
    Open(#[from] redb::DatabaseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transaction failed: {0}")]
    Transaction(#[from] redb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

macro_rules! transaction_error {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for StoreError {
                fn from(err: $err) -> Self {
                    StoreError::Transaction(err.into())
                }
            }
        )*
    };
}

transaction_error!(
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// Fill defaults and encode an alert for writing
pub(crate) fn encode_alert(mut alert: Alert) -> Result<(String, Vec<u8>), StoreError> {
    alert.fill_defaults(chrono::Utc::now().fixed_offset());
    let data = serde_json::to_vec(&alert)?;
    Ok((alert.id, data))
}

/// Decode one stored document
pub(crate) fn decode_alert(bytes: &[u8]) -> Result<Alert, StoreError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Encode the alerts a scan collected, attaching the failure that stopped
/// it, if any.
pub(crate) fn finish_scan(
    alerts: Vec<Alert>,
    failure: Option<StoreError>,
) -> Result<AlertBatch, PartialScan> {
    match (AlertBatch::encode(&alerts), failure) {
        (Ok(batch), None) => Ok(batch),
        (Ok(batch), Some(source)) => Err(PartialScan { batch, source }),
        (Err(source), _) => Err(PartialScan {
            batch: AlertBatch {
                data: b"[]".to_vec(),
                count: 0,
            },
            source,
        }),
    }
}

/// Decode stored documents in order until one fails, then encode what was
/// collected. Nothing past the failing document is pulled from `values`.
pub(crate) fn collect_batch<I, B>(values: I) -> Result<AlertBatch, PartialScan>
where
    I: IntoIterator<Item = Result<B, StoreError>>,
    B: AsRef<[u8]>,
{
    let mut alerts = Vec::new();
    let mut failure = None;

    for value in values {
        match value.and_then(|bytes| decode_alert(bytes.as_ref())) {
            Ok(alert) => alerts.push(alert),
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    finish_scan(alerts, failure)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str) -> Result<Vec<u8>, StoreError> {
        Ok(format!(r#"{{"ID":"{}","Status":"Open"}}"#, id).into_bytes())
    }

    #[test]
    fn test_empty_batch_is_empty_array() {
        let batch = collect_batch(Vec::<Result<Vec<u8>, StoreError>>::new()).unwrap();
        assert_eq!(batch.data, b"[]");
        assert_eq!(batch.count, 0);
    }

    #[test]
    fn test_collect_keeps_order() {
        let batch = collect_batch(vec![doc("a1"), doc("a2")]).unwrap();
        let alerts: Vec<Alert> = serde_json::from_slice(&batch.data).unwrap();

        assert_eq!(batch.count, 2);
        assert_eq!(alerts[0].id, "a1");
        assert_eq!(alerts[1].id, "a2");
    }

    #[test]
    fn test_decode_failure_returns_partial() {
        let values = vec![doc("a1"), Ok(b"not json".to_vec()), doc("a3")];
        let err = collect_batch(values).unwrap_err();

        assert_eq!(err.batch.count, 1);
        assert!(matches!(err.source, StoreError::Serialization(_)));
        let alerts: Vec<Alert> = serde_json::from_slice(&err.batch.data).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "a1");
    }

    #[test]
    fn test_collect_stops_pulling_after_failure() {
        let mut pulled = 0;
        let values = [doc("a1"), Ok(b"{".to_vec()), doc("a3"), doc("a4")]
            .into_iter()
            .inspect(|_| pulled += 1);

        let err = collect_batch(values).unwrap_err();
        assert_eq!(err.batch.count, 1);
        assert_eq!(pulled, 2);
    }

    #[test]
    fn test_encode_fills_defaults() {
        let (key, data) = encode_alert(Alert::new("x1")).unwrap();
        let stored: Alert = serde_json::from_slice(&data).unwrap();

        assert_eq!(key, "x1");
        assert_eq!(stored.status, "Open");
        assert!(!stored.has_zero_time());
    }
}
