//! In-memory alert store

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;

use super::backup::{BackupMetadata, BackupSink};
use super::{collect_batch, encode_alert, AlertBatch, AlertStore, PartialScan, StoreError};
use crate::alerts::Alert;

/// Alert store held in an ordered map
///
/// Writers take the lock exclusively, so readers always see whole
/// documents. Nothing survives the process. Backups are the JSON array of
/// every stored alert rather than a database file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    alerts: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.alerts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.read().is_empty()
    }
}

impl AlertStore for MemoryStore {
    fn put_alert(&self, alert: Alert) -> Result<(), StoreError> {
        let (key, data) = encode_alert(alert)?;
        self.alerts.write().insert(key, data);
        Ok(())
    }

    fn get_alert(&self, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.alerts.read().get(id).cloned())
    }

    fn delete_alert(&self, id: &str) -> Result<(), StoreError> {
        self.alerts.write().remove(id);
        Ok(())
    }

    fn alerts_by_prefix(&self, prefix: &str) -> Result<AlertBatch, PartialScan> {
        let alerts = self.alerts.read();
        let values = alerts
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, value)| Ok::<_, StoreError>(value.as_slice()));
        collect_batch(values)
    }

    fn backup(&self, sink: &mut dyn BackupSink) {
        let batch = match self.alerts_by_prefix("") {
            Ok(batch) => batch,
            Err(partial) => return sink.fail(partial.source),
        };

        sink.begin(&BackupMetadata::new(batch.data.len() as u64));
        if let Err(e) = sink.write_all(&batch.data).and_then(|_| sink.flush()) {
            sink.fail(e.into());
        }
    }
}
