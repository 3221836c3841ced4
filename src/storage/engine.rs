//! redb-backed alert store
//!
//! One database file, one `alerts` table keyed by alert ID. redb gives a
//! single writer at a time and MVCC readers, so every operation here is a
//! plain transaction with no extra locking.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use redb::{Database, ReadTransaction, ReadableTable, TableDefinition};

use super::backup::{BackupMetadata, BackupSink, BACKUP_FILENAME};
use super::{
    decode_alert, encode_alert, finish_scan, AlertBatch, AlertStore, PartialScan, StoreError,
    ALERTS_TABLE,
};
use crate::alerts::Alert;

const ALERTS: TableDefinition<&str, &[u8]> = TableDefinition::new(ALERTS_TABLE);

/// Durable alert store over a redb database file
pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl RedbStore {
    /// Open or create the database at `path` and make sure the alerts
    /// table exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path)?;

        let txn = db.begin_write()?;
        txn.open_table(ALERTS)?;
        txn.commit()?;

        tracing::info!("Opened alert database at {}", path.display());
        Ok(Self { db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the database file. The store cannot be used afterwards.
    pub fn close(self) {
        let Self { db, path } = self;
        drop(db);
        tracing::info!("Closed alert database at {}", path.display());
    }

    /// Copy the alerts table, as seen by `txn`, into a fresh database file
    /// and stream that file into the sink.
    fn snapshot_from(
        &self,
        txn: &ReadTransaction,
        sink: &mut dyn BackupSink,
    ) -> Result<(), StoreError> {
        let table = txn.open_table(ALERTS)?;

        let dir = tempfile::TempDir::new()?;
        let snapshot_path = dir.path().join(BACKUP_FILENAME);
        {
            let snapshot = Database::create(&snapshot_path)?;
            let out = snapshot.begin_write()?;
            {
                let mut copy = out.open_table(ALERTS)?;
                for entry in table.iter()? {
                    let (key, value) = entry?;
                    copy.insert(key.value(), value.value())?;
                }
            }
            out.commit()?;
        }

        let mut file = File::open(&snapshot_path)?;
        let len = file.metadata()?.len();

        sink.begin(&BackupMetadata::new(len));
        io::copy(&mut file, sink)?;
        sink.flush()?;
        Ok(())
    }

    /// Walk the keys starting at `prefix`, decoding each matching document
    /// until a key no longer matches or a document fails to decode.
    fn scan_prefix(&self, prefix: &str, alerts: &mut Vec<Alert>) -> Result<(), StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ALERTS)?;

        for entry in table.range::<&str>(prefix..)? {
            let (key, value) = entry?;
            if !key.value().starts_with(prefix) {
                break;
            }
            alerts.push(decode_alert(value.value())?);
        }
        Ok(())
    }
}

impl AlertStore for RedbStore {
    fn put_alert(&self, alert: Alert) -> Result<(), StoreError> {
        let (key, data) = encode_alert(alert)?;

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ALERTS)?;
            table.insert(key.as_str(), data.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn get_alert(&self, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ALERTS)?;
        let value = table.get(id)?.map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn delete_alert(&self, id: &str) -> Result<(), StoreError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ALERTS)?;
            table.remove(id)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn alerts_by_prefix(&self, prefix: &str) -> Result<AlertBatch, PartialScan> {
        let mut alerts = Vec::new();
        let failure = self.scan_prefix(prefix, &mut alerts).err();
        finish_scan(alerts, failure)
    }

    fn backup(&self, sink: &mut dyn BackupSink) {
        let result = self
            .db
            .begin_read()
            .map_err(StoreError::from)
            .and_then(|txn| self.snapshot_from(&txn, sink));
        if let Err(e) = result {
            sink.fail(e);
        }
    }
}
