use courier_store::{ObjectStore, StoredObject};

use crate::error::Error;
use crate::table::StatusTable;

/// How often a conflicting save is retried with a fresh snapshot before
/// giving up. Conflicts need two writers racing on the same table, so one
/// reload almost always settles it.
const SAVE_ATTEMPTS: usize = 3;

/// One consistent read of the status table. The etag pins the version that
/// was read; saving the snapshot back writes conditionally against it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub table: StatusTable,
    pub etag: Option<String>,
}

/// Whole-table access to the shared status ledger stored at a fixed key.
#[derive(Debug, Clone)]
pub struct LedgerClient<S> {
    store: S,
    key: String,
}

impl<S: ObjectStore> LedgerClient<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the whole table. A store without the status object yet is a
    /// fresh deployment, not an error: it loads as an empty table with no
    /// etag, and the first save creates the object.
    pub async fn load(&self) -> Result<Snapshot, Error> {
        match self.store.get(&self.key).await {
            Ok(StoredObject { bytes, etag }) => {
                let text = String::from_utf8(bytes).map_err(|_| Error::MalformedTable {
                    line: 0,
                    reason: "status table is not utf-8".to_string(),
                })?;
                Ok(Snapshot {
                    table: StatusTable::from_csv(&text)?,
                    etag,
                })
            }
            Err(err) if err.is_not_found() => Ok(Snapshot {
                table: StatusTable::new(),
                etag: None,
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes the whole table back. With an etag the write is conditional and
    /// a concurrent writer surfaces as a precondition failure instead of
    /// being silently overwritten; without one (first save) it is a plain
    /// last-writer-wins put.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), Error> {
        let bytes = snapshot.table.to_csv().into_bytes();
        match &snapshot.etag {
            Some(etag) => self.store.put_if_match(&self.key, bytes, etag).await?,
            None => self.store.put(&self.key, bytes).await?,
        }
        Ok(())
    }

    /// Read-modify-write with conflict retries.
    ///
    /// Loads a fresh snapshot, applies `mutate`, and saves conditionally. A
    /// save conflict reloads and reapplies, so `mutate` must be idempotent
    /// against an already-mutated table (`insert` and `mark_processed` both
    /// are). Errors from `mutate` itself propagate immediately without
    /// another attempt.
    pub async fn update<M>(&self, mutate: M) -> Result<StatusTable, Error>
    where
        M: Fn(&mut StatusTable) -> Result<(), Error>,
    {
        for attempt in 1..=SAVE_ATTEMPTS {
            let mut snapshot = self.load().await?;
            mutate(&mut snapshot.table)?;
            match self.save(&snapshot).await {
                Ok(()) => return Ok(snapshot.table),
                Err(Error::Store(err)) if err.is_precondition_failed() => {
                    tracing::warn!(
                        key = %self.key,
                        attempt,
                        "status table changed under us, retrying with a fresh snapshot"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Err(Error::SaveConflict {
            key: self.key.clone(),
            attempts: SAVE_ATTEMPTS,
        })
    }
}
