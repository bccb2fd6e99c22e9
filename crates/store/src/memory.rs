use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::{Error, ObjectStore, StoredObject};

/// In-memory [`ObjectStore`] with per-key version counters as etags.
///
/// Backs the unit suites of every store-dependent crate, and doubles as a
/// scratch backend. Clones share the same underlying map, so a test can hold
/// one handle while the code under test holds another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    objects: Arc<Mutex<HashMap<String, Versioned>>>,
}

#[derive(Debug, Clone)]
struct Versioned {
    bytes: Vec<u8>,
    version: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = objects.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn get_sync(&self, key: &str) -> Result<StoredObject, Error> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        match objects.get(key) {
            Some(v) => Ok(StoredObject {
                bytes: v.bytes.clone(),
                etag: Some(v.version.to_string()),
            }),
            None => Err(Error::NotFound {
                key: key.to_string(),
            }),
        }
    }

    fn put_sync(&self, key: &str, bytes: Vec<u8>) -> Result<(), Error> {
        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        let entry = objects.entry(key.to_string()).or_insert(Versioned {
            bytes: Vec::new(),
            version: 0,
        });
        entry.bytes = bytes;
        entry.version += 1;
        Ok(())
    }

    fn put_if_match_sync(&self, key: &str, bytes: Vec<u8>, etag: &str) -> Result<(), Error> {
        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        match objects.get_mut(key) {
            None => Err(Error::NotFound {
                key: key.to_string(),
            }),
            Some(v) if v.version.to_string() != etag => Err(Error::PreconditionFailed {
                key: key.to_string(),
            }),
            Some(v) => {
                v.bytes = bytes;
                v.version += 1;
                Ok(())
            }
        }
    }
}

impl ObjectStore for MemoryStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<StoredObject, Error>> + Send {
        let result = self.get_sync(key);
        async move { result }
    }

    fn put(&self, key: &str, bytes: Vec<u8>) -> impl Future<Output = Result<(), Error>> + Send {
        let result = self.put_sync(key, bytes);
        async move { result }
    }

    fn put_if_match(
        &self,
        key: &str,
        bytes: Vec<u8>,
        etag: &str,
    ) -> impl Future<Output = Result<(), Error>> + Send {
        let result = self.put_if_match_sync(key, bytes, etag);
        async move { result }
    }
}
