use std::future::Future;

mod error;
mod memory;
mod s3;

pub use error::Error;
pub use memory::MemoryStore;
pub use s3::{S3Config, S3Store};

/// One object read back from the store. The etag, when the backend provides
/// one, identifies the exact version that was read and can be handed to
/// [`ObjectStore::put_if_match`] for a conditional overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub etag: Option<String>,
}

/// Whole-object store seam shared by the pipeline components.
///
/// Implementations distinguish two failure modes callers branch on: a missing
/// key reads back as [`Error::NotFound`], and a conditional write against a
/// stale etag fails as [`Error::PreconditionFailed`]. Everything else is a
/// backend error surfaced as-is.
pub trait ObjectStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<StoredObject, Error>> + Send;

    fn put(&self, key: &str, bytes: Vec<u8>) -> impl Future<Output = Result<(), Error>> + Send;

    fn put_if_match(
        &self,
        key: &str,
        bytes: Vec<u8>,
        etag: &str,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}
