use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no ledger row for {filename}")]
    KeyMissing { filename: String },

    #[error("malformed status table at line {line}: {reason}")]
    MalformedTable { line: usize, reason: String },

    #[error("ledger save conflict on {key}: gave up after {attempts} attempts")]
    SaveConflict { key: String, attempts: usize },

    #[error("timed out after {waited:?} with {pending} files still unprocessed")]
    PollTimeout { waited: Duration, pending: usize },

    #[error(transparent)]
    Store(#[from] courier_store::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_key_missing(&self) -> bool {
        matches!(self, Error::KeyMissing { .. })
    }

    pub fn is_poll_timeout(&self) -> bool {
        matches!(self, Error::PollTimeout { .. })
    }
}
