mod client;
mod error;
mod poll;
mod table;

pub use client::{LedgerClient, Snapshot};
pub use error::Error;
pub use poll::{DEFAULT_POLL_INTERVAL, Poller, Sleeper, TokioSleeper};
pub use table::{JobRecord, STATUS_HEADER, StatusTable};
