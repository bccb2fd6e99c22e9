use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed engine report: {reason}")]
    MalformedReport { reason: String },

    #[error("engine exited with {status}: {stderr}")]
    EngineFailed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn is_malformed_report(&self) -> bool {
        matches!(self, Error::MalformedReport { .. })
    }
}
