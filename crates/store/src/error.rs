use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("precondition failed writing {key}: object changed since it was read")]
    PreconditionFailed { key: String },

    #[error("store error: {code}: {message}")]
    Service { code: String, message: String },

    #[error("failed reading object body: {0}")]
    Body(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, Error::PreconditionFailed { .. })
    }
}
