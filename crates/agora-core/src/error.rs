use thiserror::Error;

pub type PostResult<T> = Result<T, PostError>;
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("duplicate record")]
    Duplicate,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Everything the post service can fail with. Each kind has a stable code
/// (see [`PostError::code`]) for the transport layer to translate.
#[derive(Debug, Error)]
pub enum PostError {
    #[error("credential missing or malformed")]
    Unauthenticated,

    #[error("credential could not be verified")]
    InvalidCredential,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not allowed to modify this resource")]
    Forbidden,

    #[error("already reacted to this target")]
    DuplicateReaction,

    #[error("data integrity fault: {0}")]
    DataIntegrity(String),

    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl PostError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::DuplicateReaction => "DUPLICATE_REACTION",
            Self::DataIntegrity(_) => "DATA_INTEGRITY_FAULT",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Logs the fault before handing it back, so corrupted state never
    /// passes silently.
    pub fn integrity(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!(fault = %msg, "Data integrity fault");
        Self::DataIntegrity(msg)
    }
}

impl From<StoreError> for PostError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
