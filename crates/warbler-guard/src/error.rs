use thiserror::Error;
use warbler_credentials::CredentialError;
use warbler_social::SocialError;
use warbler_store::StoreError;

/// Outcomes a guarded operation can end in besides success.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The session may not perform the operation. Nothing was changed.
    #[error("Access unauthorized.")]
    Unauthorized,

    /// The addressed account or post does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller input failed a precondition.
    #[error("validation error: {0}")]
    Validation(String),

    /// The store rejected the write.
    #[error("constraint violation ({constraint}): {detail}")]
    ConstraintViolation {
        constraint: &'static str,
        detail: String,
    },

    /// Wrong handle or secret.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("internal error: {0}")]
    Internal(String),
}

impl GuardError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Name of the violated store constraint, if any.
    pub fn constraint(&self) -> Option<&'static str> {
        match self {
            Self::ConstraintViolation { constraint, .. } => Some(*constraint),
            _ => None,
        }
    }
}

impl From<StoreError> for GuardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConstraintViolation { constraint, detail } => {
                Self::ConstraintViolation { constraint, detail }
            }
            StoreError::NotFound { table, key } => Self::NotFound(format!("{table} {key}")),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<SocialError> for GuardError {
    fn from(err: SocialError) -> Self {
        match err {
            SocialError::Validation(msg) => Self::Validation(msg),
            e @ SocialError::SelfFollow(_) => Self::Validation(e.to_string()),
            SocialError::AccountNotFound(id) => Self::NotFound(format!("account {id}")),
            SocialError::PostNotFound(id) => Self::NotFound(format!("post {id}")),
            SocialError::Store(e) => e.into(),
            SocialError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<CredentialError> for GuardError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Validation(msg) => Self::Validation(msg),
            CredentialError::InvalidCredentials => Self::InvalidCredentials,
            CredentialError::AccountNotFound(id) => Self::NotFound(format!("account {id}")),
            CredentialError::Store(e) => e.into(),
            e @ (CredentialError::Hash(_) | CredentialError::Internal(_)) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

pub type GuardResult<T> = Result<T, GuardError>;
