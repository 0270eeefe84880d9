use thiserror::Error;
use warbler_store::StoreError;
use warbler_types::AccountId;

#[derive(Debug, Error)]
pub enum CredentialError {
    /// Caller input failed a precondition; nothing was written.
    #[error("validation error: {0}")]
    Validation(String),

    /// The supplied secret did not verify.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    /// The hashing backend failed or a stored hash is malformed.
    #[error("secret hashing failed: {0}")]
    Hash(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CredentialError {
    /// Returns `true` if a store constraint rejected the write.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_constraint_violation())
    }
}

pub type CredentialResult<T> = Result<T, CredentialError>;
