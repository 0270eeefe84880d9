use thiserror::Error;
use warbler_store::StoreError;
use warbler_types::{AccountId, PostId, TypeError};

#[derive(Debug, Error)]
pub enum SocialError {
    /// Caller input failed a precondition; nothing was written.
    #[error("validation error: {0}")]
    Validation(String),

    /// An account may not follow itself.
    #[error("account {0} cannot follow itself")]
    SelfFollow(AccountId),

    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("post not found: {0}")]
    PostNotFound(PostId),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A broken invariant inside this crate, not a caller mistake.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SocialError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AccountNotFound(_) | Self::PostNotFound(_))
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_constraint_violation())
    }
}

impl From<TypeError> for SocialError {
    fn from(err: TypeError) -> Self {
        Self::Validation(err.to_string())
    }
}

pub type SocialResult<T> = Result<T, SocialError>;
