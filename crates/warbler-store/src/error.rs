/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A primary-key, unique, not-null, check, or foreign-key constraint
    /// failed. The transaction that produced it was rolled back.
    #[error("constraint violation ({constraint}): {detail}")]
    ConstraintViolation {
        constraint: &'static str,
        detail: String,
    },

    /// An update addressed a row that does not exist.
    #[error("{table} row not found: {key}")]
    NotFound { table: &'static str, key: i64 },

    /// The store URI could not be understood.
    #[error("invalid store uri: {0}")]
    InvalidUri(String),

    /// Snapshot encoding or decoding failure.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// I/O error while reading or writing a snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A writer panicked while holding the table lock.
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub(crate) fn violation(constraint: &'static str, detail: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            constraint,
            detail: detail.into(),
        }
    }

    /// Name of the violated constraint, if this is a constraint violation.
    pub fn constraint(&self) -> Option<&'static str> {
        match self {
            Self::ConstraintViolation { constraint, .. } => Some(*constraint),
            _ => None,
        }
    }

    /// Returns `true` if this is a violation of the named constraint.
    pub fn is_violation_of(&self, name: &str) -> bool {
        self.constraint() == Some(name)
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
