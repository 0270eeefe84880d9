use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::{AccountId, PostId};

/// Upper bound on a post body, counted in characters.
pub const MAX_BODY_CHARS: usize = 140;

/// A persisted post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub account_id: AccountId,
}

/// A post row that has not been committed yet.
///
/// `body` is optional so that a missing body reaches the store and is
/// rejected there by the not-null constraint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub id: Option<PostId>,
    pub body: Option<String>,
    /// `None` means "now" at insert time.
    pub created_at: Option<DateTime<Utc>>,
    pub account_id: AccountId,
}

impl NewPost {
    pub fn new(account_id: AccountId, body: impl Into<String>) -> Self {
        Self {
            id: None,
            body: Some(body.into()),
            created_at: None,
            account_id,
        }
    }

    /// Pin the primary key instead of taking the next sequence value.
    pub fn with_id(mut self, id: PostId) -> Self {
        self.id = Some(id);
        self
    }

    /// Backdate (or postdate) the creation timestamp.
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Check a post body before it is handed to the store.
pub fn validate_body(body: &str) -> Result<(), TypeError> {
    if body.trim().is_empty() {
        return Err(TypeError::EmptyField { field: "body" });
    }
    let actual = body.chars().count();
    if actual > MAX_BODY_CHARS {
        return Err(TypeError::TooLong {
            field: "body",
            max: MAX_BODY_CHARS,
            actual,
        });
    }
    Ok(())
}
