//! Directed relationship records.
//!
//! An edge has no identity beyond its endpoint pair: it is either present or
//! absent, never duplicated.

use serde::{Deserialize, Serialize};

use crate::identity::{AccountId, PostId};

/// `follower` follows `followed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FollowEdge {
    pub follower: AccountId,
    pub followed: AccountId,
}

impl FollowEdge {
    pub fn new(follower: AccountId, followed: AccountId) -> Self {
        Self { follower, followed }
    }

    /// The same pair pointing the other way.
    pub fn reversed(self) -> Self {
        Self {
            follower: self.followed,
            followed: self.follower,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.follower == self.followed
    }
}

/// `account` likes `post`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LikeEdge {
    pub account: AccountId,
    pub post: PostId,
}

impl LikeEdge {
    pub fn new(account: AccountId, post: PostId) -> Self {
        Self { account, post }
    }
}
