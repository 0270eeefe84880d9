use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use warbler_types::{Account, AccountId, FollowEdge, LikeEdge, Post, PostId};

use crate::constraints::{ACCOUNTS_PKEY, FOLLOW_EDGES_PKEY, LIKE_EDGES_PKEY, POSTS_PKEY};
use crate::error::{StoreError, StoreResult};
use crate::traits::ReadView;

/// The full table set of an in-process store.
///
/// A transaction works on a private clone of this value and swaps it in on
/// commit, so readers never observe a half-applied change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tables {
    pub(crate) accounts: BTreeMap<AccountId, Account>,
    pub(crate) posts: BTreeMap<PostId, Post>,
    pub(crate) follows: BTreeSet<FollowEdge>,
    pub(crate) likes: BTreeSet<LikeEdge>,
}

/// On-disk form of [`Tables`]: plain row lists.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    #[serde(default)]
    accounts: Vec<Account>,
    #[serde(default)]
    posts: Vec<Post>,
    #[serde(default)]
    follows: Vec<FollowEdge>,
    #[serde(default)]
    likes: Vec<LikeEdge>,
}

impl Tables {
    /// Next free account key: one past the largest key in use.
    ///
    /// Fails with an `accounts_pkey` violation once the largest key is
    /// `i64::MAX`; an explicit key can still be supplied.
    pub(crate) fn next_account_id(&self) -> StoreResult<AccountId> {
        let last = self.accounts.keys().next_back().map_or(0, |id| id.0);
        last.checked_add(1).map(AccountId).ok_or_else(|| {
            StoreError::violation(ACCOUNTS_PKEY, "account key sequence exhausted")
        })
    }

    /// Next free post key: one past the largest key in use.
    pub(crate) fn next_post_id(&self) -> StoreResult<PostId> {
        let last = self.posts.keys().next_back().map_or(0, |id| id.0);
        last.checked_add(1)
            .map(PostId)
            .ok_or_else(|| StoreError::violation(POSTS_PKEY, "post key sequence exhausted"))
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    pub fn follow_count(&self) -> usize {
        self.follows.len()
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub(crate) fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            accounts: self.accounts.values().cloned().collect(),
            posts: self.posts.values().cloned().collect(),
            follows: self.follows.iter().copied().collect(),
            likes: self.likes.iter().copied().collect(),
        }
    }

    /// Rebuild tables from a snapshot. A repeated key or edge is a
    /// primary-key violation; no row is dropped silently.
    pub(crate) fn from_snapshot(snapshot: Snapshot) -> StoreResult<Self> {
        let mut tables = Self::default();
        for account in snapshot.accounts {
            let id = account.id;
            if tables.accounts.insert(id, account).is_some() {
                return Err(StoreError::violation(
                    ACCOUNTS_PKEY,
                    format!("snapshot holds account {id} twice"),
                ));
            }
        }
        for post in snapshot.posts {
            let id = post.id;
            if tables.posts.insert(id, post).is_some() {
                return Err(StoreError::violation(
                    POSTS_PKEY,
                    format!("snapshot holds post {id} twice"),
                ));
            }
        }
        for edge in snapshot.follows {
            if !tables.follows.insert(edge) {
                return Err(StoreError::violation(
                    FOLLOW_EDGES_PKEY,
                    format!("snapshot holds {} -> {} twice", edge.follower, edge.followed),
                ));
            }
        }
        for edge in snapshot.likes {
            if !tables.likes.insert(edge) {
                return Err(StoreError::violation(
                    LIKE_EDGES_PKEY,
                    format!("snapshot holds like {} -> {} twice", edge.account, edge.post),
                ));
            }
        }
        Ok(tables)
    }
}

impl ReadView for Tables {
    fn account(&self, id: AccountId) -> Option<Account> {
        self.accounts.get(&id).cloned()
    }

    fn account_by_handle(&self, handle: &str) -> Option<Account> {
        self.accounts.values().find(|a| a.handle == handle).cloned()
    }

    fn accounts(&self) -> Vec<Account> {
        self.accounts.values().cloned().collect()
    }

    fn post(&self, id: PostId) -> Option<Post> {
        self.posts.get(&id).cloned()
    }

    fn posts_by(&self, account: AccountId) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .values()
            .filter(|p| p.account_id == account)
            .cloned()
            .collect();
        posts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        posts
    }

    fn has_follow(&self, edge: FollowEdge) -> bool {
        self.follows.contains(&edge)
    }

    fn following_ids(&self, account: AccountId) -> Vec<AccountId> {
        self.follows
            .range(FollowEdge::new(account, AccountId(i64::MIN))..=FollowEdge::new(account, AccountId(i64::MAX)))
            .map(|e| e.followed)
            .collect()
    }

    fn follower_ids(&self, account: AccountId) -> Vec<AccountId> {
        self.follows
            .iter()
            .filter(|e| e.followed == account)
            .map(|e| e.follower)
            .collect()
    }

    fn has_like(&self, edge: LikeEdge) -> bool {
        self.likes.contains(&edge)
    }

    fn liked_post_ids(&self, account: AccountId) -> Vec<PostId> {
        self.likes
            .range(LikeEdge::new(account, PostId(i64::MIN))..=LikeEdge::new(account, PostId(i64::MAX)))
            .map(|e| e.post)
            .collect()
    }

    fn liker_ids(&self, post: PostId) -> Vec<AccountId> {
        self.likes
            .iter()
            .filter(|e| e.post == post)
            .map(|e| e.account)
            .collect()
    }
}
