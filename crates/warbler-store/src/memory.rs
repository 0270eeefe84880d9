//! In-memory store for tests, local demos, and the command-line tool.
//!
//! [`InMemoryStore`] keeps all tables behind a `RwLock`. A write transaction
//! holds the write lock for its whole lifetime and stages its changes on a
//! private copy of the tables, so concurrent writers are serialized and a
//! failed commit has no effect. When opened on a file, every successful
//! commit also rewrites a JSON snapshot of the tables.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockWriteGuard};

use chrono::Utc;
use tracing::debug;
use warbler_types::{
    Account, AccountId, FollowEdge, LikeEdge, NewAccount, NewPost, Post, PostId,
};

use crate::constraints::{self, *};
use crate::error::{StoreError, StoreResult};
use crate::tables::{Snapshot, Tables};
use crate::traits::{ReadView, Store, Transaction};

/// Row counts per table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub accounts: usize,
    pub posts: usize,
    pub follows: usize,
    pub likes: usize,
}

/// An in-memory implementation of [`Store`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    snapshot: Option<PathBuf>,
}

impl InMemoryStore {
    /// Create a new empty, ephemeral store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store from a URI.
    ///
    /// - `memory:` (or an empty string) opens an ephemeral store.
    /// - `file:<path>`, `file://<path>`, or a bare path opens a store backed
    ///   by a JSON snapshot at that path, loading it if it exists.
    ///
    /// Network database URIs (`postgres://...`) are not served by this
    /// backend and are rejected.
    pub fn open(uri: &str) -> StoreResult<Self> {
        let uri = uri.trim();
        if uri.is_empty() || uri == "memory:" {
            return Ok(Self::new());
        }
        let path = if let Some(rest) = uri.strip_prefix("file://") {
            rest
        } else if let Some(rest) = uri.strip_prefix("file:") {
            rest
        } else if uri.contains("://") {
            return Err(StoreError::InvalidUri(uri.to_string()));
        } else {
            uri
        };
        if path.is_empty() {
            return Err(StoreError::InvalidUri(uri.to_string()));
        }
        Self::open_file(path)
    }

    /// Open a store persisted at `path`, loading the snapshot if present.
    pub fn open_file(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let tables = if path.exists() {
            let bytes = fs::read(&path)?;
            let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
            let tables = Tables::from_snapshot(snapshot)?;
            constraints::check(&tables)?;
            debug!(path = %path.display(), accounts = tables.account_count(), "snapshot loaded");
            tables
        } else {
            Tables::default()
        };
        Ok(Self {
            tables: RwLock::new(tables),
            snapshot: Some(path),
        })
    }

    /// The snapshot path, if this store is file-backed.
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    /// Row counts per table.
    pub fn stats(&self) -> StoreResult<StoreStats> {
        let tables = self.tables.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(StoreStats {
            accounts: tables.account_count(),
            posts: tables.post_count(),
            follows: tables.follow_count(),
            likes: tables.like_count(),
        })
    }
}

fn persist(path: &Path, tables: &Tables) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(&tables.to_snapshot())?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl Store for InMemoryStore {
    fn begin(&self) -> StoreResult<Box<dyn Transaction + '_>> {
        let guard = self.tables.write().map_err(|_| StoreError::LockPoisoned)?;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            staged,
            violations: Vec::new(),
            snapshot: self.snapshot.as_deref(),
        }))
    }

    fn read<T>(&self, f: impl FnOnce(&dyn ReadView) -> T) -> StoreResult<T> {
        let tables = self.tables.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&*tables))
    }
}

/// A write transaction over an [`InMemoryStore`].
struct MemoryTransaction<'a> {
    guard: RwLockWriteGuard<'a, Tables>,
    staged: Tables,
    /// Row-level violations, reported at commit in staging order.
    violations: Vec<StoreError>,
    snapshot: Option<&'a Path>,
}

impl MemoryTransaction<'_> {
    fn defer(&mut self, constraint: &'static str, detail: String) {
        debug!(constraint, %detail, "constraint violation staged");
        self.violations.push(StoreError::violation(constraint, detail));
    }
}

impl ReadView for MemoryTransaction<'_> {
    fn account(&self, id: AccountId) -> Option<Account> {
        self.staged.account(id)
    }

    fn account_by_handle(&self, handle: &str) -> Option<Account> {
        self.staged.account_by_handle(handle)
    }

    fn accounts(&self) -> Vec<Account> {
        self.staged.accounts()
    }

    fn post(&self, id: PostId) -> Option<Post> {
        self.staged.post(id)
    }

    fn posts_by(&self, account: AccountId) -> Vec<Post> {
        self.staged.posts_by(account)
    }

    fn has_follow(&self, edge: FollowEdge) -> bool {
        self.staged.has_follow(edge)
    }

    fn following_ids(&self, account: AccountId) -> Vec<AccountId> {
        self.staged.following_ids(account)
    }

    fn follower_ids(&self, account: AccountId) -> Vec<AccountId> {
        self.staged.follower_ids(account)
    }

    fn has_like(&self, edge: LikeEdge) -> bool {
        self.staged.has_like(edge)
    }

    fn liked_post_ids(&self, account: AccountId) -> Vec<PostId> {
        self.staged.liked_post_ids(account)
    }

    fn liker_ids(&self, post: PostId) -> Vec<AccountId> {
        self.staged.liker_ids(post)
    }
}

impl Transaction for MemoryTransaction<'_> {
    fn insert_account(&mut self, account: NewAccount) -> StoreResult<AccountId> {
        let id = match account.id {
            Some(id) => id,
            None => self.staged.next_account_id()?,
        };
        if self.staged.accounts.contains_key(&id) {
            self.defer(ACCOUNTS_PKEY, format!("account {id} already exists"));
            return Ok(id);
        }
        let Some(handle) = account.handle else {
            self.defer(ACCOUNTS_HANDLE_NOT_NULL, format!("account {id} has no handle"));
            return Ok(id);
        };
        let Some(contact) = account.contact else {
            self.defer(ACCOUNTS_CONTACT_NOT_NULL, format!("account {id} has no contact"));
            return Ok(id);
        };
        self.staged.accounts.insert(
            id,
            Account {
                id,
                handle,
                contact,
                secret_hash: account.secret_hash,
                image_ref: account.image_ref,
                header_ref: account.header_ref,
                bio: account.bio,
                location: account.location,
            },
        );
        Ok(id)
    }

    fn update_account(&mut self, account: Account) -> StoreResult<()> {
        if !self.staged.accounts.contains_key(&account.id) {
            return Err(StoreError::NotFound {
                table: "accounts",
                key: account.id.get(),
            });
        }
        self.staged.accounts.insert(account.id, account);
        Ok(())
    }

    fn insert_post(&mut self, post: NewPost) -> StoreResult<PostId> {
        let id = match post.id {
            Some(id) => id,
            None => self.staged.next_post_id()?,
        };
        if self.staged.posts.contains_key(&id) {
            self.defer(POSTS_PKEY, format!("post {id} already exists"));
            return Ok(id);
        }
        let Some(body) = post.body else {
            self.defer(POSTS_BODY_NOT_NULL, format!("post {id} has no body"));
            return Ok(id);
        };
        self.staged.posts.insert(
            id,
            Post {
                id,
                body,
                created_at: post.created_at.unwrap_or_else(Utc::now),
                account_id: post.account_id,
            },
        );
        Ok(id)
    }

    fn delete_post(&mut self, id: PostId) -> StoreResult<bool> {
        if self.staged.posts.remove(&id).is_none() {
            return Ok(false);
        }
        self.staged.likes.retain(|edge| edge.post != id);
        Ok(true)
    }

    fn insert_follow(&mut self, edge: FollowEdge) -> StoreResult<()> {
        if !self.staged.follows.insert(edge) {
            self.defer(
                FOLLOW_EDGES_PKEY,
                format!("{} already follows {}", edge.follower, edge.followed),
            );
        }
        Ok(())
    }

    fn delete_follow(&mut self, edge: FollowEdge) -> StoreResult<bool> {
        Ok(self.staged.follows.remove(&edge))
    }

    fn insert_like(&mut self, edge: LikeEdge) -> StoreResult<()> {
        if !self.staged.likes.insert(edge) {
            self.defer(
                LIKE_EDGES_PKEY,
                format!("{} already likes post {}", edge.account, edge.post),
            );
        }
        Ok(())
    }

    fn delete_like(&mut self, edge: LikeEdge) -> StoreResult<bool> {
        Ok(self.staged.likes.remove(&edge))
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction {
            mut guard,
            staged,
            violations,
            snapshot,
        } = *self;

        if let Some(first) = violations.into_iter().next() {
            return Err(first);
        }
        constraints::check(&staged)?;
        if let Some(path) = snapshot {
            persist(path, &staged)?;
        }
        *guard = staged;
        debug!(
            accounts = guard.account_count(),
            posts = guard.post_count(),
            follows = guard.follow_count(),
            likes = guard.like_count(),
            "transaction committed"
        );
        Ok(())
    }

    fn rollback(self: Box<Self>) {
        debug!(staged_violations = self.violations.len(), "transaction rolled back");
    }
}
