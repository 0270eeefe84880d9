//! The storage interface shared by every Warbler backend.
//!
//! Services never hold table references across requests: each request opens
//! one transaction (or one read view), does its work, and ends it.

use warbler_types::{
    Account, AccountId, FollowEdge, LikeEdge, NewAccount, NewPost, Post, PostId,
};

use crate::error::{StoreError, StoreResult};

/// Read-only queries over a consistent view of the tables.
///
/// Listings are ordered by primary key unless stated otherwise.
pub trait ReadView {
    fn account(&self, id: AccountId) -> Option<Account>;

    fn account_by_handle(&self, handle: &str) -> Option<Account>;

    fn accounts(&self) -> Vec<Account>;

    fn post(&self, id: PostId) -> Option<Post>;

    /// Posts owned by `account`, oldest first.
    fn posts_by(&self, account: AccountId) -> Vec<Post>;

    fn has_follow(&self, edge: FollowEdge) -> bool;

    /// Accounts that `account` follows.
    fn following_ids(&self, account: AccountId) -> Vec<AccountId>;

    /// Accounts that follow `account`.
    fn follower_ids(&self, account: AccountId) -> Vec<AccountId>;

    fn has_like(&self, edge: LikeEdge) -> bool;

    /// Posts liked by `account`.
    fn liked_post_ids(&self, account: AccountId) -> Vec<PostId>;

    /// Accounts that liked `post`.
    fn liker_ids(&self, post: PostId) -> Vec<AccountId>;
}

/// A write transaction.
///
/// Inserts are staged and return immediately. Null columns, duplicate keys,
/// duplicate handles or contacts, and dangling references are reported by
/// [`commit`](Self::commit), at which point nothing has been applied. Dropping
/// a transaction without committing rolls it back.
pub trait Transaction: ReadView {
    /// Stage a new account and return the key it will have.
    fn insert_account(&mut self, account: NewAccount) -> StoreResult<AccountId>;

    /// Replace an existing account row.
    fn update_account(&mut self, account: Account) -> StoreResult<()>;

    /// Stage a new post and return the key it will have.
    fn insert_post(&mut self, post: NewPost) -> StoreResult<PostId>;

    /// Remove a post together with every like pointing at it.
    ///
    /// Returns `false` if no such post existed.
    fn delete_post(&mut self, id: PostId) -> StoreResult<bool>;

    fn insert_follow(&mut self, edge: FollowEdge) -> StoreResult<()>;

    /// Returns `false` if the edge was not present.
    fn delete_follow(&mut self, edge: FollowEdge) -> StoreResult<bool>;

    fn insert_like(&mut self, edge: LikeEdge) -> StoreResult<()>;

    /// Returns `false` if the edge was not present.
    fn delete_like(&mut self, edge: LikeEdge) -> StoreResult<bool>;

    /// Check every constraint and make the staged changes durable.
    fn commit(self: Box<Self>) -> StoreResult<()>;

    /// Discard the staged changes.
    fn rollback(self: Box<Self>);
}

/// A relational store of accounts, posts, and edges.
///
/// Implementations must be thread-safe (`Send + Sync`). Write transactions
/// are serializable: a transaction sees no concurrent writer's changes.
pub trait Store: Send + Sync {
    /// Open a write transaction.
    fn begin(&self) -> StoreResult<Box<dyn Transaction + '_>>;

    /// Run `f` against a consistent read-only view.
    fn read<T>(&self, f: impl FnOnce(&dyn ReadView) -> T) -> StoreResult<T>;

    /// Run `f` inside a transaction, committing if it returns `Ok` and
    /// rolling back if it returns `Err`.
    fn transaction<T, E>(
        &self,
        f: impl FnOnce(&mut dyn Transaction) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut tx = self.begin()?;
        match f(tx.as_mut()) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                tx.rollback();
                Err(err)
            }
        }
    }
}
