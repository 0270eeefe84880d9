//! Posts and home timelines.

use std::sync::Arc;

use tracing::{debug, info};
use warbler_store::Store;
use warbler_types::{validate_body, AccountId, NewPost, Post, PostId};

use crate::error::{SocialError, SocialResult};
use crate::{require_account, require_post};

/// How many posts a home timeline shows unless told otherwise.
pub const DEFAULT_TIMELINE_LIMIT: usize = 100;

/// Post storage over a [`Store`].
pub struct PostBook<S> {
    store: Arc<S>,
}

impl<S: Store> PostBook<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Validate `body` and publish it as a new post owned by `owner`.
    pub fn create_post(&self, owner: AccountId, body: &str) -> SocialResult<Post> {
        validate_body(body)?;
        self.publish(NewPost::new(owner, body))
    }

    /// Insert a pending post as-is.
    ///
    /// No validation happens here; the store rejects a missing body with
    /// its not-null constraint and an empty or oversized one with its
    /// body check.
    pub fn publish(&self, post: NewPost) -> SocialResult<Post> {
        let owner = post.account_id;
        let created = self.store.transaction(|tx| -> SocialResult<Option<Post>> {
            require_account(&*tx, owner)?;
            let id = tx.insert_post(post)?;
            Ok(tx.post(id))
        })?;
        let post = created
            .ok_or_else(|| SocialError::Internal("committed post is not readable".into()))?;
        info!(post = %post.id, owner = %owner, "post created");
        Ok(post)
    }

    pub fn get_post(&self, id: PostId) -> SocialResult<Post> {
        self.store.read(|view| require_post(view, id))?
    }

    /// Posts owned by `account`, newest first.
    pub fn posts_by(&self, account: AccountId) -> SocialResult<Vec<Post>> {
        self.store.read(|view| -> SocialResult<Vec<Post>> {
            require_account(view, account)?;
            let mut posts = view.posts_by(account);
            posts.reverse();
            Ok(posts)
        })?
    }

    /// Delete a post and every like that points at it.
    ///
    /// Returns the deleted post, or [`SocialError::PostNotFound`].
    pub fn delete_post(&self, id: PostId) -> SocialResult<Post> {
        let deleted = self.store.transaction(|tx| -> SocialResult<Post> {
            let post = require_post(&*tx, id)?;
            tx.delete_post(id)?;
            Ok(post)
        })?;
        debug!(post = %id, owner = %deleted.account_id, "post deleted");
        Ok(deleted)
    }

    /// Posts by `account` and every account it follows, newest first, at
    /// most `limit` of them.
    pub fn home_timeline(&self, account: AccountId, limit: usize) -> SocialResult<Vec<Post>> {
        self.store.read(|view| -> SocialResult<Vec<Post>> {
            require_account(view, account)?;
            let mut authors = view.following_ids(account);
            authors.push(account);

            let mut posts: Vec<Post> = authors
                .into_iter()
                .flat_map(|author| view.posts_by(author))
                .collect();
            posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            posts.truncate(limit);
            Ok(posts)
        })?
    }
}
