//! Like edges from accounts to posts.

use std::sync::Arc;

use tracing::debug;
use warbler_store::constraints::LIKE_EDGES_PKEY;
use warbler_store::Store;
use warbler_types::{Account, AccountId, LikeEdge, Post, PostId};

use crate::error::{SocialError, SocialResult};
use crate::{require_account, require_post};

/// Like operations over a [`Store`].
pub struct Engagement<S> {
    store: Arc<S>,
}

impl<S: Store> Engagement<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record that `account` likes `post`.
    ///
    /// Returns `true` if a new edge was created. Liking an already-liked
    /// post is a no-op that returns `false`.
    pub fn like(&self, account: AccountId, post: PostId) -> SocialResult<bool> {
        let edge = LikeEdge::new(account, post);
        let result: SocialResult<bool> = self.store.transaction(|tx| {
            require_account(&*tx, account)?;
            require_post(&*tx, post)?;
            if tx.has_like(edge) {
                return Ok(false);
            }
            tx.insert_like(edge)?;
            Ok(true)
        });

        match result {
            Ok(created) => {
                if created {
                    debug!(%account, %post, "like recorded");
                }
                Ok(created)
            }
            Err(SocialError::Store(e)) if e.is_violation_of(LIKE_EDGES_PKEY) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Remove the like if present. Returns whether an edge was removed;
    /// unliking a post that was never liked is a no-op.
    pub fn unlike(&self, account: AccountId, post: PostId) -> SocialResult<bool> {
        let edge = LikeEdge::new(account, post);
        let removed = self
            .store
            .transaction(|tx| tx.delete_like(edge).map_err(SocialError::from))?;
        if removed {
            debug!(%account, %post, "like removed");
        }
        Ok(removed)
    }

    /// Like the post if it is not liked yet, otherwise remove the like.
    ///
    /// Returns the new state: `true` if the post is now liked.
    pub fn toggle_like(&self, account: AccountId, post: PostId) -> SocialResult<bool> {
        let edge = LikeEdge::new(account, post);
        let liked = self.store.transaction(|tx| -> SocialResult<bool> {
            if tx.delete_like(edge)? {
                return Ok(false);
            }
            require_account(&*tx, account)?;
            require_post(&*tx, post)?;
            tx.insert_like(edge)?;
            Ok(true)
        })?;
        debug!(%account, %post, liked, "like toggled");
        Ok(liked)
    }

    pub fn has_liked(&self, account: AccountId, post: PostId) -> SocialResult<bool> {
        Ok(self
            .store
            .read(|view| view.has_like(LikeEdge::new(account, post)))?)
    }

    /// Every post `account` has liked.
    pub fn liked_posts(&self, account: AccountId) -> SocialResult<Vec<Post>> {
        self.store.read(|view| -> SocialResult<Vec<Post>> {
            require_account(view, account)?;
            Ok(view
                .liked_post_ids(account)
                .into_iter()
                .filter_map(|id| view.post(id))
                .collect())
        })?
    }

    /// Every account that liked `post`.
    pub fn likers(&self, post: PostId) -> SocialResult<Vec<Account>> {
        self.store.read(|view| -> SocialResult<Vec<Account>> {
            require_post(view, post)?;
            Ok(view
                .liker_ids(post)
                .into_iter()
                .filter_map(|id| view.account(id))
                .collect())
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::store_with_accounts;
    use warbler_store::InMemoryStore;
    use warbler_types::NewPost;
    use std::sync::Barrier;
    use std::thread;

    fn engagement_with_post() -> Engagement<InMemoryStore> {
        let store = store_with_accounts(2);
        store
            .transaction(|tx| tx.insert_post(NewPost::new(AccountId(1), "test message1").with_id(PostId(9876))))
            .unwrap();
        Engagement::new(store)
    }

    #[test]
    fn double_like_yields_one_edge() {
        let e = engagement_with_post();
        assert!(e.like(AccountId(2), PostId(9876)).unwrap());
        assert!(!e.like(AccountId(2), PostId(9876)).unwrap());

        let likers = e.likers(PostId(9876)).unwrap();
        assert_eq!(likers.len(), 1);
        assert_eq!(likers[0].id, AccountId(2));
    }

    #[test]
    fn concurrent_likes_create_one_edge() {
        const THREADS: usize = 8;
        let store = store_with_accounts(2);
        store
            .transaction(|tx| tx.insert_post(NewPost::new(AccountId(1), "popular").with_id(PostId(9876))))
            .unwrap();
        let e = Engagement::new(Arc::clone(&store));
        let barrier = Barrier::new(THREADS);

        let created = thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        e.like(AccountId(2), PostId(9876)).unwrap()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|&created| created)
                .count()
        });

        assert_eq!(created, 1);
        assert_eq!(store.stats().unwrap().likes, 1);
        assert_eq!(e.likers(PostId(9876)).unwrap().len(), 1);
    }

    #[test]
    fn liked_posts_lists_liked_bodies() {
        let e = engagement_with_post();
        e.like(AccountId(2), PostId(9876)).unwrap();
        let liked = e.liked_posts(AccountId(2)).unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].body, "test message1");
        assert!(e.liked_posts(AccountId(1)).unwrap().is_empty());
    }

    #[test]
    fn unlike_without_edge_is_a_no_op() {
        let e = engagement_with_post();
        assert!(!e.unlike(AccountId(2), PostId(9876)).unwrap());
        e.like(AccountId(2), PostId(9876)).unwrap();
        assert!(e.unlike(AccountId(2), PostId(9876)).unwrap());
        assert!(!e.has_liked(AccountId(2), PostId(9876)).unwrap());
    }

    #[test]
    fn toggle_flips_state() {
        let e = engagement_with_post();
        assert!(e.toggle_like(AccountId(2), PostId(9876)).unwrap());
        assert!(e.has_liked(AccountId(2), PostId(9876)).unwrap());
        assert!(!e.toggle_like(AccountId(2), PostId(9876)).unwrap());
        assert!(!e.has_liked(AccountId(2), PostId(9876)).unwrap());
    }

    #[test]
    fn like_of_missing_post_is_not_found() {
        let e = engagement_with_post();
        let err = e.like(AccountId(2), PostId(1)).unwrap_err();
        assert!(matches!(err, SocialError::PostNotFound(PostId(1))));
        let err = e.toggle_like(AccountId(2), PostId(1)).unwrap_err();
        assert!(err.is_not_found());
    }
}
