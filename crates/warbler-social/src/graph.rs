//! Directed follow edges between accounts.

use std::sync::Arc;

use tracing::debug;
use warbler_store::constraints::FOLLOW_EDGES_PKEY;
use warbler_store::{ReadView, Store};
use warbler_types::{Account, AccountId, FollowEdge};

use crate::error::{SocialError, SocialResult};
use crate::require_account;

/// Follow-graph operations over a [`Store`].
pub struct SocialGraph<S> {
    store: Arc<S>,
}

impl<S: Store> SocialGraph<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Make `follower` follow `followed`.
    ///
    /// Returns `true` if a new edge was created and `false` if it already
    /// existed. Following yourself is rejected with
    /// [`SocialError::SelfFollow`].
    pub fn follow(&self, follower: AccountId, followed: AccountId) -> SocialResult<bool> {
        let edge = FollowEdge::new(follower, followed);
        if edge.is_self_loop() {
            return Err(SocialError::SelfFollow(follower));
        }

        let result: SocialResult<bool> = self.store.transaction(|tx| {
            require_account(&*tx, follower)?;
            require_account(&*tx, followed)?;
            if tx.has_follow(edge) {
                return Ok(false);
            }
            tx.insert_follow(edge)?;
            Ok(true)
        });

        match result {
            Ok(created) => {
                if created {
                    debug!(%follower, %followed, "follow edge created");
                }
                Ok(created)
            }
            // A concurrent follow of the same pair committed first.
            Err(SocialError::Store(e)) if e.is_violation_of(FOLLOW_EDGES_PKEY) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Remove the edge if present. Returns whether an edge was removed.
    pub fn unfollow(&self, follower: AccountId, followed: AccountId) -> SocialResult<bool> {
        let edge = FollowEdge::new(follower, followed);
        let removed = self
            .store
            .transaction(|tx| tx.delete_follow(edge).map_err(SocialError::from))?;
        if removed {
            debug!(%follower, %followed, "follow edge removed");
        }
        Ok(removed)
    }

    /// Does `a` follow `b`?
    pub fn is_following(&self, a: AccountId, b: AccountId) -> SocialResult<bool> {
        Ok(self.store.read(|view| view.has_follow(FollowEdge::new(a, b)))?)
    }

    /// Is `a` followed by `b`? Always equal to `is_following(b, a)`.
    pub fn is_followed_by(&self, a: AccountId, b: AccountId) -> SocialResult<bool> {
        Ok(self
            .store
            .read(|view| view.has_follow(FollowEdge::new(a, b).reversed()))?)
    }

    /// Accounts that `id` follows, one per edge.
    pub fn following(&self, id: AccountId) -> SocialResult<Vec<Account>> {
        self.store.read(|view| -> SocialResult<Vec<Account>> {
            require_account(view, id)?;
            Ok(resolve(view, view.following_ids(id)))
        })?
    }

    /// Accounts that follow `id`, one per edge.
    pub fn followers(&self, id: AccountId) -> SocialResult<Vec<Account>> {
        self.store.read(|view| -> SocialResult<Vec<Account>> {
            require_account(view, id)?;
            Ok(resolve(view, view.follower_ids(id)))
        })?
    }
}

fn resolve(view: &dyn ReadView, ids: Vec<AccountId>) -> Vec<Account> {
    ids.into_iter().filter_map(|id| view.account(id)).collect()
}
