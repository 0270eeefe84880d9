//! Social graph services for Warbler.
//!
//! Each service works on plain identifiers against a shared [`Store`]; none
//! of them checks who is asking. Permission decisions belong to the guard
//! layer that sits in front of these services.
//!
//! - [`SocialGraph`]: directed follow edges between accounts
//! - [`Engagement`]: like edges from accounts to posts
//! - [`PostBook`]: post creation, lookup, deletion, and home timelines
//! - [`Directory`]: account lookup and handle search
//!
//! Every mutation runs in one store transaction. Duplicate edges are never
//! an error: a second follow or like of the same pair reports "already
//! present", including when a concurrent writer won the race and the store
//! rejected the insert on the edge's primary key.

use std::sync::Arc;

use warbler_store::{ReadView, Store};
use warbler_types::{Account, AccountId, Post, PostId};

pub mod directory;
pub mod engagement;
pub mod error;
pub mod graph;
pub mod posts;

pub use directory::Directory;
pub use engagement::Engagement;
pub use error::{SocialError, SocialResult};
pub use graph::SocialGraph;
pub use posts::{PostBook, DEFAULT_TIMELINE_LIMIT};

/// All social services over one store.
pub struct Social<S> {
    pub graph: SocialGraph<S>,
    pub engagement: Engagement<S>,
    pub posts: PostBook<S>,
    pub directory: Directory<S>,
}

impl<S: Store> Social<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            graph: SocialGraph::new(Arc::clone(&store)),
            engagement: Engagement::new(Arc::clone(&store)),
            posts: PostBook::new(Arc::clone(&store)),
            directory: Directory::new(store),
        }
    }
}

pub(crate) fn require_account<V: ReadView + ?Sized>(view: &V, id: AccountId) -> SocialResult<Account> {
    view.account(id).ok_or(SocialError::AccountNotFound(id))
}

pub(crate) fn require_post<V: ReadView + ?Sized>(view: &V, id: PostId) -> SocialResult<Post> {
    view.post(id).ok_or(SocialError::PostNotFound(id))
}
