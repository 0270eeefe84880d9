//! Authorization guard for Warbler.
//!
//! Every request reaches the account, post, and graph services through the
//! [`Guard`]. The caller passes its [`Session`] explicitly; the guard
//! re-resolves the session's account on every call, decides whether the
//! requested [`Access`] is permitted, and only then runs the operation.
//!
//! A denial is an ordinary outcome, [`GuardError::Unauthorized`], with no side
//! effect. A lookup of something that does not exist is
//! [`GuardError::NotFound`], a separate outcome.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use warbler_guard::{Guard, GuardConfig, Session};
//! use warbler_store::InMemoryStore;
//!
//! let guard = Guard::new(Arc::new(InMemoryStore::new()), GuardConfig::default());
//! let mut session = Session::anonymous();
//! guard.signup(&mut session, "alice", "alice@example.com", "hunter22", None).unwrap();
//! let post = guard.create_post(&session, "hello").unwrap();
//! assert_eq!(guard.show_post(&Session::anonymous(), post.id).unwrap().body, "hello");
//! ```

pub mod access;
pub mod config;
pub mod error;
pub mod guard;
pub mod session;

pub use access::{decide, Access, Decision};
pub use config::GuardConfig;
pub use error::{GuardError, GuardResult};
pub use guard::Guard;
pub use session::{Session, SessionState, SESSION_KEY};
