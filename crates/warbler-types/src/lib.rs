//! Foundation types for Warbler.
//!
//! This crate provides the records shared by every other Warbler crate: the
//! identifiers of accounts and posts, the account and post rows themselves,
//! and the two kinds of graph edge. Every other Warbler crate depends on
//! `warbler-types`.
//!
//! # Key Types
//!
//! - [`AccountId`] / [`PostId`]: Integer primary keys
//! - [`Account`]: A persisted account row (hash only, never the secret)
//! - [`NewAccount`]: A pending account row produced by signup, not yet durable
//! - [`Post`] / [`NewPost`]: Persisted and pending posts
//! - [`FollowEdge`] / [`LikeEdge`]: Directed relationships identified by their endpoints

pub mod account;
pub mod edge;
pub mod error;
pub mod identity;
pub mod post;

pub use account::{Account, NewAccount, ProfileUpdate, DEFAULT_HEADER_REF, DEFAULT_IMAGE_REF};
pub use edge::{FollowEdge, LikeEdge};
pub use error::TypeError;
pub use identity::{AccountId, PostId};
pub use post::{validate_body, NewPost, Post, MAX_BODY_CHARS};
