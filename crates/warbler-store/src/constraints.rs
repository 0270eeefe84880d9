//! Commit-time constraint checking.
//!
//! Constraint names follow the PostgreSQL naming convention so that callers
//! can branch on the exact constraint that failed.

use std::collections::HashSet;

use warbler_types::validate_body;

use crate::error::{StoreError, StoreResult};
use crate::tables::Tables;

pub const ACCOUNTS_PKEY: &str = "accounts_pkey";
pub const ACCOUNTS_HANDLE_KEY: &str = "accounts_handle_key";
pub const ACCOUNTS_CONTACT_KEY: &str = "accounts_contact_key";
pub const ACCOUNTS_HANDLE_NOT_NULL: &str = "accounts_handle_not_null";
pub const ACCOUNTS_CONTACT_NOT_NULL: &str = "accounts_contact_not_null";
pub const ACCOUNTS_HANDLE_CHECK: &str = "accounts_handle_check";
pub const ACCOUNTS_CONTACT_CHECK: &str = "accounts_contact_check";
pub const ACCOUNTS_SECRET_HASH_NOT_NULL: &str = "accounts_secret_hash_not_null";
pub const POSTS_PKEY: &str = "posts_pkey";
pub const POSTS_BODY_NOT_NULL: &str = "posts_body_not_null";
pub const POSTS_BODY_CHECK: &str = "posts_body_check";
pub const POSTS_ACCOUNT_ID_FKEY: &str = "posts_account_id_fkey";
pub const FOLLOW_EDGES_PKEY: &str = "follow_edges_pkey";
pub const FOLLOW_EDGES_FOLLOWER_ID_FKEY: &str = "follow_edges_follower_id_fkey";
pub const FOLLOW_EDGES_FOLLOWED_ID_FKEY: &str = "follow_edges_followed_id_fkey";
pub const LIKE_EDGES_PKEY: &str = "like_edges_pkey";
pub const LIKE_EDGES_ACCOUNT_ID_FKEY: &str = "like_edges_account_id_fkey";
pub const LIKE_EDGES_POST_ID_FKEY: &str = "like_edges_post_id_fkey";

/// Verify every table-level constraint over a staged table set.
///
/// Row-level violations (nulls, duplicate keys) are caught when a row is
/// staged; this pass covers the constraints that span rows or tables.
pub fn check(tables: &Tables) -> StoreResult<()> {
    check_accounts(tables)?;
    check_posts(tables)?;
    check_edges(tables)
}

fn check_accounts(tables: &Tables) -> StoreResult<()> {
    let mut handles = HashSet::with_capacity(tables.accounts.len());
    let mut contacts = HashSet::with_capacity(tables.accounts.len());

    for account in tables.accounts.values() {
        if account.handle.trim().is_empty() {
            return Err(StoreError::violation(
                ACCOUNTS_HANDLE_CHECK,
                format!("account {} has an empty handle", account.id),
            ));
        }
        if account.contact.trim().is_empty() {
            return Err(StoreError::violation(
                ACCOUNTS_CONTACT_CHECK,
                format!("account {} has an empty contact", account.id),
            ));
        }
        if account.secret_hash.is_empty() {
            return Err(StoreError::violation(
                ACCOUNTS_SECRET_HASH_NOT_NULL,
                format!("account {} has no secret hash", account.id),
            ));
        }
        if !handles.insert(account.handle.as_str()) {
            return Err(StoreError::violation(
                ACCOUNTS_HANDLE_KEY,
                format!("handle {:?} already exists", account.handle),
            ));
        }
        if !contacts.insert(account.contact.as_str()) {
            return Err(StoreError::violation(
                ACCOUNTS_CONTACT_KEY,
                format!("contact {:?} already exists", account.contact),
            ));
        }
    }
    Ok(())
}

fn check_posts(tables: &Tables) -> StoreResult<()> {
    for post in tables.posts.values() {
        if let Err(err) = validate_body(&post.body) {
            return Err(StoreError::violation(
                POSTS_BODY_CHECK,
                format!("post {}: {err}", post.id),
            ));
        }
        if !tables.accounts.contains_key(&post.account_id) {
            return Err(StoreError::violation(
                POSTS_ACCOUNT_ID_FKEY,
                format!("post {} references missing account {}", post.id, post.account_id),
            ));
        }
    }
    Ok(())
}

fn check_edges(tables: &Tables) -> StoreResult<()> {
    for edge in &tables.follows {
        if !tables.accounts.contains_key(&edge.follower) {
            return Err(StoreError::violation(
                FOLLOW_EDGES_FOLLOWER_ID_FKEY,
                format!("follower {} does not exist", edge.follower),
            ));
        }
        if !tables.accounts.contains_key(&edge.followed) {
            return Err(StoreError::violation(
                FOLLOW_EDGES_FOLLOWED_ID_FKEY,
                format!("followed account {} does not exist", edge.followed),
            ));
        }
    }
    for edge in &tables.likes {
        if !tables.accounts.contains_key(&edge.account) {
            return Err(StoreError::violation(
                LIKE_EDGES_ACCOUNT_ID_FKEY,
                format!("liking account {} does not exist", edge.account),
            ));
        }
        if !tables.posts.contains_key(&edge.post) {
            return Err(StoreError::violation(
                LIKE_EDGES_POST_ID_FKEY,
                format!("liked post {} does not exist", edge.post),
            ));
        }
    }
    Ok(())
}
