//! Credential management for Warbler.
//!
//! Accounts are created with [`CredentialManager::signup`], which hashes the
//! secret with Argon2id and returns a pending row that becomes durable only
//! when a transaction commits it. [`CredentialManager::authenticate`] checks a
//! handle/secret pair and answers with the account or a denial, without
//! revealing which half of the pair was wrong.

pub mod error;
pub mod manager;
pub mod password;

pub use error::{CredentialError, CredentialResult};
pub use manager::CredentialManager;
pub use password::{hash_secret, verify_secret};
