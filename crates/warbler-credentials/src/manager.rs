use std::sync::Arc;

use tracing::{debug, info, warn};
use warbler_store::Store;
use warbler_types::{Account, AccountId, NewAccount, ProfileUpdate};

use crate::error::{CredentialError, CredentialResult};
use crate::password::{hash_secret, verify_secret, DUMMY_HASH};

/// Creates accounts and checks credentials against a [`Store`].
pub struct CredentialManager<S> {
    store: Arc<S>,
}

impl<S> Clone for CredentialManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> CredentialManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Build a pending account with a hashed secret.
    ///
    /// Fails with [`CredentialError::Validation`] if `secret` is absent or
    /// empty; that check runs before anything else. Handle and contact are
    /// not checked here: a missing or duplicate value is a constraint
    /// violation reported when the row is committed.
    pub fn signup(
        &self,
        handle: Option<&str>,
        contact: Option<&str>,
        secret: Option<&str>,
        image_ref: Option<&str>,
    ) -> CredentialResult<NewAccount> {
        let secret = match secret {
            Some(s) if !s.is_empty() => s,
            _ => {
                return Err(CredentialError::Validation(
                    "secret must be non-empty".into(),
                ))
            }
        };
        let secret_hash = hash_secret(secret)?;
        Ok(NewAccount::new(
            handle.map(str::to_string),
            contact.map(str::to_string),
            secret_hash,
            image_ref.map(str::to_string),
        ))
    }

    /// Commit a pending account and return the persisted row.
    pub fn create(&self, pending: NewAccount) -> CredentialResult<Account> {
        let account = self.store.transaction(|tx| {
            let id = tx.insert_account(pending)?;
            Ok::<_, CredentialError>(tx.account(id))
        })?;
        // A staged row that violated a constraint never reaches this point:
        // commit reports the violation first.
        let account = account.ok_or_else(|| {
            CredentialError::Internal("committed account is not readable".into())
        })?;
        info!(account = %account.id, handle = %account.handle, "account registered");
        Ok(account)
    }

    /// Sign up and commit in one step.
    pub fn register(
        &self,
        handle: &str,
        contact: &str,
        secret: &str,
        image_ref: Option<&str>,
    ) -> CredentialResult<Account> {
        let pending = self.signup(Some(handle), Some(contact), Some(secret), image_ref)?;
        self.create(pending)
    }

    /// Check a handle/secret pair.
    ///
    /// Returns `Ok(None)` for an unknown handle, a wrong secret, or a stored
    /// hash that cannot be parsed.
    /// An unknown handle still pays for one hash verification, so the two
    /// denials cost the same.
    pub fn authenticate(&self, handle: &str, secret: &str) -> CredentialResult<Option<Account>> {
        let account = self.store.read(|view| view.account_by_handle(handle))?;
        let verified = match &account {
            Some(account) => secret_matches(account, secret),
            None => {
                // Equalize cost with the known-handle path; the answer is
                // always "no".
                let _ = verify_secret(secret, DUMMY_HASH);
                false
            }
        };
        if verified {
            debug!(handle, "authentication succeeded");
            Ok(account)
        } else {
            warn!(handle, "authentication denied");
            Ok(None)
        }
    }

    /// Apply a profile edit after re-checking the account's secret.
    ///
    /// On a wrong secret nothing changes and the result is
    /// [`CredentialError::InvalidCredentials`]. A handle or contact that
    /// collides with another account is a constraint violation.
    pub fn update_profile(
        &self,
        id: AccountId,
        secret: &str,
        update: &ProfileUpdate,
    ) -> CredentialResult<Account> {
        let current = self
            .store
            .read(|view| view.account(id))?
            .ok_or(CredentialError::AccountNotFound(id))?;
        if !secret_matches(&current, secret) {
            warn!(account = %id, "profile edit denied: secret mismatch");
            return Err(CredentialError::InvalidCredentials);
        }

        let updated = self.store.transaction(|tx| {
            let mut account = tx.account(id).ok_or(CredentialError::AccountNotFound(id))?;
            update.apply_to(&mut account);
            tx.update_account(account.clone())?;
            Ok::<_, CredentialError>(account)
        })?;
        info!(account = %id, handle = %updated.handle, "profile updated");
        Ok(updated)
    }
}

/// A stored hash that does not parse denies like a wrong secret.
fn secret_matches(account: &Account, secret: &str) -> bool {
    verify_secret(secret, &account.secret_hash).unwrap_or_else(|err| {
        warn!(account = %account.id, error = %err, "stored secret hash is unreadable");
        false
    })
}

impl<S: Store + 'static> CredentialManager<S> {
    /// [`authenticate`](Self::authenticate) with the hash verification run on
    /// the blocking thread pool, so slow hashing never stalls other tasks.
    pub async fn authenticate_async(
        &self,
        handle: String,
        secret: String,
    ) -> CredentialResult<Option<Account>> {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || manager.authenticate(&handle, &secret))
            .await
            .map_err(|e| CredentialError::Internal(format!("authentication task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warbler_store::constraints::{
        ACCOUNTS_CONTACT_KEY, ACCOUNTS_CONTACT_NOT_NULL, ACCOUNTS_HANDLE_KEY,
        ACCOUNTS_HANDLE_NOT_NULL,
    };
    use warbler_store::InMemoryStore;
    use warbler_types::DEFAULT_IMAGE_REF;

    fn manager() -> CredentialManager<InMemoryStore> {
        CredentialManager::new(Arc::new(InMemoryStore::new()))
    }

    fn seeded() -> CredentialManager<InMemoryStore> {
        let creds = manager();
        let u1 = creds
            .signup(Some("test1"), Some("test1@email.com"), Some("password"), None)
            .unwrap()
            .with_id(AccountId(111));
        let u2 = creds
            .signup(Some("test2"), Some("test2@email.com"), Some("password"), None)
            .unwrap()
            .with_id(AccountId(2));
        creds.create(u1).unwrap();
        creds.create(u2).unwrap();
        creds
    }

    fn violation(err: &CredentialError) -> Option<&'static str> {
        match err {
            CredentialError::Store(e) => e.constraint(),
            _ => None,
        }
    }

    #[test]
    fn valid_signup_stores_hash_not_secret() {
        let creds = manager();
        let pending = creds
            .signup(Some("testuser"), Some("user@test.com"), Some("password"), None)
            .unwrap()
            .with_id(AccountId(11111));
        let account = creds.create(pending).unwrap();

        assert_eq!(account.id, AccountId(11111));
        assert_eq!(account.handle, "testuser");
        assert_eq!(account.contact, "user@test.com");
        assert_ne!(account.secret_hash, "password");
        assert_eq!(account.image_ref, DEFAULT_IMAGE_REF);
    }

    #[test]
    fn signup_does_not_write() {
        let creds = manager();
        creds
            .signup(Some("testuser"), Some("user@test.com"), Some("password"), None)
            .unwrap();
        assert_eq!(creds.store().stats().unwrap().accounts, 0);
    }

    #[test]
    fn missing_secret_is_a_validation_error() {
        let creds = manager();
        let err = creds
            .signup(Some("testuser"), Some("user@test.com"), None, None)
            .unwrap_err();
        assert!(matches!(err, CredentialError::Validation(_)));

        let err = creds
            .signup(Some("testuser"), Some("user@test.com"), Some(""), None)
            .unwrap_err();
        assert!(matches!(err, CredentialError::Validation(_)));
        assert_eq!(creds.store().stats().unwrap().accounts, 0);
    }

    #[test]
    fn missing_handle_fails_at_commit() {
        let creds = manager();
        let pending = creds
            .signup(None, Some("user@test.com"), Some("password"), None)
            .unwrap()
            .with_id(AccountId(22222));
        let err = creds.create(pending).unwrap_err();
        assert_eq!(violation(&err), Some(ACCOUNTS_HANDLE_NOT_NULL));
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn missing_contact_fails_at_commit() {
        let creds = manager();
        let pending = creds
            .signup(Some("testuser"), None, Some("password"), None)
            .unwrap();
        let err = creds.create(pending).unwrap_err();
        assert_eq!(violation(&err), Some(ACCOUNTS_CONTACT_NOT_NULL));
    }

    #[test]
    fn colliding_handle_or_contact_is_rejected() {
        let creds = seeded();
        let err = creds
            .register("test1", "fresh@email.com", "password", None)
            .unwrap_err();
        assert_eq!(violation(&err), Some(ACCOUNTS_HANDLE_KEY));

        let err = creds
            .register("fresh", "test2@email.com", "password", None)
            .unwrap_err();
        assert_eq!(violation(&err), Some(ACCOUNTS_CONTACT_KEY));
        assert_eq!(creds.store().stats().unwrap().accounts, 2);
    }

    #[test]
    fn authenticate_accepts_only_the_right_secret() {
        let creds = seeded();
        let account = creds.authenticate("test1", "password").unwrap().unwrap();
        assert_eq!(account.id, AccountId(111));

        assert!(creds.authenticate("wrongusername", "password").unwrap().is_none());
        assert!(creds.authenticate("test1", "wrongpassword").unwrap().is_none());
    }

    #[test]
    fn unreadable_stored_hash_is_a_denial() {
        let creds = manager();
        creds
            .create(NewAccount::new(
                Some("legacy".into()),
                Some("legacy@test.com".into()),
                "HASHED_PASSWORD".into(),
                None,
            ))
            .unwrap();

        assert!(creds.authenticate("legacy", "password").unwrap().is_none());
        assert!(creds.authenticate("legacy", "HASHED_PASSWORD").unwrap().is_none());

        let id = creds.store().read(|v| v.account_by_handle("legacy")).unwrap().unwrap().id;
        let err = creds
            .update_profile(id, "password", &ProfileUpdate::default())
            .unwrap_err();
        assert!(matches!(err, CredentialError::InvalidCredentials));
    }

    #[tokio::test]
    async fn authenticate_async_matches_sync_path() {
        let creds = seeded();
        let ok = creds
            .authenticate_async("test2".into(), "password".into())
            .await
            .unwrap();
        assert_eq!(ok.map(|a| a.id), Some(AccountId(2)));

        let denied = creds
            .authenticate_async("test2".into(), "nope".into())
            .await
            .unwrap();
        assert!(denied.is_none());
    }

    #[test]
    fn profile_update_requires_secret() {
        let creds = seeded();
        let update = ProfileUpdate {
            bio: Some("hello there".into()),
            location: Some("Lisbon".into()),
            ..Default::default()
        };

        let err = creds
            .update_profile(AccountId(111), "wrongpassword", &update)
            .unwrap_err();
        assert!(matches!(err, CredentialError::InvalidCredentials));

        let updated = creds.update_profile(AccountId(111), "password", &update).unwrap();
        assert_eq!(updated.bio.as_deref(), Some("hello there"));
        assert_eq!(updated.location.as_deref(), Some("Lisbon"));
        assert_eq!(updated.handle, "test1");
    }

    #[test]
    fn profile_update_cannot_steal_a_handle() {
        let creds = seeded();
        let update = ProfileUpdate {
            handle: Some("test2".into()),
            ..Default::default()
        };
        let err = creds
            .update_profile(AccountId(111), "password", &update)
            .unwrap_err();
        assert_eq!(violation(&err), Some(ACCOUNTS_HANDLE_KEY));

        let still = creds.authenticate("test1", "password").unwrap();
        assert!(still.is_some());
    }

    #[test]
    fn profile_update_for_missing_account() {
        let creds = seeded();
        let err = creds
            .update_profile(AccountId(999), "password", &ProfileUpdate::default())
            .unwrap_err();
        assert!(matches!(err, CredentialError::AccountNotFound(AccountId(999))));
    }
}
