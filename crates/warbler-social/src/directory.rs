//! Account lookup and handle search.

use std::sync::Arc;

use warbler_store::Store;
use warbler_types::{Account, AccountId};

use crate::error::SocialResult;
use crate::require_account;

pub struct Directory<S> {
    store: Arc<S>,
}

impl<S: Store> Directory<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn get_account(&self, id: AccountId) -> SocialResult<Account> {
        self.store.read(|view| require_account(view, id))?
    }

    pub fn find_by_handle(&self, handle: &str) -> SocialResult<Option<Account>> {
        Ok(self.store.read(|view| view.account_by_handle(handle))?)
    }

    /// All accounts, or only those whose handle contains `query`.
    pub fn list_accounts(&self, query: Option<&str>) -> SocialResult<Vec<Account>> {
        let accounts = self.store.read(|view| view.accounts())?;
        Ok(match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => accounts.into_iter().filter(|a| a.handle.contains(q)).collect(),
            None => accounts,
        })
    }
}
