use serde::{Deserialize, Serialize};
use warbler_types::AccountId;

/// Name of the single session entry that carries the logged-in account.
pub const SESSION_KEY: &str = "curr_user";

/// Per-client session data: at most one account identifier.
///
/// A session is only a claim. It is resolved against the store on every
/// request, and an identifier that no longer resolves counts as anonymous.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "curr_user", default, skip_serializing_if = "Option::is_none")]
    curr_user: Option<AccountId>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session claiming `id`, as a login would leave it.
    pub fn for_account(id: AccountId) -> Self {
        Self { curr_user: Some(id) }
    }

    pub fn account_id(&self) -> Option<AccountId> {
        self.curr_user
    }

    pub(crate) fn set(&mut self, id: AccountId) {
        self.curr_user = Some(id);
    }

    pub(crate) fn clear(&mut self) {
        self.curr_user = None;
    }
}

/// A session after resolution against the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(AccountId),
}

impl SessionState {
    pub fn account_id(&self) -> Option<AccountId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(id) => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}
