use std::fmt;

use warbler_types::AccountId;

use crate::session::SessionState;

/// What a requested operation needs from the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Anyone may perform it, logged in or not.
    Public,
    /// The caller acts on its own behalf: creating posts, following,
    /// liking, viewing graph listings.
    SelfActing,
    /// Only the owner of the target resource may perform it.
    OwnerOnly { owner: AccountId },
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::SelfActing => write!(f, "self-acting"),
            Self::OwnerOnly { owner } => write!(f, "owner-only:{owner}"),
        }
    }
}

/// The outcome of an access decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Permit,
    Deny,
}

impl Decision {
    pub fn is_permit(&self) -> bool {
        matches!(self, Self::Permit)
    }
}

/// Decide whether `state` may perform an operation requiring `access`.
///
/// Pure: no lookups, no side effects.
pub fn decide(state: &SessionState, access: &Access) -> Decision {
    let permitted = match (access, state) {
        (Access::Public, _) => true,
        (Access::SelfActing, SessionState::Authenticated(_)) => true,
        (Access::OwnerOnly { owner }, SessionState::Authenticated(id)) => owner == id,
        (_, SessionState::Anonymous) => false,
    };
    if permitted {
        Decision::Permit
    } else {
        Decision::Deny
    }
}
