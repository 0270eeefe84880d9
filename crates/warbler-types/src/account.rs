use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::AccountId;

/// Display image used when an account does not supply one.
pub const DEFAULT_IMAGE_REF: &str = "/static/images/default-pic.png";

/// Header image used when an account does not supply one.
pub const DEFAULT_HEADER_REF: &str = "/static/images/warbler-hero.jpg";

/// A persisted account row.
///
/// Only the derived hash of the account's secret is ever held here.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub handle: String,
    pub contact: String,
    pub secret_hash: String,
    pub image_ref: String,
    pub header_ref: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("contact", &self.contact)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Account {}: {}, {}>", self.id, self.handle, self.contact)
    }
}

/// An account row that has been constructed but not committed.
///
/// Handle and contact stay optional here: a missing value is a not-null
/// violation reported by the store at commit, not by the constructor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    /// Explicit primary key; `None` lets the store assign the next one.
    pub id: Option<AccountId>,
    pub handle: Option<String>,
    pub contact: Option<String>,
    pub secret_hash: String,
    pub image_ref: String,
    pub header_ref: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

impl NewAccount {
    /// Build a pending row with defaults applied to every optional field.
    pub fn new(
        handle: Option<String>,
        contact: Option<String>,
        secret_hash: String,
        image_ref: Option<String>,
    ) -> Self {
        Self {
            id: None,
            handle,
            contact,
            secret_hash,
            image_ref: image_ref
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE_REF.to_string()),
            header_ref: DEFAULT_HEADER_REF.to_string(),
            bio: None,
            location: None,
        }
    }

    /// Pin the primary key instead of taking the next sequence value.
    pub fn with_id(mut self, id: AccountId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Partial edit of an account's profile. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub handle: Option<String>,
    pub contact: Option<String>,
    /// An empty string resets the image to [`DEFAULT_IMAGE_REF`].
    pub image_ref: Option<String>,
    /// An empty string resets the header to [`DEFAULT_HEADER_REF`].
    pub header_ref: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

impl ProfileUpdate {
    /// Returns `true` if the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the set fields to `account` in place.
    pub fn apply_to(&self, account: &mut Account) {
        if let Some(handle) = &self.handle {
            account.handle = handle.clone();
        }
        if let Some(contact) = &self.contact {
            account.contact = contact.clone();
        }
        if let Some(image) = &self.image_ref {
            account.image_ref = if image.is_empty() {
                DEFAULT_IMAGE_REF.to_string()
            } else {
                image.clone()
            };
        }
        if let Some(header) = &self.header_ref {
            account.header_ref = if header.is_empty() {
                DEFAULT_HEADER_REF.to_string()
            } else {
                header.clone()
            };
        }
        if let Some(bio) = &self.bio {
            account.bio = Some(bio.clone()).filter(|b| !b.is_empty());
        }
        if let Some(location) = &self.location {
            account.location = Some(location.clone()).filter(|l| !l.is_empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Account {
        Account {
            id: AccountId(111),
            handle: "test1".into(),
            contact: "test1@email.com".into(),
            secret_hash: "$argon2id$...".into(),
            image_ref: DEFAULT_IMAGE_REF.into(),
            header_ref: DEFAULT_HEADER_REF.into(),
            bio: None,
            location: None,
        }
    }

    #[test]
    fn display_matches_record_format() {
        assert_eq!(sample().to_string(), "<Account #111: test1, test1@email.com>");
    }

    #[test]
    fn debug_hides_secret_hash() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("argon2"));
    }

    #[test]
    fn new_account_applies_defaults() {
        let pending = NewAccount::new(Some("alice".into()), Some("a@x.io".into()), "h".into(), None);
        assert_eq!(pending.image_ref, DEFAULT_IMAGE_REF);
        assert_eq!(pending.header_ref, DEFAULT_HEADER_REF);
        assert!(pending.id.is_none());
        assert!(pending.bio.is_none());

        let empty_image = NewAccount::new(None, None, "h".into(), Some(String::new()));
        assert_eq!(empty_image.image_ref, DEFAULT_IMAGE_REF);
    }

    #[test]
    fn with_id_pins_key() {
        let pending = NewAccount::new(None, None, "h".into(), Some("/me.png".into())).with_id(AccountId(5));
        assert_eq!(pending.id, Some(AccountId(5)));
        assert_eq!(pending.image_ref, "/me.png");
    }

    #[test]
    fn profile_update_applies_only_set_fields() {
        let mut account = sample();
        let update = ProfileUpdate {
            bio: Some("hello".into()),
            image_ref: Some(String::new()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply_to(&mut account);
        assert_eq!(account.bio.as_deref(), Some("hello"));
        assert_eq!(account.image_ref, DEFAULT_IMAGE_REF);
        assert_eq!(account.handle, "test1");
        assert!(ProfileUpdate::default().is_empty());
    }
}
