use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{normalize_email, optional_text, required_text, GuestId};
use crate::error::StoreResult;

/// A hotel guest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Guest {
    pub id: GuestId,
    pub first_name: String,
    pub last_name: String,
    /// Unique when present
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub dirty: bool,
}

impl Guest {
    pub fn full_name(&self) -> String {
        display_name(&self.first_name, &self.last_name)
    }
}

pub(crate) fn display_name(first: &str, last: &str) -> String {
    format!("{} {}", first, last)
}

/// Input for creating a guest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewGuest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl NewGuest {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub(crate) fn validated(&self) -> StoreResult<NewGuest> {
        Ok(NewGuest {
            first_name: required_text("first_name", &self.first_name)?,
            last_name: required_text("last_name", &self.last_name)?,
            email: normalize_email("email", self.email.as_deref())?,
            phone: optional_text(self.phone.as_deref()),
            address: optional_text(self.address.as_deref()),
        })
    }
}

/// Partial update for a guest
///
/// The optional contact fields take `Some(None)` to clear a value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
}

impl GuestPatch {
    pub(crate) fn validated(&self) -> StoreResult<GuestPatch> {
        Ok(GuestPatch {
            first_name: self
                .first_name
                .as_deref()
                .map(|v| required_text("first_name", v))
                .transpose()?,
            last_name: self
                .last_name
                .as_deref()
                .map(|v| required_text("last_name", v))
                .transpose()?,
            email: self
                .email
                .as_ref()
                .map(|v| normalize_email("email", v.as_deref()))
                .transpose()?,
            phone: self.phone.as_ref().map(|v| optional_text(v.as_deref())),
            address: self.address.as_ref().map(|v| optional_text(v.as_deref())),
        })
    }

    pub(crate) fn renames(&self) -> bool {
        self.first_name.is_some() || self.last_name.is_some()
    }
}

/// Equality filters for listing guests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestFilter {
    pub email: Option<String>,
    pub last_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_guest_requires_names() {
        assert!(NewGuest::new("", "Smith").validated().is_err());
        assert!(NewGuest::new("Anna", "  ").validated().is_err());

        let guest = NewGuest::new(" Anna ", "Smith")
            .with_email("Anna@Example.COM")
            .with_phone(" ")
            .validated()
            .unwrap();
        assert_eq!(guest.first_name, "Anna");
        assert_eq!(guest.email.as_deref(), Some("anna@example.com"));
        assert_eq!(guest.phone, None);
    }

    #[test]
    fn test_patch_clears_contact_fields() {
        let patch = GuestPatch {
            phone: Some(None),
            email: Some(Some("  ".to_string())),
            ..GuestPatch::default()
        }
        .validated()
        .unwrap();
        assert_eq!(patch.phone, Some(None));
        assert_eq!(patch.email, Some(None));
        assert!(!patch.renames());
    }
}
