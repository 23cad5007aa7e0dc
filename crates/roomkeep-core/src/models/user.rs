use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{normalize_email, optional_text, required_text, ParseEnumError, UserId};
use crate::error::{StoreError, StoreResult};

/// Staff role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    Staff,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Staff => "staff",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "manager" => Ok(UserRole::Manager),
            "staff" => Ok(UserRole::Staff),
            _ => Err(ParseEnumError::new("user role", s)),
        }
    }
}

/// A staff account
///
/// Users are never removed; `active = false` is the logical delete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub department: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub dirty: bool,
}

/// Input for creating a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    #[serde(default)]
    pub department: Option<String>,
}

impl NewUser {
    pub fn new(email: impl Into<String>, full_name: impl Into<String>, role: UserRole) -> Self {
        Self {
            email: email.into(),
            full_name: full_name.into(),
            role,
            department: None,
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub(crate) fn validated(&self) -> StoreResult<NewUser> {
        let email = normalize_email("email", Some(&self.email))?
            .ok_or_else(|| StoreError::validation("email", "must not be empty"))?;
        Ok(NewUser {
            email,
            full_name: required_text("full_name", &self.full_name)?,
            role: self.role,
            department: optional_text(self.department.as_deref()),
        })
    }
}

/// Partial update for a user; `department` takes `Some(None)` to clear it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub department: Option<Option<String>>,
    pub active: Option<bool>,
}

impl UserPatch {
    pub(crate) fn validated(&self) -> StoreResult<UserPatch> {
        Ok(UserPatch {
            full_name: self
                .full_name
                .as_deref()
                .map(|v| required_text("full_name", v))
                .transpose()?,
            role: self.role,
            department: self
                .department
                .as_ref()
                .map(|v| optional_text(v.as_deref())),
            active: self.active,
        })
    }
}

/// Equality filters for listing users
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub active: Option<bool>,
}
