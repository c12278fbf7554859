//! Back-office users

use serde::{Deserialize, Serialize};

use core_kernel::UserId;

/// Role of a back-office user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Underwriter,
    Adjuster,
    Agent,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Underwriter => "UNDERWRITER",
            UserRole::Adjuster => "ADJUSTER",
            UserRole::Agent => "AGENT",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(UserRole::Admin),
            "UNDERWRITER" => Ok(UserRole::Underwriter),
            "ADJUSTER" => Ok(UserRole::Adjuster),
            "AGENT" => Ok(UserRole::Agent),
            other => Err(format!("unknown role {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: UserId::new_v7(),
            name: name.into(),
            email: email.into(),
            role,
        }
    }

    pub fn is_adjuster(&self) -> bool {
        self.role == UserRole::Adjuster
    }
}
