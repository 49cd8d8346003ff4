use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who may see a paste.
///
/// `Unlisted` pastes are readable by anyone holding the id but never show up
/// in listings. `Private` pastes are readable only by their owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    #[default]
    Public,
    Unlisted,
    Private,
}

impl Privacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
            Self::Private => "private",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "public" => Some(Self::Public),
            "unlisted" => Some(Self::Unlisted),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored paste. Immutable once created; the only mutation is deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paste {
    /// 63-bit id, never negative.
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// `None` means the paste never expires.
    pub expires_at: Option<DateTime<Utc>>,
    pub delete_after_read: bool,
    pub privacy: Privacy,
    /// Argon2 PHC string. Never leaves the server.
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub syntax: String,
    /// `None` for anonymous pastes.
    pub owner_id: Option<i64>,
}

impl Paste {
    pub fn has_password(&self) -> bool {
        self.password_hash.as_deref().is_some_and(|h| !h.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Owner {
    pub id: i64,
    pub username: String,
}

/// A paste joined with the minimal identity of its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnedPaste {
    pub paste: Paste,
    pub owner: Option<Owner>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
