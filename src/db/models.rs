use rusqlite::Row;
use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE_URL: &str = "/assets/images/default-pic.svg";
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/assets/images/warbler-hero.svg";

/// Longest message text accepted.
pub const MESSAGE_MAX_LEN: usize = 140;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    #[serde(skip_serializing)]
    pub password: String,
}

impl User {
    pub(crate) const COLUMNS: &'static str =
        "users.id, users.email, users.username, users.image_url, \
         users.header_image_url, users.bio, users.location, users.password";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            username: row.get(2)?,
            image_url: row.get(3)?,
            header_image_url: row.get(4)?,
            bio: row.get(5)?,
            location: row.get(6)?,
            password: row.get(7)?,
        })
    }

    pub fn avatar(&self) -> &str {
        self.image_url.as_deref().unwrap_or(DEFAULT_IMAGE_URL)
    }

    pub fn header_image(&self) -> &str {
        self.header_image_url
            .as_deref()
            .unwrap_or(DEFAULT_HEADER_IMAGE_URL)
    }
}

/// Debug representation of a user: `<User #1: alice, alice@example.com>`.
pub fn user_repr(user: &User) -> String {
    format!("<User #{}: {}, {}>", user.id, user.username, user.email)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub timestamp: String,
    pub user_id: i64,
}

impl Message {
    pub(crate) const COLUMNS: &'static str =
        "messages.id, messages.text, messages.timestamp, messages.user_id";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Message {
            id: row.get(0)?,
            text: row.get(1)?,
            timestamp: row.get(2)?,
            user_id: row.get(3)?,
        })
    }

    /// Human-readable posting date, e.g. `18 October 2026`. Falls back to the
    /// raw stored value if it is not RFC 3339.
    pub fn posted_on(&self) -> String {
        chrono::DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|ts| ts.format("%d %B %Y").to_string())
            .unwrap_or_else(|_| self.timestamp.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub id: i64,
    pub user_id: i64,
    pub message_id: i64,
}

/// A message joined with its author, as rendered in feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedEntry {
    pub message: Message,
    pub username: String,
    pub image_url: Option<String>,
}

impl FeedEntry {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(FeedEntry {
            message: Message::from_row(row)?,
            username: row.get(4)?,
            image_url: row.get(5)?,
        })
    }

    pub fn avatar(&self) -> &str {
        self.image_url.as_deref().unwrap_or(DEFAULT_IMAGE_URL)
    }
}
