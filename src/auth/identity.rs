//! Account creation and credential checks.
//!
//! `signup` only hashes; nothing touches the database until
//! [`NewUser::insert`], which is where a taken username or email surfaces as
//! [`crate::db::StoreError::Integrity`].

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::User;
use crate::db::StoreResult;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// A validated, hashed account that has not been written yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub image_url: Option<String>,
}

/// Hash the password and build an unpersisted user.
pub fn signup(
    username: &str,
    email: &str,
    password: &str,
    image_url: Option<&str>,
    cost: u32,
) -> Result<NewUser, IdentityError> {
    let password_hash = bcrypt::hash(password, cost)?;
    Ok(NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash,
        image_url: image_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string),
    })
}

impl NewUser {
    /// Write the user. Uniqueness is enforced here by the schema, so a
    /// collision comes back as `StoreError::Integrity`.
    pub fn insert(&self, conn: &Connection) -> StoreResult<User> {
        conn.execute(
            "INSERT INTO users (username, email, password, image_url) VALUES (?1, ?2, ?3, ?4)",
            params![self.username, self.email, self.password_hash, self.image_url],
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(user_id = id, username = %self.username, "User signed up");

        Ok(User {
            id,
            email: self.email.clone(),
            username: self.username.clone(),
            image_url: self.image_url.clone(),
            header_image_url: None,
            bio: None,
            location: None,
            password: self.password_hash.clone(),
        })
    }
}

/// Look up `username` and check `password` against its hash.
///
/// Unknown users and wrong passwords both give `None`, so callers cannot
/// tell which part was wrong.
pub fn authenticate(
    conn: &Connection,
    username: &str,
    password: &str,
) -> StoreResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE username = ?1", User::COLUMNS),
            params![username],
            User::from_row,
        )
        .optional()?;

    Ok(user.filter(|u| verify_password(password, &u.password)))
}

/// Constant-time bcrypt check. A malformed stored hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
