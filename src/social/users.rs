use rusqlite::{params, Connection};

use crate::db::models::User;
use crate::db::{StoreError, StoreResult};

pub fn get_user(conn: &Connection, id: i64) -> StoreResult<User> {
    let user = conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", User::COLUMNS),
        params![id],
        User::from_row,
    )?;
    Ok(user)
}

/// All users, or those whose username contains `search`.
pub fn list_users(conn: &Connection, search: Option<&str>) -> StoreResult<Vec<User>> {
    let search = search.map(str::trim).filter(|q| !q.is_empty());

    let users = match search {
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM users ORDER BY users.id",
                User::COLUMNS
            ))?;
            let rows = stmt.query_map([], User::from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
        Some(q) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM users WHERE instr(username, ?1) > 0 ORDER BY users.id",
                User::COLUMNS
            ))?;
            let rows = stmt.query_map(params![q], User::from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(users)
}

/// Editable profile fields. Empty strings clear the optional ones.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Apply a profile edit. A username or email already taken by someone else
/// fails with `StoreError::Integrity`.
pub fn update_profile(conn: &Connection, id: i64, update: &ProfileUpdate) -> StoreResult<User> {
    let changed = conn.execute(
        "UPDATE users SET username = ?1, email = ?2, image_url = ?3, \
         header_image_url = ?4, bio = ?5, location = ?6 WHERE id = ?7",
        params![
            update.username.trim(),
            update.email.trim(),
            blank_to_none(&update.image_url),
            blank_to_none(&update.header_image_url),
            blank_to_none(&update.bio),
            blank_to_none(&update.location),
            id
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound);
    }
    get_user(conn, id)
}

/// Delete a user. Messages, follow edges, likes and sessions go with it.
pub fn delete_user(conn: &Connection, id: i64) -> StoreResult<()> {
    let removed = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    if removed == 0 {
        return Err(StoreError::NotFound);
    }
    tracing::info!(user_id = id, "User deleted");
    Ok(())
}

/// Counts shown on a profile header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileStats {
    pub messages: i64,
    pub following: i64,
    pub followers: i64,
    pub likes: i64,
}

pub fn profile_stats(conn: &Connection, id: i64) -> StoreResult<ProfileStats> {
    let stats = conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM messages WHERE user_id = ?1),
            (SELECT COUNT(*) FROM follows WHERE user_following_id = ?1),
            (SELECT COUNT(*) FROM follows WHERE user_being_followed_id = ?1),
            (SELECT COUNT(*) FROM likes WHERE user_id = ?1)",
        params![id],
        |row| {
            Ok(ProfileStats {
                messages: row.get(0)?,
                following: row.get(1)?,
                followers: row.get(2)?,
                likes: row.get(3)?,
            })
        },
    )?;
    Ok(stats)
}
