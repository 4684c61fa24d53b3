//! Directed follow edges between users.
//!
//! An edge `(follower, followed)` is stored once; following someone says
//! nothing about whether they follow you back.

use rusqlite::{params, Connection};

use crate::db::models::User;
use crate::db::StoreResult;

/// Add the edge `follower -> followed`. Returns `false` if it already existed.
pub fn follow(conn: &Connection, follower: i64, followed: i64) -> StoreResult<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO follows (user_being_followed_id, user_following_id) VALUES (?1, ?2)",
        params![followed, follower],
    )?;
    if inserted > 0 {
        tracing::info!(follower, followed, "Follow added");
    }
    Ok(inserted > 0)
}

/// Remove the edge `follower -> followed`. Returns `false` if there was none.
pub fn unfollow(conn: &Connection, follower: i64, followed: i64) -> StoreResult<bool> {
    let removed = conn.execute(
        "DELETE FROM follows WHERE user_being_followed_id = ?1 AND user_following_id = ?2",
        params![followed, follower],
    )?;
    if removed > 0 {
        tracing::info!(follower, followed, "Follow removed");
    }
    Ok(removed > 0)
}

/// Is `user` following `other`?
pub fn is_following(conn: &Connection, user: i64, other: i64) -> StoreResult<bool> {
    let found = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE user_following_id = ?1 AND user_being_followed_id = ?2)",
        params![user, other],
        |row| row.get(0),
    )?;
    Ok(found)
}

/// Is `user` followed by `other`?
pub fn is_followed_by(conn: &Connection, user: i64, other: i64) -> StoreResult<bool> {
    let found = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE user_being_followed_id = ?1 AND user_following_id = ?2)",
        params![user, other],
        |row| row.get(0),
    )?;
    Ok(found)
}

/// Users following `user`.
pub fn followers(conn: &Connection, user: i64) -> StoreResult<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM follows JOIN users ON users.id = follows.user_following_id \
         WHERE follows.user_being_followed_id = ?1 ORDER BY users.id",
        User::COLUMNS
    ))?;
    let rows = stmt.query_map(params![user], User::from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Users `user` follows.
pub fn following(conn: &Connection, user: i64) -> StoreResult<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM follows JOIN users ON users.id = follows.user_being_followed_id \
         WHERE follows.user_following_id = ?1 ORDER BY users.id",
        User::COLUMNS
    ))?;
    let rows = stmt.query_map(params![user], User::from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Ids of everyone `user` follows.
pub fn following_ids(conn: &Connection, user: i64) -> StoreResult<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT user_being_followed_id FROM follows WHERE user_following_id = ?1",
    )?;
    let rows = stmt.query_map(params![user], |row| row.get(0))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
