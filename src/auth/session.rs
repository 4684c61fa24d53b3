use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::StoreResult;

/// Create a new session for a user. Returns the session token.
pub fn create_session(conn: &Connection, user_id: i64, hours: u64) -> StoreResult<String> {
    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    tracing::debug!(user_id, "Session created");
    Ok(token)
}

/// Resolve a session token to its user id. Expired and unknown tokens both
/// resolve to `None`.
pub fn lookup_session(conn: &Connection, token: &str) -> StoreResult<Option<i64>> {
    let user_id = conn
        .query_row(
            "SELECT user_id FROM sessions WHERE token = ?1 AND expires_at > datetime('now')",
            params![token],
            |row| row.get(0),
        )
        .optional()?;
    Ok(user_id)
}

/// Delete a session by token.
pub fn delete_session(conn: &Connection, token: &str) -> StoreResult<()> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Remove sessions whose expiry has passed. Returns how many were removed.
pub fn purge_expired(conn: &Connection) -> StoreResult<usize> {
    let removed = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= datetime('now')",
        [],
    )?;
    Ok(removed)
}

// -- Cookie helpers --

pub fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

pub fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
