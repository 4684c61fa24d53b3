//! Messages and likes.
//!
//! A (user, message) pair is either liked or not, and the only way to move
//! between the two is [`toggle_like`].

use std::collections::HashSet;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::db::models::{FeedEntry, Like, Message, MESSAGE_MAX_LEN};
use crate::db::{StoreError, StoreResult};

/// Most messages shown on a timeline.
pub const TIMELINE_LIMIT: i64 = 100;

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Liked,
    Unliked,
}

/// Why a message body was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MessageTextError {
    #[error("Message cannot be empty")]
    Empty,
    #[error("Message is longer than 140 characters")]
    TooLong,
}

pub fn validate_text(text: &str) -> Result<&str, MessageTextError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(MessageTextError::Empty);
    }
    if text.chars().count() > MESSAGE_MAX_LEN {
        return Err(MessageTextError::TooLong);
    }
    Ok(text)
}

const FEED_COLUMNS: &str = "messages.id, messages.text, messages.timestamp, messages.user_id, \
                            users.username, users.image_url";

pub fn create_message(conn: &Connection, user_id: i64, text: &str) -> StoreResult<Message> {
    conn.execute(
        "INSERT INTO messages (text, user_id) VALUES (?1, ?2)",
        params![text, user_id],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(user_id, message_id = id, "Message posted");
    get_message(conn, id)
}

pub fn get_message(conn: &Connection, id: i64) -> StoreResult<Message> {
    let message = conn.query_row(
        &format!("SELECT {} FROM messages WHERE id = ?1", Message::COLUMNS),
        params![id],
        Message::from_row,
    )?;
    Ok(message)
}

/// A message with its author's name and avatar.
pub fn get_feed_entry(conn: &Connection, id: i64) -> StoreResult<FeedEntry> {
    let entry = conn.query_row(
        &format!(
            "SELECT {FEED_COLUMNS} FROM messages JOIN users ON users.id = messages.user_id \
             WHERE messages.id = ?1"
        ),
        params![id],
        FeedEntry::from_row,
    )?;
    Ok(entry)
}

pub fn delete_message(conn: &Connection, id: i64) -> StoreResult<()> {
    let removed = conn.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
    if removed == 0 {
        return Err(StoreError::NotFound);
    }
    tracing::info!(message_id = id, "Message deleted");
    Ok(())
}

fn feed_query(conn: &Connection, sql: &str, user_id: i64) -> StoreResult<Vec<FeedEntry>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![user_id, TIMELINE_LIMIT], FeedEntry::from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// A user's own messages, newest first.
pub fn messages_by(conn: &Connection, user_id: i64) -> StoreResult<Vec<FeedEntry>> {
    feed_query(
        conn,
        &format!(
            "SELECT {FEED_COLUMNS} FROM messages JOIN users ON users.id = messages.user_id \
             WHERE messages.user_id = ?1 \
             ORDER BY messages.timestamp DESC, messages.id DESC LIMIT ?2"
        ),
        user_id,
    )
}

/// Messages by `user_id` and everyone they follow, newest first.
pub fn timeline(conn: &Connection, user_id: i64) -> StoreResult<Vec<FeedEntry>> {
    feed_query(
        conn,
        &format!(
            "SELECT {FEED_COLUMNS} FROM messages JOIN users ON users.id = messages.user_id \
             WHERE messages.user_id = ?1 OR messages.user_id IN \
               (SELECT user_being_followed_id FROM follows WHERE user_following_id = ?1) \
             ORDER BY messages.timestamp DESC, messages.id DESC LIMIT ?2"
        ),
        user_id,
    )
}

/// Messages `user_id` has liked, most recently liked first.
pub fn liked_messages(conn: &Connection, user_id: i64) -> StoreResult<Vec<FeedEntry>> {
    feed_query(
        conn,
        &format!(
            "SELECT {FEED_COLUMNS} FROM likes \
             JOIN messages ON messages.id = likes.message_id \
             JOIN users ON users.id = messages.user_id \
             WHERE likes.user_id = ?1 ORDER BY likes.id DESC LIMIT ?2"
        ),
        user_id,
    )
}

pub fn liked_message_ids(conn: &Connection, user_id: i64) -> StoreResult<HashSet<i64>> {
    let mut stmt = conn.prepare("SELECT message_id FROM likes WHERE user_id = ?1")?;
    let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
    Ok(rows.collect::<Result<HashSet<_>, _>>()?)
}

pub fn like_count(conn: &Connection, user_id: i64) -> StoreResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM likes WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Insert a like edge directly. A second like of the same pair is an
/// integrity error.
pub fn add_like(conn: &Connection, user_id: i64, message_id: i64) -> StoreResult<Like> {
    conn.execute(
        "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
        params![user_id, message_id],
    )?;
    Ok(Like {
        id: conn.last_insert_rowid(),
        user_id,
        message_id,
    })
}

/// Like the message if `user_id` hasn't yet, otherwise take the like back.
///
/// Runs in an IMMEDIATE transaction so two concurrent toggles of the same
/// pair serialize instead of both inserting.
pub fn toggle_like(
    conn: &mut Connection,
    user_id: i64,
    message_id: i64,
) -> StoreResult<LikeState> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let message_exists: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM messages WHERE id = ?1)",
        params![message_id],
        |row| row.get(0),
    )?;
    if !message_exists {
        return Err(StoreError::NotFound);
    }

    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM likes WHERE user_id = ?1 AND message_id = ?2",
            params![user_id, message_id],
            |row| row.get(0),
        )
        .optional()?;

    let state = match existing {
        Some(like_id) => {
            tx.execute("DELETE FROM likes WHERE id = ?1", params![like_id])?;
            LikeState::Unliked
        }
        None => {
            add_like(&tx, user_id, message_id)?;
            LikeState::Liked
        }
    };

    tx.commit()?;
    tracing::info!(user_id, message_id, ?state, "Like toggled");
    Ok(state)
}
