//! Like record query functions.
//!
//! The like row and the denormalized `posts.like_count` counter are
//! written inside one transaction so a partial failure can never leave
//! them disagreeing.

use rusqlite::Connection;

use crate::error::{Error, Result};
use crate::store::is_unique_violation;

/// Insert a like record and bump the content's counter.
///
/// Returns the new like count, or [`Error::AlreadyLiked`] if this
/// account already likes this content.
pub fn like(
    conn: &mut Connection,
    post_id: &str,
    user_id: &str,
    like_id: &str,
    created_at: i64,
) -> Result<i64> {
    let tx = conn.transaction()?;

    let inserted = tx.execute(
        "INSERT INTO likes (id, user_id, post_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![like_id, user_id, post_id, created_at],
    );
    match inserted {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => return Err(Error::AlreadyLiked),
        Err(e) => return Err(e.into()),
    }

    let updated = tx.execute(
        "UPDATE posts SET like_count = like_count + 1 WHERE id = ?1",
        [post_id],
    )?;
    if updated == 0 {
        return Err(Error::NotFound(format!("post {post_id} not found")));
    }

    let count = current_count(&tx, post_id)?;
    tx.commit()?;
    Ok(count)
}

/// Delete a like record and decrement the content's counter, clamped
/// at zero.
///
/// Returns the new like count, or [`Error::NotLiked`] if no record
/// links this account and content.
pub fn unlike(conn: &mut Connection, post_id: &str, user_id: &str) -> Result<i64> {
    let tx = conn.transaction()?;

    let deleted = tx.execute(
        "DELETE FROM likes WHERE user_id = ?1 AND post_id = ?2",
        [user_id, post_id],
    )?;
    if deleted == 0 {
        return Err(Error::NotLiked);
    }

    let updated = tx.execute(
        "UPDATE posts SET like_count = MAX(like_count - 1, 0) WHERE id = ?1",
        [post_id],
    )?;
    if updated == 0 {
        return Err(Error::NotFound(format!("post {post_id} not found")));
    }

    let count = current_count(&tx, post_id)?;
    tx.commit()?;
    Ok(count)
}

fn current_count(conn: &Connection, post_id: &str) -> Result<i64> {
    conn.query_row("SELECT like_count FROM posts WHERE id = ?1", [post_id], |row| {
        row.get(0)
    })
    .map_err(Error::from)
}
