//! Entitlement record query functions.
//!
//! One `views` row per (account, content) pair marks a confirmed
//! purchase. The UNIQUE index is the concurrency guard: two racing
//! inserts resolve to one row and one `AlreadyViewed`.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::store::is_unique_violation;

/// An entitlement record row.
#[derive(Debug, Clone)]
pub struct View {
    /// Record identifier.
    pub id: String,
    /// Paying account identifier.
    pub user_id: String,
    /// Unlocked content identifier.
    pub post_id: String,
    /// Amount paid.
    pub amount: f64,
    /// Whether this was the base unlocking payment.
    pub is_base_pay: bool,
    /// Creation time, Unix seconds.
    pub created_at: i64,
}

/// An entitlement record joined with its content.
#[derive(Debug, Clone)]
pub struct ViewHistoryEntry {
    /// The entitlement record.
    pub view: View,
    /// Content description.
    pub post_description: String,
    /// Content price at query time.
    pub post_price: f64,
}

/// Aggregate view statistics for one content item.
#[derive(Debug, Clone, Copy)]
pub struct PostViewStats {
    /// Number of entitlement records.
    pub view_count: i64,
    /// Sum of amounts paid.
    pub total_revenue: f64,
}

/// Insert an entitlement record.
///
/// Returns [`Error::AlreadyViewed`] if a record already links this
/// (account, content) pair.
pub fn insert(conn: &Connection, view: &View) -> Result<()> {
    let result = conn.execute(
        "INSERT INTO views (id, user_id, post_id, amount, is_base_pay, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            view.id,
            view.user_id,
            view.post_id,
            view.amount,
            view.is_base_pay,
            view.created_at,
        ],
    );
    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(Error::AlreadyViewed),
        Err(e) => Err(e.into()),
    }
}

/// Check whether an entitlement record links this account and content.
pub fn exists(conn: &Connection, user_id: &str, post_id: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM views WHERE user_id = ?1 AND post_id = ?2",
            [user_id, post_id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Fetch an account's purchase history, most recent first.
pub fn user_history(conn: &Connection, user_id: &str) -> Result<Vec<ViewHistoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT v.id, v.user_id, v.post_id, v.amount, v.is_base_pay, v.created_at,
                p.description, p.price
         FROM views v JOIN posts p ON p.id = v.post_id
         WHERE v.user_id = ?1
         ORDER BY v.created_at DESC",
    )?;

    let rows = stmt
        .query_map([user_id], |row| {
            Ok(ViewHistoryEntry {
                view: View {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    post_id: row.get(2)?,
                    amount: row.get(3)?,
                    is_base_pay: row.get(4)?,
                    created_at: row.get(5)?,
                },
                post_description: row.get(6)?,
                post_price: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Aggregate view count and revenue for one content item.
pub fn post_stats(conn: &Connection, post_id: &str) -> Result<PostViewStats> {
    conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(amount), 0.0) FROM views WHERE post_id = ?1",
        [post_id],
        |row| {
            Ok(PostViewStats {
                view_count: row.get(0)?,
                total_revenue: row.get(1)?,
            })
        },
    )
    .map_err(Error::from)
}
