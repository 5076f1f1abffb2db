//! Account query functions.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};

/// An account row.
#[derive(Debug, Clone)]
pub struct User {
    /// Account identifier.
    pub id: String,
    /// Wallet address, attached on or after first sign-in.
    pub address: Option<String>,
    /// Display name.
    pub username: Option<String>,
    /// Creation time, Unix seconds.
    pub created_at: i64,
}

/// Insert an account.
pub fn insert(conn: &Connection, user: &User) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, address, username, created_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![user.id, user.address, user.username, user.created_at],
    )?;
    Ok(())
}

/// Fetch an account by id.
pub fn get(conn: &Connection, id: &str) -> Result<Option<User>> {
    conn.query_row(
        "SELECT id, address, username, created_at FROM users WHERE id = ?1",
        [id],
        row_to_user,
    )
    .optional()
    .map_err(Error::from)
}

/// Fetch an account by wallet address.
pub fn get_by_address(conn: &Connection, address: &str) -> Result<Option<User>> {
    conn.query_row(
        "SELECT id, address, username, created_at FROM users WHERE address = ?1",
        [address],
        row_to_user,
    )
    .optional()
    .map_err(Error::from)
}

/// Update display name and/or wallet address. Fields passed as `None`
/// keep their current value.
pub fn update_profile(
    conn: &Connection,
    id: &str,
    username: Option<&str>,
    address: Option<&str>,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE users SET
            username = COALESCE(?2, username),
            address = COALESCE(?3, address)
         WHERE id = ?1",
        rusqlite::params![id, username, address],
    )?;
    if updated == 0 {
        return Err(Error::NotFound(format!("user {id} not found")));
    }
    Ok(())
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        address: row.get(1)?,
        username: row.get(2)?,
        created_at: row.get(3)?,
    })
}
