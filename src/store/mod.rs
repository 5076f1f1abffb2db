//! SQLite persistence for accounts, content, entitlement and like
//! records.
//!
//! A single database file holds the whole off-chain state. WAL mode and
//! enforced foreign keys are mandatory; the schema version lives in
//! `PRAGMA user_version`. [`Store`] wraps the connection behind a mutex
//! and exposes the operations the UI layer calls, each returning a
//! `Result` instead of panicking.

pub mod migrations;
pub mod queries;
pub mod schema;

use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use queries::posts::{ListParams, Post, PostPage};
use queries::users::User;
use queries::views::{PostViewStats, View, ViewHistoryEntry};

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Open or create the database at the given path.
///
/// Configures WAL mode, foreign keys, and runs any pending migrations.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a migration fails.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
///
/// # Errors
///
/// Returns an error if a migration fails.
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

/// Whether a SQLite error is a UNIQUE (or primary key) constraint
/// violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Shared handle to the service database.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open or create the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or a migration
    /// fails.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(open(path)?)),
        })
    }

    /// Open an in-memory store (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub fn open_memory() -> Result<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(open_memory()?)),
        })
    }

    // ---- Accounts ----

    /// Sign an account in, creating it on first contact.
    ///
    /// When a wallet address is supplied and an account already carries
    /// it, that account is returned instead of creating a duplicate.
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be created.
    pub async fn sign_in(&self, address: Option<&str>, username: Option<&str>) -> Result<User> {
        let conn = self.conn.lock();

        if let Some(address) = address {
            if let Some(existing) = queries::users::get_by_address(&conn, address)? {
                debug!("Sign-in matched existing account {}", existing.id);
                return Ok(existing);
            }
        }

        let user = User {
            id: new_id(),
            address: address.map(String::from),
            username: username.map(String::from),
            created_at: now(),
        };
        queries::users::insert(&conn, &user)?;
        debug!("Created account {}", user.id);
        Ok(user)
    }

    /// Fetch an account by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such account exists.
    pub async fn user(&self, user_id: &str) -> Result<User> {
        let conn = self.conn.lock();
        queries::users::get(&conn, user_id)?
            .ok_or_else(|| Error::NotFound(format!("user {user_id} not found")))
    }

    /// Update an account's display name and/or wallet address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such account exists.
    pub async fn update_profile(
        &self,
        user_id: &str,
        username: Option<&str>,
        address: Option<&str>,
    ) -> Result<User> {
        let conn = self.conn.lock();
        queries::users::update_profile(&conn, user_id, username, address)?;
        queries::users::get(&conn, user_id)?
            .ok_or_else(|| Error::NotFound(format!("user {user_id} not found")))
    }

    // ---- Content ----

    /// Publish a new content item.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty locator or negative
    /// price, or [`Error::NotFound`] if the creator account is missing.
    pub async fn create_post(
        &self,
        user_id: &str,
        ipfs: &str,
        description: &str,
        price: f64,
        creator_address: Option<&str>,
    ) -> Result<Post> {
        if ipfs.is_empty() {
            return Err(Error::Validation("content locator is required".into()));
        }
        if !price.is_finite() || price < 0.0 {
            return Err(Error::Validation(
                "price must be a non-negative number".into(),
            ));
        }

        let conn = self.conn.lock();
        if queries::users::get(&conn, user_id)?.is_none() {
            return Err(Error::NotFound(format!("user {user_id} not found")));
        }

        let post = Post {
            id: new_id(),
            user_id: user_id.to_string(),
            ipfs: ipfs.to_string(),
            description: description.to_string(),
            price,
            creator_address: creator_address.map(String::from),
            like_count: 0,
            created_at: now(),
        };
        queries::posts::insert(&conn, &post)?;
        Ok(post)
    }

    /// Fetch a content item by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such content exists.
    pub async fn post(&self, post_id: &str) -> Result<Post> {
        let conn = self.conn.lock();
        queries::posts::get(&conn, post_id)?
            .ok_or_else(|| Error::NotFound(format!("post {post_id} not found")))
    }

    /// List the catalog with search, sort and pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_posts(&self, params: &ListParams) -> Result<PostPage> {
        let conn = self.conn.lock();
        queries::posts::list(&conn, params)
    }

    /// List one creator's content.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn posts_by_user(&self, user_id: &str, params: &ListParams) -> Result<PostPage> {
        let conn = self.conn.lock();
        queries::posts::list_by_user(&conn, user_id, params)
    }

    // ---- Entitlement records ----

    /// Persist an entitlement record for a confirmed purchase.
    ///
    /// All preconditions must pass before any side effect: positive
    /// amount, existing account, existing content, and no prior record
    /// for the pair.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive amount,
    /// [`Error::NotFound`] for a missing account or content, or
    /// [`Error::AlreadyViewed`] for a duplicate pair.
    pub async fn create_view_content(
        &self,
        user_id: &str,
        post_id: &str,
        amount: f64,
        is_base_pay: bool,
    ) -> Result<View> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::Validation(
                "userId, postId, and positive amount are required".into(),
            ));
        }

        let conn = self.conn.lock();
        if queries::users::get(&conn, user_id)?.is_none() {
            return Err(Error::NotFound(format!("user {user_id} not found")));
        }
        if queries::posts::get(&conn, post_id)?.is_none() {
            return Err(Error::NotFound(format!("post {post_id} not found")));
        }

        let view = View {
            id: new_id(),
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
            amount,
            is_base_pay,
            created_at: now(),
        };
        match queries::views::insert(&conn, &view) {
            Ok(()) => Ok(view),
            Err(Error::Sqlite(e)) => {
                warn!("Failed to record view content: {e}");
                Err(Error::Sqlite(e))
            }
            Err(e) => Err(e),
        }
    }

    /// Check whether an account holds an entitlement record for a
    /// content item.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub async fn has_viewed(&self, user_id: &str, post_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        queries::views::exists(&conn, user_id, post_id)
    }

    /// Fetch an account's purchase history, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn user_view_history(&self, user_id: &str) -> Result<Vec<ViewHistoryEntry>> {
        let conn = self.conn.lock();
        queries::views::user_history(&conn, user_id)
    }

    /// Aggregate view statistics for one content item.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn post_view_stats(&self, post_id: &str) -> Result<PostViewStats> {
        let conn = self.conn.lock();
        queries::views::post_stats(&conn, post_id)
    }

    // ---- Likes ----

    /// Like a content item.
    ///
    /// Returns the new like count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyLiked`] if this account already likes
    /// this content.
    pub async fn like_post(&self, post_id: &str, user_id: &str) -> Result<i64> {
        let mut conn = self.conn.lock();
        queries::likes::like(&mut conn, post_id, user_id, &new_id(), now())
    }

    /// Unlike a content item.
    ///
    /// Returns the new like count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLiked`] if no like record exists.
    pub async fn unlike_post(&self, post_id: &str, user_id: &str) -> Result<i64> {
        let mut conn = self.conn.lock();
        queries::likes::unlike(&mut conn, post_id, user_id)
    }
}
