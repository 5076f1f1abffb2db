//! Content catalog query functions.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};

/// A content row.
#[derive(Debug, Clone)]
pub struct Post {
    /// Content identifier.
    pub id: String,
    /// Owning account identifier.
    pub user_id: String,
    /// Content locator (opaque URI).
    pub ipfs: String,
    /// Description shown alongside the content.
    pub description: String,
    /// Price in the payment currency unit. Non-positive means free.
    pub price: f64,
    /// Creator payout address for settlement.
    pub creator_address: Option<String>,
    /// Denormalized like counter.
    pub like_count: i64,
    /// Creation time, Unix seconds.
    pub created_at: i64,
}

impl Post {
    /// Whether the content is viewable without payment.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.price <= 0.0
    }
}

/// A content row joined with its author.
#[derive(Debug, Clone)]
pub struct PostWithAuthor {
    /// The content row.
    pub post: Post,
    /// Author display name.
    pub author_username: Option<String>,
    /// Author wallet address.
    pub author_address: Option<String>,
}

/// Sort field for catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    /// Creation timestamp.
    #[default]
    CreatedAt,
    /// Price.
    Price,
    /// Like counter.
    LikeCount,
}

impl SortField {
    // Column names are fixed here so user input can never reach the SQL text.
    fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "p.created_at",
            SortField::Price => "p.price",
            SortField::LikeCount => "p.like_count",
        }
    }
}

/// Sort order for catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

impl SortOrder {
    fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Parameters for paginated catalog listings.
#[derive(Debug, Clone)]
pub struct ListParams {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Case-insensitive search over description and author name.
    pub search: Option<String>,
    /// Sort field.
    pub sort_by: SortField,
    /// Sort order.
    pub sort_order: SortOrder,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

/// One page of catalog results.
#[derive(Debug)]
pub struct PostPage {
    /// Posts on this page.
    pub posts: Vec<PostWithAuthor>,
    /// Total matching rows across all pages.
    pub total_count: i64,
    /// The page these results belong to.
    pub current_page: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

/// Insert a content item.
pub fn insert(conn: &Connection, post: &Post) -> Result<()> {
    conn.execute(
        "INSERT INTO posts
         (id, user_id, ipfs, description, price, creator_address, like_count, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            post.id,
            post.user_id,
            post.ipfs,
            post.description,
            post.price,
            post.creator_address,
            post.like_count,
            post.created_at,
        ],
    )?;
    Ok(())
}

/// Fetch a content item by id.
pub fn get(conn: &Connection, id: &str) -> Result<Option<Post>> {
    conn.query_row(
        "SELECT id, user_id, ipfs, description, price, creator_address, like_count, created_at
         FROM posts WHERE id = ?1",
        [id],
        row_to_post,
    )
    .optional()
    .map_err(Error::from)
}

/// List the catalog with search, sort and pagination.
pub fn list(conn: &Connection, params: &ListParams) -> Result<PostPage> {
    list_filtered(conn, params, None)
}

/// List one creator's content with sort and pagination.
pub fn list_by_user(conn: &Connection, user_id: &str, params: &ListParams) -> Result<PostPage> {
    list_filtered(conn, params, Some(user_id))
}

fn list_filtered(conn: &Connection, params: &ListParams, user_id: Option<&str>) -> Result<PostPage> {
    let page = params.page.max(1);
    let limit = params.limit.max(1);
    let offset = i64::from(page - 1) * i64::from(limit);

    let mut clauses: Vec<&str> = Vec::new();
    let mut bind: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(user_id) = user_id {
        clauses.push("p.user_id = ?");
        bind.push(Box::new(user_id.to_string()));
    }
    if let Some(search) = params.search.as_deref().filter(|s| !s.is_empty()) {
        clauses.push("(p.description LIKE ? OR u.username LIKE ?)");
        let pattern = format!("%{search}%");
        bind.push(Box::new(pattern.clone()));
        bind.push(Box::new(pattern));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let count_sql = format!(
        "SELECT COUNT(*) FROM posts p JOIN users u ON u.id = p.user_id {where_clause}"
    );
    let total_count: i64 = conn.query_row(
        &count_sql,
        rusqlite::params_from_iter(bind.iter().map(|b| b.as_ref())),
        |row| row.get(0),
    )?;

    let list_sql = format!(
        "SELECT p.id, p.user_id, p.ipfs, p.description, p.price, p.creator_address,
                p.like_count, p.created_at, u.username, u.address
         FROM posts p JOIN users u ON u.id = p.user_id
         {where_clause}
         ORDER BY {} {}
         LIMIT ? OFFSET ?",
        params.sort_by.column(),
        params.sort_order.keyword(),
    );
    bind.push(Box::new(i64::from(limit)));
    bind.push(Box::new(offset));

    let mut stmt = conn.prepare(&list_sql)?;
    let posts = stmt
        .query_map(
            rusqlite::params_from_iter(bind.iter().map(|b| b.as_ref())),
            |row| {
                Ok(PostWithAuthor {
                    post: row_to_post(row)?,
                    author_username: row.get(8)?,
                    author_address: row.get(9)?,
                })
            },
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let total_pages = (total_count as u64).div_ceil(u64::from(limit)) as u32;

    Ok(PostPage {
        posts,
        total_count,
        current_page: page,
        total_pages,
    })
}

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        user_id: row.get(1)?,
        ipfs: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        creator_address: row.get(5)?,
        like_count: row.get(6)?,
        created_at: row.get(7)?,
    })
}
