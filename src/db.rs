// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite storage for users, posts and the tag catalog.

use crate::{
    model::{PostId, PostRecord, User, UserId},
    report::PostSource,
};
use anyhow::{Context, Result};
use camino::Utf8Path;
use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

/// Open (creating if needed) the database at `path` and initialize the schema.
pub fn init_db(path: &Utf8Path) -> Result<Connection> {
    let conn = Connection::open(path.as_std_path())
        .with_context(|| format!("failed to open database at {}", path))?;
    configure(&conn)?;
    Ok(conn)
}

/// Open a private in-memory database with the schema applied.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    configure(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    // journal_mode and synchronous persist in the database file; the rest are
    // per-connection and must be set every time.
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA cache_size = -64000;
        PRAGMA temp_store = MEMORY;
        "#,
    )
    .context("failed to set database pragmas")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY NOT NULL,    -- UUID
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL         -- RFC 3339 UTC, whole seconds
        );

        CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY NOT NULL,    -- UUID
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            content TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]', -- JSON array, denormalized copy of post_tags
            created_at TEXT NOT NULL         -- RFC 3339 UTC, whole seconds
        );

        -- Tag catalog, populated as posts are written
        CREATE TABLE IF NOT EXISTS tags (
            name TEXT PRIMARY KEY NOT NULL
        ) WITHOUT ROWID;

        CREATE TABLE IF NOT EXISTS post_tags (
            post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            tag_name TEXT NOT NULL REFERENCES tags(name) ON DELETE CASCADE,
            PRIMARY KEY (post_id, tag_name)
        ) WITHOUT ROWID;

        -- Fixed-width timestamps compare correctly as text
        CREATE INDEX IF NOT EXISTS idx_posts_user_created ON posts(user_id, created_at);
        "#,
    )
    .context("failed to initialize database schema")?;

    Ok(())
}

/// Render a timestamp the way it is stored. Sub-second precision is dropped.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The first stored timestamp that is not earlier than `at`.
fn lower_bound(at: DateTime<Utc>) -> DateTime<Utc> {
    let whole = at.trunc_subsecs(0);
    if whole < at {
        whole + Duration::seconds(1)
    } else {
        whole
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse timestamp '{}'", s))
}

/// Insert a new user.
pub fn insert_user(
    conn: &Connection,
    email: &str,
    name: &str,
    created_at: DateTime<Utc>,
) -> Result<User> {
    let user = User {
        id: UserId::new(),
        email: email.to_string(),
        name: name.to_string(),
        created_at: created_at.trunc_subsecs(0),
    };
    conn.execute(
        "INSERT INTO users (id, email, name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            user.id.to_string(),
            user.email,
            user.name,
            format_timestamp(user.created_at)
        ],
    )
    .with_context(|| format!("failed to insert user '{}'", email))?;
    Ok(user)
}

type UserRow = (String, String, String, String);

fn read_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn user_from_row((id, email, name, created_at): UserRow) -> Result<User> {
    Ok(User {
        id: id
            .parse()
            .with_context(|| format!("invalid user id '{}' in database", id))?,
        email,
        name,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<User>> {
    let sql = format!(
        "SELECT id, email, name, created_at FROM users WHERE {} = ?1",
        column
    );
    let row = conn
        .query_row(&sql, [value], read_user_row)
        .optional()
        .context("failed to query user")?;
    row.map(user_from_row).transpose()
}

/// Look up a user by id.
pub fn find_user(conn: &Connection, user_id: UserId) -> Result<Option<User>> {
    query_user(conn, "id", &user_id.to_string())
}

/// Look up a user by email address.
pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    query_user(conn, "email", email)
}

/// All users, oldest first.
pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt =
        conn.prepare("SELECT id, email, name, created_at FROM users ORDER BY created_at, email")?;
    let rows = stmt.query_map([], read_user_row)?;

    let mut users = Vec::new();
    for row in rows {
        users.push(user_from_row(row?)?);
    }
    Ok(users)
}

/// A post about to be written.
#[derive(Clone, Debug)]
pub struct NewPost<'a> {
    pub author_id: UserId,
    pub content: &'a str,
    pub tags: &'a [String],
    pub created_at: DateTime<Utc>,
}

/// Trim tags, drop empty ones and repeats, keeping first-seen order.
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Insert a post and register its tags in the catalog.
///
/// The post row, catalog entries and associations are written in one
/// transaction. Catalog rows use `INSERT OR IGNORE`, so concurrent writers
/// introducing the same tag do not conflict.
pub fn insert_post(conn: &Connection, new_post: &NewPost<'_>) -> Result<PostRecord> {
    let post = PostRecord {
        id: PostId::new(),
        author_id: new_post.author_id,
        content: new_post.content.to_string(),
        tags: normalize_tags(new_post.tags),
        created_at: new_post.created_at.trunc_subsecs(0),
    };
    let tags_json = serde_json::to_string(&post.tags).context("failed to encode tags")?;

    let tx = conn
        .unchecked_transaction()
        .context("failed to start transaction")?;
    tx.execute(
        "INSERT INTO posts (id, user_id, content, tags, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            post.id.to_string(),
            post.author_id.to_string(),
            post.content,
            tags_json,
            format_timestamp(post.created_at)
        ],
    )
    .context("failed to insert post")?;

    for tag in &post.tags {
        tx.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", [tag])
            .context("failed to insert tag")?;
        tx.execute(
            "INSERT OR IGNORE INTO post_tags (post_id, tag_name) VALUES (?1, ?2)",
            params![post.id.to_string(), tag],
        )
        .context("failed to link tag")?;
    }
    tx.commit().context("failed to commit post")?;

    debug!(post_id = %post.id, tags = post.tags.len(), "inserted post");
    Ok(post)
}

/// Posts by `user_id` created within `[start, end]`, oldest first.
///
/// Stored timestamps are whole seconds, so `start` is rounded up and `end`
/// rounded down before comparing.
pub fn fetch_posts_for_user_in_range(
    conn: &Connection,
    user_id: UserId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<PostRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, content, tags, created_at
         FROM posts
         WHERE user_id = ?1 AND created_at >= ?2 AND created_at <= ?3
         ORDER BY created_at, id",
    )?;

    let rows = stmt.query_map(
        params![
            user_id.to_string(),
            format_timestamp(lower_bound(start)),
            format_timestamp(end)
        ],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        },
    )?;

    let mut posts = Vec::new();
    for row in rows {
        let (id, author_id, content, tags_json, created_at) = row?;
        posts.push(PostRecord {
            id: id
                .parse()
                .with_context(|| format!("invalid post id '{}' in database", id))?,
            author_id: author_id
                .parse()
                .with_context(|| format!("invalid user id '{}' in database", author_id))?,
            content,
            tags: serde_json::from_str(&tags_json)
                .with_context(|| format!("failed to decode tags of post {}", id))?,
            created_at: parse_timestamp(&created_at)?,
        });
    }

    Ok(posts)
}

/// Every catalog tag with the number of posts carrying it, most used first.
pub fn list_tags(conn: &Connection) -> Result<Vec<(String, u64)>> {
    let mut stmt = conn.prepare(
        "SELECT t.name, COUNT(pt.post_id) AS uses
         FROM tags t LEFT JOIN post_tags pt ON pt.tag_name = t.name
         GROUP BY t.name
         ORDER BY uses DESC, t.name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
    })?;

    let mut tags = Vec::new();
    for row in rows {
        tags.push(row?);
    }
    Ok(tags)
}

/// [`PostSource`] backed by a SQLite connection.
pub struct SqlitePostSource<'a> {
    conn: &'a Connection,
}

impl<'a> SqlitePostSource<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl PostSource for SqlitePostSource<'_> {
    type Error = anyhow::Error;

    fn fetch_posts_for_user_in_range(
        &self,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PostRecord>> {
        fetch_posts_for_user_in_range(self.conn, user_id, start, end)
    }
}
