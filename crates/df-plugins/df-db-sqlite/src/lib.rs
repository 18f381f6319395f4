//! # df-db-sqlite
//!
//! SQLite implementation of every df-core store port.
//!
//! Each document collection is a table; embedded arrays (vote sets, tag
//! lists, saved lists) are link tables whose primary keys give them set
//! semantics. Every port method is one logical update, wrapped in a
//! transaction where it touches more than one row.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use df_core::error::AppError;
use df_core::pagination::Window;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::info;
use uuid::Uuid;

mod answers;
mod interactions;
mod questions;
mod tags;
mod users;
mod votes;

/// One shared pool, created once at start-up and handed to every service.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects with a small default pool and runs the embedded migrations.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        Self::connect(url, 5).await
    }

    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // An in-memory database lives as long as its connection, so keep
        // exactly one open for the life of the pool.
        let pool = if url.contains(":memory:") || url.contains("mode=memory") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(options)
                .await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(url, "sqlite store ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub(crate) fn micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

pub(crate) fn from_micros(value: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(value).unwrap_or_default()
}

/// `%text%` with LIKE wildcards in the input escaped by `\`.
pub(crate) fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Lowercase key stored next to case-insensitive text.
pub(crate) fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Appends ` AND (col1 LIKE ? OR col2 LIKE ? ...)` for a search term.
/// `columns` must be `*_key` columns holding [`fold`]ed text.
pub(crate) fn push_search(qb: &mut QueryBuilder<'static, Sqlite>, columns: &[&str], text: &str) {
    let pattern = like_pattern(&fold(text));
    qb.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(*column).push(" LIKE ").push_bind(pattern.clone()).push(" ESCAPE '\\'");
    }
    qb.push(")");
}

pub(crate) fn push_window(qb: &mut QueryBuilder<'static, Sqlite>, window: Window) {
    qb.push(" LIMIT ")
        .push_bind(i64::try_from(window.limit).unwrap_or(i64::MAX))
        .push(" OFFSET ")
        .push_bind(i64::try_from(window.skip).unwrap_or(i64::MAX));
}

/// Maps a uniqueness violation onto `AppError::Creation`.
pub(crate) fn creation_error(err: sqlx::Error, what: &str) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Creation(format!("{what}: {}", db.message())).into()
        }
        _ => anyhow::Error::new(err).context(format!("{what} failed")),
    }
}

/// Runs a single-column id query and wraps each id in its newtype.
pub(crate) async fn id_list<T: From<Uuid>>(
    conn: &mut SqliteConnection,
    sql: &str,
    key: Uuid,
) -> sqlx::Result<Vec<T>> {
    let ids: Vec<Uuid> = sqlx::query_scalar(sql).bind(key).fetch_all(&mut *conn).await?;
    Ok(ids.into_iter().map(T::from).collect())
}
