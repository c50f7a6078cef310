//! SQLite record store

use super::RecordStore;
use crate::error::{Error, Result};
use crate::types::{BlogRecord, RecordStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool};
use sqlx::{FromRow, SqliteConnection};
use std::path::Path;
use std::str::FromStr;

/// SQLite primary result codes that mean "try again later"
///
/// Extended codes carry the primary code in their low byte.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Record store backed by a local SQLite database
///
/// The `blog_records` table is created through versioned migrations tracked
/// in `schema_version`. List fields are stored as JSON text.
#[derive(Clone, Debug)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct RecordRow {
    id: String,
    slug: String,
    title: String,
    body: String,
    description: String,
    keywords: String,
    keyword: String,
    tags: String,
    image_urls: String,
    author: String,
    avatar: String,
    color: String,
    org: String,
    card: String,
    cover: String,
    status: String,
    published: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<RecordRow> for BlogRecord {
    type Error = Error;

    fn try_from(row: RecordRow) -> Result<Self> {
        let timestamp = |raw: &str| -> Result<DateTime<Utc>> {
            DateTime::parse_from_rfc3339(raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| Error::Parse {
                    service: "record-store",
                    reason: format!("record {}: stored timestamp '{raw}' is invalid: {e}", row.id),
                })
        };
        let created_at = timestamp(&row.created_at)?;
        let updated_at = timestamp(&row.updated_at)?;
        let status = match row.status.as_str() {
            "complete" => RecordStatus::Complete,
            "partial" => RecordStatus::Partial,
            other => {
                return Err(Error::Parse {
                    service: "record-store",
                    reason: format!("record {}: unknown status '{other}'", row.id),
                });
            }
        };

        Ok(BlogRecord {
            keywords: serde_json::from_str(&row.keywords)?,
            tags: serde_json::from_str(&row.tags)?,
            image_urls: serde_json::from_str(&row.image_urls)?,
            id: row.id,
            slug: row.slug,
            title: row.title,
            body: row.body,
            description: row.description,
            keyword: row.keyword,
            author: row.author,
            avatar: row.avatar,
            color: row.color,
            org: row.org,
            card: row.card,
            cover: row.cover,
            status,
            published: row.published,
            created_at,
            updated_at,
        })
    }
}

impl SqliteRecordStore {
    /// Open (or create) the database at `path` and apply migrations
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options).await?;
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Fetch a stored record by id
    pub async fn get(&self, id: &str) -> Result<Option<BlogRecord>> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT id, slug, title, body, description, keywords, keyword, tags,
                   image_urls, author, avatar, color, org, card, cover, status,
                   published, created_at, updated_at
            FROM blog_records
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BlogRecord::try_from).transpose()
    }

    /// Number of stored records
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM blog_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn run_migrations(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;

        let current_version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
                .fetch_one(&mut *conn)
                .await?;

        let current_version = current_version.unwrap_or(0);
        if current_version < 1 {
            Self::migrate_v1(&mut conn).await?;
        }
        if current_version < 2 {
            Self::migrate_v2(&mut conn).await?;
        }

        Ok(())
    }

    /// Migration v1: blog_records table
    async fn migrate_v1(conn: &mut SqliteConnection) -> Result<()> {
        tracing::info!("applying record store migration v1");

        sqlx::query("BEGIN").execute(&mut *conn).await?;

        let result = async {
            sqlx::query(
                r#"
                CREATE TABLE blog_records (
                    id TEXT PRIMARY KEY NOT NULL,
                    slug TEXT NOT NULL,
                    title TEXT NOT NULL,
                    body TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    keywords TEXT NOT NULL DEFAULT '[]',
                    keyword TEXT NOT NULL DEFAULT '',
                    tags TEXT NOT NULL DEFAULT '[]',
                    image_urls TEXT NOT NULL DEFAULT '[]',
                    author TEXT NOT NULL,
                    avatar TEXT NOT NULL,
                    color TEXT NOT NULL,
                    status TEXT NOT NULL,
                    published INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )
                "#,
            )
            .execute(&mut *conn)
            .await?;

            sqlx::query("CREATE INDEX idx_blog_records_created_at ON blog_records(created_at)")
                .execute(&mut *conn)
                .await?;

            sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (?, ?)")
                .bind(1i64)
                .bind(Utc::now().timestamp())
                .execute(&mut *conn)
                .await?;

            Ok::<(), Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
            }
            Err(e) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                return Err(e);
            }
        }

        tracing::info!("record store migration v1 complete");
        Ok(())
    }

    /// Migration v2: rendition URL columns
    async fn migrate_v2(conn: &mut SqliteConnection) -> Result<()> {
        tracing::info!("applying record store migration v2");

        sqlx::query("BEGIN").execute(&mut *conn).await?;

        let result = async {
            for column in ["org", "card", "cover"] {
                sqlx::query(&format!(
                    "ALTER TABLE blog_records ADD COLUMN {column} TEXT NOT NULL DEFAULT ''"
                ))
                .execute(&mut *conn)
                .await?;
            }

            sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (?, ?)")
                .bind(2i64)
                .bind(Utc::now().timestamp())
                .execute(&mut *conn)
                .await?;

            Ok::<(), Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
            }
            Err(e) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                return Err(e);
            }
        }

        tracing::info!("record store migration v2 complete");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn write(&self, record: &BlogRecord) -> Result<String> {
        sqlx::query(
            r#"
            INSERT INTO blog_records (
                id, slug, title, body, description, keywords, keyword, tags,
                image_urls, author, avatar, color, org, card, cover, status,
                published, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.slug)
        .bind(&record.title)
        .bind(&record.body)
        .bind(&record.description)
        .bind(serde_json::to_string(&record.keywords)?)
        .bind(&record.keyword)
        .bind(serde_json::to_string(&record.tags)?)
        .bind(serde_json::to_string(&record.image_urls)?)
        .bind(&record.author)
        .bind(&record.avatar)
        .bind(&record.color)
        .bind(&record.org)
        .bind(&record.card)
        .bind(&record.cover)
        .bind(record.status.as_str())
        .bind(record.published)
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Write {
            id: record.id.clone(),
            transient: is_transient(&e),
            reason: e.to_string(),
        })?;

        Ok(record.id.clone())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

/// Busy/locked databases and pool exhaustion are transient; constraint
/// violations (including a duplicate id) are not
pub(crate) fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            !db.is_unique_violation() && db.code().is_some_and(|code| is_transient_code(&code))
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => true,
        _ => false,
    }
}

/// Whether a (possibly extended) SQLite result code is busy or locked
pub(crate) fn is_transient_code(code: &str) -> bool {
    code.parse::<i32>()
        .is_ok_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}
