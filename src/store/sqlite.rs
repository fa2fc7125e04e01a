use super::{ArticleStore, UpsertResult};
use crate::error::{CrawlError, UpsertError};
use crate::models::ArticleRecord;
use sqlx::Row;
use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS collection (
        title TEXT PRIMARY KEY NOT NULL CHECK (length(trim(title)) > 0),
        body TEXT NOT NULL CHECK (length(body) > 0),
        url TEXT NOT NULL,
        country TEXT NOT NULL,
        source_name TEXT NOT NULL,
        city TEXT,
        published_on TEXT
    )
    "#,
    // Add future migrations here
];

const UPSERT: &str = r#"
    INSERT INTO collection (title, body, url, country, source_name, city, published_on)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(title) DO UPDATE SET
        body = excluded.body,
        url = excluded.url,
        country = excluded.country,
        source_name = excluded.source_name,
        city = excluded.city,
        published_on = excluded.published_on
"#;

/// Article corpus in a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `db_path` and apply the schema.
    ///
    /// Missing parent directories are created. The schema statements are
    /// idempotent, so reopening an existing corpus keeps its rows.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Location of the SQLite file
    ///
    /// # Errors
    ///
    /// [`CrawlError::Io`] if the parent directory cannot be created,
    /// [`CrawlError::Store`] if the file cannot be opened or migrated.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let store = SqliteStore::open(Path::new("data/corpus.db")).await?;
    /// println!("{} articles", store.count().await?);
    /// ```
    #[instrument(level = "info", skip_all, fields(path = %db_path.display()))]
    pub async fn open(db_path: &Path) -> Result<Self, CrawlError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            debug!(migration = i, "Applying migration");
            sqlx::query(migration).execute(&pool).await?;
        }
        info!("Article store ready");

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    async fn upsert_one(&self, record: &ArticleRecord) -> Result<(), UpsertError> {
        sqlx::query(UPSERT)
            .bind(&record.title)
            .bind(&record.body)
            .bind(&record.url)
            .bind(&record.country)
            .bind(&record.source_name)
            .bind(record.city.as_deref())
            .bind(record.published_on)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(classify)
    }
}

impl ArticleStore for SqliteStore {
    #[instrument(level = "info", skip_all, fields(records = batch.len()))]
    async fn upsert(&self, batch: &[ArticleRecord]) -> UpsertResult {
        let mut result = UpsertResult::default();
        for record in batch {
            let outcome = self.upsert_one(record).await;
            result.record(record, outcome);
        }
        info!(
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            "Upserted batch"
        );
        result
    }

    async fn get(&self, title: &str) -> Result<Option<ArticleRecord>, UpsertError> {
        let row = sqlx::query(
            r#"
            SELECT title, body, url, country, source_name, city, published_on
            FROM collection
            WHERE title = ?
            "#,
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        row.map(|row| -> Result<ArticleRecord, sqlx::Error> {
            Ok(ArticleRecord {
                title: row.try_get("title")?,
                body: row.try_get("body")?,
                url: row.try_get("url")?,
                country: row.try_get("country")?,
                source_name: row.try_get("source_name")?,
                city: row.try_get("city")?,
                published_on: row.try_get("published_on")?,
            })
        })
        .transpose()
        .map_err(classify)
    }

    async fn count(&self) -> Result<usize, UpsertError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM collection")
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        Ok(n as usize)
    }
}

/// Constraint violations are the record's fault; everything else is the store's.
fn classify(e: sqlx::Error) -> UpsertError {
    if let sqlx::Error::Database(db) = &e {
        match db.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => {
                return UpsertError::Constraint(db.message().to_string());
            }
            _ => {}
        }
    }
    UpsertError::Connectivity(e.to_string())
}
