use crate::config::Config;
use crate::model::Book;
use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase, Row};
use std::path::Path;
use std::time::Duration;

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

const MIGRATIONS: &[(&str, &str)] = &[("001_schema.sql", include_str!("migrations/001_schema.sql"))];

const SEED_BOOKS: (&str, &str) = ("seed_books.sql", include_str!("migrations/seed_books.sql"));

const IN_MEMORY: &str = ":memory:";

/// The book store. Every call goes to the database; nothing is cached.
pub struct Database {
    db: LibsqlDatabase,
    conn: Connection,
    turso_url: Option<String>,
    turso_auth_token: Option<String>,
}

impl Database {
    pub fn is_replica(turso_url: &Option<String>, turso_auth_token: &Option<String>) -> bool {
        turso_url.is_some() && turso_auth_token.is_some()
    }

    pub async fn sync(&self) -> Result<()> {
        if Self::is_replica(&self.turso_url, &self.turso_auth_token) {
            self.db
                .sync()
                .await
                .map_err(|e| anyhow::anyhow!("sync failed: {}", e))?;
        }
        Ok(())
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let turso_url = cfg.app.turso_url.clone();
        let turso_auth_token = cfg.app.turso_auth_token.clone();

        let db = match (&turso_url, &turso_auth_token) {
            (Some(url), Some(token)) => {
                let path = data_dir.join(cfg.app.get_db());
                tracing::info!("[db] running in synced database mode (offline writes)");
                let sync_interval = Duration::from_secs(cfg.app.sync_interval_seconds);
                Builder::new_synced_database(&path, url.clone(), token.clone())
                    .sync_interval(sync_interval)
                    .build()
                    .await?
            }
            _ if cfg.app.get_db() == IN_MEMORY => {
                tracing::info!("[db] running with an in-memory database");
                Builder::new_local(IN_MEMORY).build().await?
            }
            _ => Builder::new_local(data_dir.join(cfg.app.get_db())).build().await?,
        };

        Self::open(db, turso_url, turso_auth_token, cfg.app.seed_books).await
    }

    /// A migrated in-memory store, optionally holding the demo catalog.
    pub async fn in_memory(seed_books: bool) -> Result<Self> {
        let db = Builder::new_local(IN_MEMORY).build().await?;
        Self::open(db, None, None, seed_books).await
    }

    async fn open(
        db: LibsqlDatabase,
        turso_url: Option<String>,
        turso_auth_token: Option<String>,
        seed_books: bool,
    ) -> Result<Self> {
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS.iter().chain(MIGRATIONS) {
            Self::run_migration(&conn, filename, sql).await?;
        }

        if seed_books {
            let (filename, sql) = SEED_BOOKS;
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database {
            db,
            conn,
            turso_url,
            turso_auth_token,
        })
    }

    fn book_from_row(row: &Row) -> Result<Book> {
        Ok(Book {
            id: Some(row.get::<i64>(0)?),
            title: row.get(1)?,
            author: row.get(2)?,
        })
    }

    async fn query_books(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<Vec<Book>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut books: Vec<Book> = vec![];

        while let Some(row) = rows.next().await? {
            books.push(Self::book_from_row(&row)?);
        }

        Ok(books)
    }

    pub async fn find_all(&self) -> Result<Vec<Book>> {
        self.query_books("SELECT id, title, author FROM books ORDER BY id", ())
            .await
    }

    pub async fn find_by_id(&self, book_id: i64) -> Result<Option<Book>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, title, author FROM books WHERE id = ?",
                libsql::params![book_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::book_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Inserts a book without an id, or overwrites the row with the given id.
    /// Returns the persisted state.
    pub async fn save(&self, book: &Book) -> Result<Book> {
        let mut rows = match book.id {
            None => {
                let insert = r#"
                    INSERT INTO books (title, author)
                    VALUES (?, ?)
                    RETURNING id, title, author
                "#;
                self.conn
                    .query(insert, libsql::params![book.title.as_str(), book.author.as_str()])
                    .await?
            }
            Some(id) => {
                let upsert = r#"
                    INSERT INTO books (id, title, author)
                    VALUES (?, ?, ?)
                    ON CONFLICT(id) DO UPDATE SET title = excluded.title, author = excluded.author
                    RETURNING id, title, author
                "#;
                self.conn
                    .query(upsert, libsql::params![id, book.title.as_str(), book.author.as_str()])
                    .await?
            }
        };

        if let Some(row) = rows.next().await? {
            Self::book_from_row(&row)
        } else {
            anyhow::bail!("failed to save book: {}", book.title)
        }
    }

    // instr() is case-sensitive and treats % and _ literally, unlike LIKE.
    pub async fn find_by_title_containing(&self, title: &str) -> Result<Vec<Book>> {
        self.query_books(
            "SELECT id, title, author FROM books WHERE instr(title, ?) > 0 ORDER BY id",
            libsql::params![title],
        )
        .await
    }

    pub async fn find_by_author_containing(&self, author: &str) -> Result<Vec<Book>> {
        self.query_books(
            "SELECT id, title, author FROM books WHERE instr(author, ?) > 0 ORDER BY id",
            libsql::params![author],
        )
        .await
    }

    pub async fn find_by_author(&self, author: &str) -> Result<Vec<Book>> {
        self.query_books(
            "SELECT id, title, author FROM books WHERE author = ? ORDER BY id",
            libsql::params![author],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(books: &[Book]) -> Vec<i64> {
        books.iter().filter_map(|b| b.id).collect()
    }

    #[tokio::test]
    async fn test_seed_is_applied_in_order() {
        let db = Database::in_memory(true).await.unwrap();
        let books = db.find_all().await.unwrap();
        assert_eq!(ids(&books), vec![1, 2, 3, 4]);
        assert_eq!(books[0], Book { id: Some(1), ..Book::new("Refactoring", "Martin Fowler") });
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::in_memory(true).await.unwrap();
        for (filename, sql) in SYSTEM_MIGRATIONS.iter().chain(MIGRATIONS) {
            Database::run_migration(&db.conn, filename, sql).await.unwrap();
        }
        let (filename, sql) = SEED_BOOKS;
        Database::run_migration(&db.conn, filename, sql).await.unwrap();

        assert_eq!(db.find_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_save_assigns_fresh_ids() {
        let db = Database::in_memory(false).await.unwrap();
        let first = db.save(&Book::new("java code", "john smith")).await.unwrap();
        let second = db.save(&Book::new("java code", "john smith")).await.unwrap();

        assert!(first.id.is_some());
        assert_ne!(first.id, second.id);
        assert_eq!(first.title, "java code");
    }

    #[tokio::test]
    async fn test_save_with_id_overwrites() {
        let db = Database::in_memory(true).await.unwrap();
        let updated = db
            .save(&Book { id: Some(1), ..Book::new("Refactoring2", "Martin Fowler") })
            .await
            .unwrap();

        assert_eq!(updated.id, Some(1));
        assert_eq!(db.find_by_id(1).await.unwrap(), Some(updated));
        assert_eq!(db.find_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_find_by_id_absent() {
        let db = Database::in_memory(true).await.unwrap();
        assert_eq!(db.find_by_id(999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_substring_search_is_case_sensitive() {
        let db = Database::in_memory(true).await.unwrap();

        assert_eq!(ids(&db.find_by_title_containing("Clean").await.unwrap()), vec![2, 3, 4]);
        assert!(db.find_by_title_containing("clean").await.unwrap().is_empty());
        assert_eq!(ids(&db.find_by_author_containing("Robert").await.unwrap()), vec![2, 3, 4]);
        assert!(db.find_by_author_containing("hoge").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_like_wildcards_are_literal() {
        let db = Database::in_memory(true).await.unwrap();
        db.save(&Book::new("100% Rust", "Ferris")).await.unwrap();

        assert_eq!(db.find_by_title_containing("%").await.unwrap().len(), 1);
        assert!(db.find_by_title_containing("_").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_author_is_exact() {
        let db = Database::in_memory(true).await.unwrap();

        assert_eq!(ids(&db.find_by_author("Robert Martin").await.unwrap()), vec![2, 3, 4]);
        assert!(db.find_by_author("Robert").await.unwrap().is_empty());
    }
}
