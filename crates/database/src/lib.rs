use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

pub use sqlx::Error;
pub use sqlx::Result;

static TEST_DB_COUNTER: AtomicU64 = AtomicU64::new(0);

// --- Driver Adapter Pattern ---
pub type Driver = Sqlite;
pub type Connection = sqlx::SqliteConnection;
pub type Pool = SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Infrastructure(sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Resource not found")]
    NotFound,
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            _ => {
                if let Some(db_err) = err.as_database_error() {
                    if let Some(code) = db_err.code() {
                        match code.as_ref() {
                            // SQLITE_CONSTRAINT_UNIQUE, SQLITE_CONSTRAINT_PRIMARYKEY
                            "2067" | "1555" => {
                                return RepositoryError::UniqueViolation(
                                    db_err.message().to_string(),
                                );
                            }
                            // SQLITE_CONSTRAINT_CHECK
                            "275" => {
                                return RepositoryError::CheckViolation(
                                    db_err.message().to_string(),
                                );
                            }
                            _ => {}
                        }
                    }
                }
                RepositoryError::Infrastructure(err)
            }
        }
    }
}

const CHANGE_FEED_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Categories,
    Transactions,
}

#[derive(Clone)]
pub struct Database {
    pub pool: Pool,
    changes: broadcast::Sender<Table>,
}

impl Database {
    pub async fn new(connection_string: &str) -> sqlx::Result<Self> {
        let options = SqliteConnectOptions::from_str(connection_string)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await?;

        tracing::debug!("Connected to {}", connection_string);
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: Pool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { pool, changes }
    }

    pub fn notify_changed(&self, table: Table) {
        // No receivers is fine: nobody is watching yet.
        let _ = self.changes.send(table);
        tracing::trace!(?table, "change announced");
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<Table> {
        self.changes.subscribe()
    }

    pub async fn run_migrations(&self) -> Result<(), RepositoryError> {
        tracing::info!("Running migrations...");
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await?;
        tracing::info!("Migrations complete.");
        Ok(())
    }

    pub async fn begin(&self) -> Result<UnitOfWork<'_>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(UnitOfWork { tx })
    }
}

pub struct UnitOfWork<'a> {
    tx: Transaction<'a, Driver>,
}

impl<'a> UnitOfWork<'a> {
    pub async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }

    pub fn connection(&mut self) -> &mut Connection {
        &mut *self.tx
    }
}

// do not add #[cfg(test)] here because it hides this method from libraries.
pub async fn get_test_db() -> Database {
    use std::time::{SystemTime, UNIX_EPOCH};

    // Unique file per test; the counter separates tests started in the same nanosecond.
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let seq = TEST_DB_COUNTER.fetch_add(1, Ordering::Relaxed);
    let db_path = std::env::temp_dir().join(format!("test_finance_{}_{}.db", now, seq));
    let connection_string = format!("sqlite:{}", db_path.display());

    let options = SqliteConnectOptions::from_str(&connection_string).unwrap()
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1) // Single connection is safer for SQLite tests
        .connect_with(options)
        .await
        .expect("Failed to create test database pool");

    let db = Database::from_pool(pool);
    db.run_migrations().await.expect("Failed to run migrations");

    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_constraint_maps_to_check_violation() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();

        let err = sqlx::query(
            "INSERT INTO transactions (amount, description, transaction_date, category_id, is_expense) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(-1.0_f64)
        .bind("negative")
        .bind("2024-01-01 00:00:00")
        .bind(1_i64)
        .bind(true)
        .execute(uow.connection())
        .await
        .unwrap_err();

        assert!(matches!(RepositoryError::from(err), RepositoryError::CheckViolation(_)));
    }

    #[tokio::test]
    async fn test_unique_constraint_maps_to_unique_violation() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();

        let insert = "INSERT INTO categories (name, icon, color, is_expense) VALUES ('Food', 'food', '#fff', 1)";
        sqlx::query(insert).execute(uow.connection()).await.unwrap();
        let err = sqlx::query(insert).execute(uow.connection()).await.unwrap_err();

        assert!(matches!(RepositoryError::from(err), RepositoryError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_notify_changed_reaches_subscribers() {
        let db = get_test_db().await;
        let mut rx = db.subscribe_changes();

        db.notify_changed(Table::Transactions);
        db.notify_changed(Table::Categories);

        assert_eq!(rx.recv().await.unwrap(), Table::Transactions);
        assert_eq!(rx.recv().await.unwrap(), Table::Categories);
    }

    #[tokio::test]
    async fn test_notify_without_subscribers_is_silent() {
        let db = get_test_db().await;
        db.notify_changed(Table::Categories);
    }
}
