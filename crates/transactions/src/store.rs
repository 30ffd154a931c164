use crate::models::Transaction;
use crate::service::{TransactionError, TransactionService};
use categories::models::Category;
use categories::service::{CategoryError, CategoryService};
use database::{Database, Table};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Transactions(#[from] TransactionError),
    #[error(transparent)]
    Categories(#[from] CategoryError),
}

pub type TransactionSnapshot = Arc<Vec<Transaction>>;
pub type CategorySnapshot = Arc<Vec<Category>>;

struct Snapshots {
    transactions: watch::Sender<TransactionSnapshot>,
    categories: watch::Sender<CategorySnapshot>,
}

impl Snapshots {
    async fn reload_transactions(&self, db: &Database) -> Result<(), StoreError> {
        let fresh = TransactionService::list_transactions(db).await?;
        let changed = self.transactions.send_if_modified(|current| {
            if **current == fresh {
                return false;
            }
            *current = Arc::new(fresh);
            true
        });
        tracing::debug!(changed, "transaction snapshot reloaded");
        Ok(())
    }

    async fn reload_categories(&self, db: &Database) -> Result<(), StoreError> {
        let fresh = CategoryService::list_categories(db).await?;
        let changed = self.categories.send_if_modified(|current| {
            if **current == fresh {
                return false;
            }
            *current = Arc::new(fresh);
            true
        });
        tracing::debug!(changed, "category snapshot reloaded");
        Ok(())
    }

    async fn reload(&self, db: &Database, table: Table) {
        let result = match table {
            Table::Transactions => self.reload_transactions(db).await,
            Table::Categories => self.reload_categories(db).await,
        };
        if let Err(e) = result {
            tracing::error!(?table, "Snapshot reload failed, keeping previous snapshot: {}", e);
        }
    }
}

pub struct LedgerStore {
    db: Database,
    snapshots: Arc<Snapshots>,
    listener: JoinHandle<()>,
}

impl LedgerStore {
    pub async fn open(db: Database) -> Result<Self, StoreError> {
        // Subscribe before the initial load so no write slips in between.
        let changes = db.subscribe_changes();

        let transactions = TransactionService::list_transactions(&db).await?;
        let categories = CategoryService::list_categories(&db).await?;
        tracing::info!(
            transactions = transactions.len(),
            categories = categories.len(),
            "Ledger store opened"
        );

        let snapshots = Arc::new(Snapshots {
            transactions: watch::channel(Arc::new(transactions)).0,
            categories: watch::channel(Arc::new(categories)).0,
        });

        let listener = tokio::spawn(follow_changes(db.clone(), snapshots.clone(), changes));

        Ok(Self { db, snapshots, listener })
    }

    pub fn subscribe_transactions(&self) -> watch::Receiver<TransactionSnapshot> {
        self.snapshots.transactions.subscribe()
    }

    pub fn subscribe_categories(&self) -> watch::Receiver<CategorySnapshot> {
        self.snapshots.categories.subscribe()
    }

    pub async fn refresh(&self) -> Result<(), StoreError> {
        self.snapshots.reload_categories(&self.db).await?;
        self.snapshots.reload_transactions(&self.db).await?;
        Ok(())
    }
}

impl Drop for LedgerStore {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

async fn follow_changes(
    db: Database,
    snapshots: Arc<Snapshots>,
    mut changes: broadcast::Receiver<Table>,
) {
    loop {
        match changes.recv().await {
            Ok(table) => snapshots.reload(&db, table).await,
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "Change feed lagged, reloading everything");
                snapshots.reload(&db, Table::Categories).await;
                snapshots.reload(&db, Table::Transactions).await;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::TransactionInput;
    use chrono::NaiveDate;
    use database::get_test_db;

    fn input(category_id: i64) -> TransactionInput {
        TransactionInput {
            amount: 12.5,
            description: "Coffee".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            category_id,
            is_expense: None,
            is_favorite: false,
        }
    }

    #[tokio::test]
    async fn test_open_loads_current_tables() {
        let db = get_test_db().await;
        let cafe = CategoryService::create_category(&db, "Cafe".into(), None, None, true).await.unwrap();
        TransactionService::create_transaction(&db, input(cafe)).await.unwrap();

        let store = LedgerStore::open(db).await.unwrap();

        assert_eq!(store.subscribe_transactions().borrow().len(), 1);
        assert_eq!(store.subscribe_categories().borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_committed_writes_publish_new_snapshots() {
        let db = get_test_db().await;
        let store = LedgerStore::open(db.clone()).await.unwrap();
        let mut categories = store.subscribe_categories();
        let mut transactions = store.subscribe_transactions();

        let cafe = CategoryService::create_category(&db, "Cafe".into(), None, None, true).await.unwrap();
        categories.changed().await.unwrap();
        assert_eq!(categories.borrow_and_update()[0].name, "Cafe");

        TransactionService::create_transaction(&db, input(cafe)).await.unwrap();
        transactions.changed().await.unwrap();
        assert_eq!(transactions.borrow_and_update()[0].description, "Coffee");

        CategoryService::delete_category(&db, cafe).await.unwrap();
        categories.changed().await.unwrap();
        assert!(categories.borrow_and_update().is_empty());
        // The orphaned transaction stays.
        assert_eq!(transactions.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_without_changes_keeps_snapshot() {
        let db = get_test_db().await;
        let store = LedgerStore::open(db).await.unwrap();
        let mut transactions = store.subscribe_transactions();
        transactions.borrow_and_update();

        store.refresh().await.unwrap();

        assert!(!transactions.has_changed().unwrap());
    }
}
