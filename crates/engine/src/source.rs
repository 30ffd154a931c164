//! Where the engine gets its input snapshots from.

use categories::models::Category;
use std::sync::Arc;
use tokio::sync::watch;
use transactions::models::Transaction;
use transactions::store::{CategorySnapshot, LedgerStore, TransactionSnapshot};

/// Publisher of complete, immutable table snapshots.
///
/// A new value on either channel is a triggering event for the engine.
pub trait SnapshotSource {
    fn subscribe_transactions(&self) -> watch::Receiver<TransactionSnapshot>;
    fn subscribe_categories(&self) -> watch::Receiver<CategorySnapshot>;
}

impl SnapshotSource for LedgerStore {
    fn subscribe_transactions(&self) -> watch::Receiver<TransactionSnapshot> {
        LedgerStore::subscribe_transactions(self)
    }

    fn subscribe_categories(&self) -> watch::Receiver<CategorySnapshot> {
        LedgerStore::subscribe_categories(self)
    }
}

/// In-memory snapshot source. Every setter publishes a new snapshot.
pub struct MemorySource {
    transactions: watch::Sender<TransactionSnapshot>,
    categories: watch::Sender<CategorySnapshot>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::with(Vec::new(), Vec::new())
    }

    pub fn with(transactions: Vec<Transaction>, categories: Vec<Category>) -> Self {
        Self {
            transactions: watch::channel(Arc::new(transactions)).0,
            categories: watch::channel(Arc::new(categories)).0,
        }
    }

    pub fn set_transactions(&self, transactions: Vec<Transaction>) {
        self.transactions.send_replace(Arc::new(transactions));
    }

    pub fn set_categories(&self, categories: Vec<Category>) {
        self.categories.send_replace(Arc::new(categories));
    }

    /// Appends to the current transaction snapshot.
    pub fn push_transaction(&self, transaction: Transaction) {
        self.transactions.send_modify(|current| {
            let mut next = current.as_ref().clone();
            next.push(transaction);
            *current = Arc::new(next);
        });
    }

    pub fn remove_category(&self, id: i64) {
        self.categories.send_modify(|current| {
            let next: Vec<Category> = current.iter().filter(|c| c.id != id).cloned().collect();
            *current = Arc::new(next);
        });
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSource for MemorySource {
    fn subscribe_transactions(&self) -> watch::Receiver<TransactionSnapshot> {
        self.transactions.subscribe()
    }

    fn subscribe_categories(&self) -> watch::Receiver<CategorySnapshot> {
        self.categories.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use categories::service::CategoryService;
    use chrono::NaiveDate;
    use database::get_test_db;
    use transactions::service::{TransactionInput, TransactionService};

    fn transaction(id: i64) -> Transaction {
        Transaction {
            id,
            amount: 9.0,
            description: "Lunch".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(13, 0, 0).unwrap(),
            category_id: 1,
            is_expense: true,
            is_favorite: false,
        }
    }

    #[tokio::test]
    async fn test_memory_source_publishes_on_every_set() {
        let source = MemorySource::new();
        let mut rx = source.subscribe_transactions();
        rx.borrow_and_update();

        source.push_transaction(transaction(1));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        source.set_transactions(Vec::new());
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_empty());
    }

    #[tokio::test]
    async fn test_ledger_store_is_a_snapshot_source() {
        let db = get_test_db().await;
        let store = LedgerStore::open(db.clone()).await.unwrap();
        let source: &dyn SnapshotSource = &store;
        let mut categories = source.subscribe_categories();
        let mut transactions = source.subscribe_transactions();

        let food = CategoryService::create_category(&db, "Food".into(), None, None, true).await.unwrap();
        categories.changed().await.unwrap();
        assert_eq!(categories.borrow_and_update()[0].id, food);

        TransactionService::create_transaction(
            &db,
            TransactionInput {
                amount: 4.5,
                description: "Bagel".into(),
                date: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap().and_hms_opt(9, 0, 0).unwrap(),
                category_id: food,
                is_expense: None,
                is_favorite: false,
            },
        )
        .await
        .unwrap();
        transactions.changed().await.unwrap();
        assert!(transactions.borrow_and_update()[0].is_expense);
    }
}
