use crate::models::{CreateTransactionRequest, Transaction};
use crate::repository::TransactionRepository;
use chrono::NaiveDateTime;
use database::{Database, RepositoryError, Table};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Transaction not found")]
    NotFound,
}

impl From<RepositoryError> for TransactionError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => TransactionError::NotFound,
            RepositoryError::CheckViolation(msg) => TransactionError::InvalidInput(msg),
            RepositoryError::Infrastructure(e) => TransactionError::Infrastructure(e.to_string()),
            _ => TransactionError::Infrastructure(err.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransactionInput {
    pub amount: f64,
    pub description: String,
    pub date: NaiveDateTime,
    pub category_id: i64,
    pub is_expense: Option<bool>,
    pub is_favorite: bool,
}

pub struct TransactionService;

impl TransactionService {
    async fn validate(db: &Database, input: TransactionInput) -> Result<CreateTransactionRequest, TransactionError> {
        let category = categories::service::CategoryService::get_category(db, input.category_id)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get category for transaction: {:?}", e);
                TransactionError::InvalidInput("Please select a category".into())
            })?;

        let is_expense = input.is_expense.unwrap_or(category.is_expense);
        if is_expense != category.is_expense {
            tracing::warn!(
                category_id = category.id,
                "Transaction type does not match its category type"
            );
        }

        CreateTransactionRequest::new(
            input.amount,
            input.description,
            input.date,
            input.category_id,
            is_expense,
            input.is_favorite,
        )
        .map_err(TransactionError::InvalidInput)
    }

    #[instrument(skip(db))]
    pub async fn create_transaction(
        db: &Database,
        input: TransactionInput,
    ) -> Result<i64, TransactionError> {
        let req = Self::validate(db, input).await?;

        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        let id = repo.create(&req).await?;

        uow.commit().await?;
        db.notify_changed(Table::Transactions);

        Ok(id)
    }

    #[instrument(skip(db))]
    pub async fn update_transaction(
        db: &Database,
        id: i64,
        input: TransactionInput,
    ) -> Result<Transaction, TransactionError> {
        let req = Self::validate(db, input).await?;

        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        repo.update(id, &req).await?;

        let transaction = repo.find_by_id(id).await?
            .ok_or(TransactionError::NotFound)?;

        uow.commit().await?;
        db.notify_changed(Table::Transactions);

        Ok(transaction)
    }

    #[instrument(skip(db))]
    pub async fn set_favorite(db: &Database, id: i64, is_favorite: bool) -> Result<(), TransactionError> {
        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        repo.set_favorite(id, is_favorite).await?;

        uow.commit().await?;
        db.notify_changed(Table::Transactions);
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn get_transaction(db: &Database, id: i64) -> Result<Transaction, TransactionError> {
        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        let transaction = repo.find_by_id(id).await?
            .ok_or(TransactionError::NotFound)?;

        Ok(transaction)
    }

    #[instrument(skip(db))]
    pub async fn list_transactions(db: &Database) -> Result<Vec<Transaction>, TransactionError> {
        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        Ok(repo.list().await?)
    }

    #[instrument(skip(db))]
    pub async fn delete_transaction(db: &Database, id: i64) -> Result<(), TransactionError> {
        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        repo.delete(id).await?;

        uow.commit().await?;
        db.notify_changed(Table::Transactions);
        Ok(())
    }
}
