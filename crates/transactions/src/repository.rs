use crate::models::{CreateTransactionRequest, Transaction};
use chrono::NaiveDateTime;
use database::{self, RepositoryError};
use sqlx::FromRow;

#[derive(FromRow)]
struct TransactionRecord {
    id: i64,
    amount: f64,
    description: String,
    transaction_date: NaiveDateTime,
    category_id: i64,
    is_expense: bool,
    is_favorite: bool,
}

impl From<TransactionRecord> for Transaction {
    fn from(record: TransactionRecord) -> Self {
        Transaction {
            id: record.id,
            amount: record.amount,
            description: record.description,
            date: record.transaction_date,
            category_id: record.category_id,
            is_expense: record.is_expense,
            is_favorite: record.is_favorite,
        }
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, amount, description, transaction_date, category_id, is_expense, is_favorite FROM transactions";

pub(crate) struct TransactionRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> TransactionRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, req: &CreateTransactionRequest) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO transactions (amount, description, transaction_date, category_id, is_expense, is_favorite) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(req.amount())
        .bind(req.description())
        .bind(req.date())
        .bind(req.category_id())
        .bind(req.is_expense())
        .bind(req.is_favorite())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    pub async fn update(&mut self, id: i64, req: &CreateTransactionRequest) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE transactions SET amount = $1, description = $2, transaction_date = $3, category_id = $4, is_expense = $5, is_favorite = $6 WHERE id = $7",
        )
        .bind(req.amount())
        .bind(req.description())
        .bind(req.date())
        .bind(req.category_id())
        .bind(req.is_expense())
        .bind(req.is_favorite())
        .bind(id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn set_favorite(&mut self, id: i64, is_favorite: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE transactions SET is_favorite = $1 WHERE id = $2")
            .bind(is_favorite)
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn find_by_id(&mut self, id: i64) -> Result<Option<Transaction>, RepositoryError> {
        let record = sqlx::query_as::<_, TransactionRecord>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(record.map(|r| r.into()))
    }

    pub async fn list(&mut self) -> Result<Vec<Transaction>, RepositoryError> {
        let records = sqlx::query_as::<_, TransactionRecord>(
            &format!("{SELECT_COLUMNS} ORDER BY transaction_date DESC, id ASC"),
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(records.into_iter().map(|r| r.into()).collect())
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
