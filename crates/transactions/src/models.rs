use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// `amount` is a non-negative magnitude; direction is carried by `is_expense`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: i64,
    pub amount: f64,
    pub description: String,
    pub date: NaiveDateTime,
    pub category_id: i64,
    pub is_expense: bool,
    pub is_favorite: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateTransactionRequest {
    amount: f64,
    description: String,
    date: NaiveDateTime,
    category_id: i64,
    is_expense: bool,
    is_favorite: bool,
}

#[derive(Deserialize)]
pub struct RawCreateTransactionRequest {
    pub amount: f64,
    pub description: String,
    pub date: NaiveDateTime,
    pub category_id: i64,
    pub is_expense: Option<bool>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl CreateTransactionRequest {
    pub fn new(
        amount: f64,
        description: String,
        date: NaiveDateTime,
        category_id: i64,
        is_expense: bool,
        is_favorite: bool,
    ) -> Result<Self, String> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err("Please enter a valid amount".to_string());
        }

        let description = description.trim();
        if description.is_empty() {
            return Err("Please enter a description".to_string());
        }

        Ok(Self {
            amount,
            description: description.to_string(),
            date,
            category_id,
            is_expense,
            is_favorite,
        })
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    pub fn category_id(&self) -> i64 {
        self.category_id
    }

    pub fn is_expense(&self) -> bool {
        self.is_expense
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 10, 27).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn test_create_transaction_request_trims_description() {
        let req = CreateTransactionRequest::new(45.50, "  Coffee shop ".into(), noon(), 1, true, false).unwrap();
        assert_eq!(req.amount(), 45.50);
        assert_eq!(req.description(), "Coffee shop");
        assert!(req.is_expense());
    }

    #[test]
    fn test_create_transaction_request_rejects_bad_amounts() {
        for amount in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            assert!(CreateTransactionRequest::new(amount, "Taxi".into(), noon(), 1, true, false).is_err());
        }
    }

    #[test]
    fn test_create_transaction_request_rejects_blank_description() {
        assert!(CreateTransactionRequest::new(10.0, "   ".into(), noon(), 1, false, false).is_err());
    }
}
