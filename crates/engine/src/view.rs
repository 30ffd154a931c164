use crate::aggregate::Summary;
use crate::filter::FilterState;
use categories::models::Category;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use transactions::models::Transaction;

/// A transaction joined with its category. `category` is `None` when the
/// referenced category no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category: Option<Category>,
}

impl TransactionView {
    pub fn id(&self) -> i64 {
        self.transaction.id
    }

    pub fn amount(&self) -> f64 {
        self.transaction.amount
    }

    pub fn date(&self) -> NaiveDateTime {
        self.transaction.date
    }

    pub fn is_expense(&self) -> bool {
        self.transaction.is_expense
    }

    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }

    pub fn is_anomaly(&self) -> bool {
        self.category.is_none()
    }

    /// The transaction's type disagrees with its category's type.
    pub fn kind_mismatch(&self) -> bool {
        self.category
            .as_ref()
            .is_some_and(|c| c.is_expense != self.transaction.is_expense)
    }
}

/// Joins transactions with categories on `category_id`, keeping input order.
pub fn join(transactions: &[Transaction], categories: &[Category]) -> Vec<TransactionView> {
    let by_id: HashMap<i64, &Category> = categories.iter().map(|c| (c.id, c)).collect();

    transactions
        .iter()
        .map(|t| TransactionView {
            transaction: t.clone(),
            category: by_id.get(&t.category_id).map(|c| (*c).clone()),
        })
        .collect()
}

/// Calendar month bucket, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Everything one recompute produced. Published as a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedView {
    /// Increases by one with every published recompute; 0 before the first.
    pub revision: u64,
    pub computed_at: Option<NaiveDateTime>,
    pub filter: FilterState,
    pub transactions: Vec<TransactionView>,
    pub summary: Summary,
}

impl DerivedView {
    /// The first `n` rows of the filtered list.
    pub fn recent(&self, n: usize) -> &[TransactionView] {
        &self.transactions[..n.min(self.transactions.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn category(id: i64, name: &str, is_expense: bool) -> Category {
        Category {
            id,
            name: name.to_string(),
            icon: "ic_category_other".to_string(),
            color: "#E2F0CB".to_string(),
            is_expense,
        }
    }

    fn transaction(id: i64, category_id: i64, is_expense: bool) -> Transaction {
        Transaction {
            id,
            amount: 10.0,
            description: format!("t{id}"),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            category_id,
            is_expense,
            is_favorite: false,
        }
    }

    #[test]
    fn test_join_resolves_categories_and_keeps_order() {
        let cats = vec![category(1, "Food", true), category(2, "Salary", false)];
        let txs = vec![transaction(5, 2, false), transaction(3, 1, true)];

        let views = join(&txs, &cats);

        assert_eq!(views.iter().map(|v| v.id()).collect::<Vec<_>>(), vec![5, 3]);
        assert_eq!(views[0].category_name(), Some("Salary"));
        assert_eq!(views[1].category_name(), Some("Food"));
    }

    #[test]
    fn test_join_marks_missing_category_as_anomaly() {
        let views = join(&[transaction(1, 99, true)], &[category(1, "Food", true)]);
        assert!(views[0].is_anomaly());
        assert_eq!(views[0].category_name(), None);
        assert!(!views[0].kind_mismatch());
    }

    #[test]
    fn test_kind_mismatch() {
        let views = join(&[transaction(1, 1, false)], &[category(1, "Food", true)]);
        assert!(views[0].kind_mismatch());
    }

    #[test]
    fn test_year_month_format_and_order() {
        let jan = YearMonth::from(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        let dec = YearMonth::from(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(jan.to_string(), "2024-01");
        assert!(dec < jan);
        assert_eq!(serde_json::to_string(&jan).unwrap(), "\"2024-01\"");
    }

    #[test]
    fn test_recent_is_bounded() {
        let mut view = DerivedView::default();
        assert!(view.recent(5).is_empty());
        view.transactions = join(&[transaction(1, 1, true), transaction(2, 1, true)], &[]);
        assert_eq!(view.recent(5).len(), 2);
        assert_eq!(view.recent(1)[0].id(), 1);
    }
}
