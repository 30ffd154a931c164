//! Totals and breakdowns over a filtered list of transactions.

use crate::view::{TransactionView, YearMonth};
use crate::EngineError;
use categories::models::Category;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
}

/// Balance at the end of `date`, counting income as positive and expense as negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_income: f64,
    pub total_expense: f64,
    pub total_balance: f64,
    /// Sum of every amount regardless of type.
    pub total_amount: f64,
    pub category_summary: BTreeMap<i64, CategoryTotal>,
    pub daily_summary: BTreeMap<NaiveDate, f64>,
    pub monthly_summary: BTreeMap<YearMonth, f64>,
    pub running_balance: Vec<BalancePoint>,
    /// Rows whose category could not be resolved.
    pub anomalies: usize,
    /// Rows whose type disagrees with their category's type.
    pub kind_mismatches: usize,
}

/// Aggregates `views` in input order.
///
/// Anomalies count towards every total except `category_summary`. A
/// non-finite amount or total fails the whole aggregation.
pub fn aggregate(views: &[TransactionView]) -> Result<Summary, EngineError> {
    let mut summary = Summary::default();
    let mut daily_net: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for view in views {
        let amount = view.amount();
        if !amount.is_finite() {
            return Err(EngineError::Computation(format!(
                "transaction {} has non-finite amount {amount}",
                view.id()
            )));
        }

        let day = view.date().date();
        let signed = if view.is_expense() {
            summary.total_expense += amount;
            -amount
        } else {
            summary.total_income += amount;
            amount
        };
        summary.total_amount += amount;

        *summary.daily_summary.entry(day).or_insert(0.0) += amount;
        *summary.monthly_summary.entry(YearMonth::from(day)).or_insert(0.0) += amount;
        *daily_net.entry(day).or_insert(0.0) += signed;

        match &view.category {
            Some(category) => {
                summary
                    .category_summary
                    .entry(category.id)
                    .or_insert_with(|| CategoryTotal {
                        category: category.clone(),
                        total: 0.0,
                    })
                    .total += amount;
                if view.kind_mismatch() {
                    summary.kind_mismatches += 1;
                }
            }
            None => {
                tracing::debug!(
                    transaction_id = view.id(),
                    category_id = view.transaction.category_id,
                    "transaction references a missing category"
                );
                summary.anomalies += 1;
            }
        }
    }

    summary.total_balance = summary.total_income - summary.total_expense;

    let mut balance = 0.0;
    summary.running_balance = daily_net
        .into_iter()
        .map(|(date, net)| {
            balance += net;
            BalancePoint { date, balance }
        })
        .collect();

    for (name, total) in [
        ("income", summary.total_income),
        ("expense", summary.total_expense),
        ("amount", summary.total_amount),
        ("balance", summary.total_balance),
    ] {
        if !total.is_finite() {
            return Err(EngineError::Computation(format!("total {name} overflowed")));
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::join;
    use chrono::NaiveDateTime;
    use transactions::models::Transaction;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn category(id: i64, name: &str, is_expense: bool) -> Category {
        Category {
            id,
            name: name.to_string(),
            icon: "ic_category_other".to_string(),
            color: "#FFDAC1".to_string(),
            is_expense,
        }
    }

    fn tx(id: i64, amount: f64, date: NaiveDateTime, category_id: i64, is_expense: bool) -> Transaction {
        Transaction {
            id,
            amount,
            description: format!("tx {id}"),
            date,
            category_id,
            is_expense,
            is_favorite: false,
        }
    }

    fn categories() -> Vec<Category> {
        vec![category(1, "Food", true), category(2, "Salary", false)]
    }

    #[test]
    fn test_empty_input_yields_zeroes() {
        let summary = aggregate(&[]).unwrap();
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn test_totals_and_breakdowns() {
        let views = join(
            &[
                tx(1, 50.0, at(2024, 3, 1), 1, true),
                tx(2, 20.0, at(2024, 3, 1), 1, true),
                tx(3, 1000.0, at(2024, 3, 2), 2, false),
                tx(4, 30.0, at(2024, 4, 5), 1, true),
            ],
            &categories(),
        );

        let summary = aggregate(&views).unwrap();

        assert_eq!(summary.total_expense, 100.0);
        assert_eq!(summary.total_income, 1000.0);
        assert_eq!(summary.total_balance, 900.0);
        assert_eq!(summary.total_amount, 1100.0);

        assert_eq!(summary.category_summary[&1].total, 100.0);
        assert_eq!(summary.category_summary[&1].category.name, "Food");
        assert_eq!(summary.category_summary[&2].total, 1000.0);

        assert_eq!(summary.daily_summary[&day(2024, 3, 1)], 70.0);
        assert_eq!(summary.daily_summary[&day(2024, 3, 2)], 1000.0);
        assert_eq!(summary.monthly_summary[&YearMonth { year: 2024, month: 3 }], 1070.0);
        assert_eq!(summary.monthly_summary[&YearMonth { year: 2024, month: 4 }], 30.0);

        assert_eq!(
            summary.running_balance,
            vec![
                BalancePoint { date: day(2024, 3, 1), balance: -70.0 },
                BalancePoint { date: day(2024, 3, 2), balance: 930.0 },
                BalancePoint { date: day(2024, 4, 5), balance: 900.0 },
            ]
        );
    }

    #[test]
    fn test_expense_only_view_reports_total_amount() {
        let views = join(
            &[tx(1, 12.5, at(2024, 1, 1), 1, true), tx(2, 7.5, at(2024, 1, 2), 1, true)],
            &categories(),
        );

        let summary = aggregate(&views).unwrap();
        assert_eq!(summary.total_amount, 20.0);
        assert_eq!(summary.total_income, 0.0);
        assert_eq!(summary.total_balance, -20.0);
    }

    #[test]
    fn test_sums_are_consistent() {
        let views = join(
            &[
                tx(1, 3.25, at(2024, 1, 1), 1, true),
                tx(2, 8.0, at(2024, 1, 15), 2, false),
                tx(3, 1.75, at(2024, 2, 1), 1, true),
                tx(4, 4.0, at(2024, 2, 9), 2, false),
            ],
            &categories(),
        );

        let summary = aggregate(&views).unwrap();
        let daily: f64 = summary.daily_summary.values().sum();
        let monthly: f64 = summary.monthly_summary.values().sum();
        let by_category: f64 = summary.category_summary.values().map(|c| c.total).sum();

        assert_eq!(summary.total_amount, summary.total_income + summary.total_expense);
        assert_eq!(daily, summary.total_amount);
        assert_eq!(monthly, summary.total_amount);
        assert_eq!(by_category, summary.total_amount);
        assert_eq!(summary.running_balance.last().unwrap().balance, summary.total_balance);
    }

    #[test]
    fn test_missing_category_counts_everywhere_but_category_summary() {
        let views = join(
            &[tx(1, 10.0, at(2024, 5, 1), 1, true), tx(2, 15.0, at(2024, 5, 1), 99, true)],
            &categories(),
        );

        let summary = aggregate(&views).unwrap();
        assert_eq!(summary.anomalies, 1);
        assert_eq!(summary.total_expense, 25.0);
        assert_eq!(summary.daily_summary[&day(2024, 5, 1)], 25.0);
        assert_eq!(summary.category_summary.len(), 1);
        assert_eq!(summary.category_summary[&1].total, 10.0);
    }

    #[test]
    fn test_kind_mismatch_trusts_transaction_flag() {
        // Income recorded against an expense category.
        let views = join(&[tx(1, 40.0, at(2024, 5, 1), 1, false)], &categories());

        let summary = aggregate(&views).unwrap();
        assert_eq!(summary.kind_mismatches, 1);
        assert_eq!(summary.total_income, 40.0);
        assert_eq!(summary.total_expense, 0.0);
        assert_eq!(summary.category_summary[&1].total, 40.0);
    }

    #[test]
    fn test_non_finite_amount_fails() {
        let views = join(&[tx(1, f64::NAN, at(2024, 5, 1), 1, true)], &categories());
        assert!(matches!(aggregate(&views), Err(EngineError::Computation(_))));
    }

    #[test]
    fn test_overflowing_total_fails() {
        let views = join(
            &[tx(1, f64::MAX, at(2024, 5, 1), 2, false), tx(2, f64::MAX, at(2024, 5, 2), 2, false)],
            &categories(),
        );
        assert!(matches!(aggregate(&views), Err(EngineError::Computation(_))));
    }

    #[test]
    fn test_monthly_keys_serialize_as_year_month() {
        let views = join(&[tx(1, 5.0, at(2024, 3, 9), 1, true)], &categories());
        let json = serde_json::to_value(aggregate(&views).unwrap()).unwrap();
        assert_eq!(json["monthly_summary"]["2024-03"], 5.0);
        assert_eq!(json["daily_summary"]["2024-03-09"], 5.0);
    }
}
