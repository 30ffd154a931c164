//! Filter selection and the pure filter/sort pipeline.

use crate::period::{resolve, DateRange, Period};
use crate::view::TransactionView;
use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Expense,
    Income,
}

impl TransactionType {
    pub fn of(is_expense: bool) -> Self {
        if is_expense {
            TransactionType::Expense
        } else {
            TransactionType::Income
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    DateDesc,
    DateAsc,
    AmountDesc,
    AmountAsc,
}

impl SortOrder {
    fn compare(self, a: &TransactionView, b: &TransactionView) -> Ordering {
        match self {
            SortOrder::DateDesc => b.date().cmp(&a.date()),
            SortOrder::DateAsc => a.date().cmp(&b.date()),
            SortOrder::AmountDesc => b.amount().total_cmp(&a.amount()),
            SortOrder::AmountAsc => a.amount().total_cmp(&b.amount()),
        }
    }
}

/// Date dimension of a filter: a fixed range, or a period re-resolved at every recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DateFilter {
    Range(DateRange),
    Period(Period),
}

impl DateFilter {
    pub fn resolve(&self, now: NaiveDateTime, week_start: Weekday) -> DateRange {
        match self {
            DateFilter::Range(range) => *range,
            DateFilter::Period(period) => resolve(*period, now, week_start),
        }
    }
}

/// All dimensions combine with AND. The default matches everything, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<i64>,
    pub date: Option<DateFilter>,
    pub search: String,
    pub sort: SortOrder,
}

impl FilterState {
    #[must_use]
    pub fn with_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn with_range(mut self, range: DateRange) -> Self {
        self.date = Some(DateFilter::Range(range));
        self
    }

    #[must_use]
    pub fn with_period(mut self, period: Period) -> Self {
        self.date = Some(DateFilter::Period(period));
        self
    }

    #[must_use]
    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search = query.into();
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Resets every dimension except the sort order.
    pub fn clear(&mut self) {
        *self = FilterState {
            sort: self.sort,
            ..FilterState::default()
        };
    }
}

/// Filters and sorts `views`. `now` and `week_start` only matter for period filters.
pub fn apply(
    views: &[TransactionView],
    state: &FilterState,
    now: NaiveDateTime,
    week_start: Weekday,
) -> Vec<TransactionView> {
    let range = state.date.map(|d| d.resolve(now, week_start));
    if let Some(range) = range.filter(DateRange::is_inverted) {
        tracing::debug!(start = %range.start, end = %range.end, "inverted date range, nothing matches");
        return Vec::new();
    }

    let query = state.search.trim().to_lowercase();

    let mut filtered: Vec<TransactionView> = views
        .iter()
        .filter(|v| {
            state
                .transaction_type
                .is_none_or(|t| t == TransactionType::of(v.is_expense()))
        })
        .filter(|v| {
            state
                .category_id
                .is_none_or(|id| v.category.as_ref().is_some_and(|c| c.id == id))
        })
        .filter(|v| range.is_none_or(|r| r.contains(v.date())))
        .filter(|v| query.is_empty() || matches_search(v, &query))
        .cloned()
        .collect();

    filtered.sort_by(|a, b| state.sort.compare(a, b).then_with(|| a.id().cmp(&b.id())));
    filtered
}

fn matches_search(view: &TransactionView, query: &str) -> bool {
    view.transaction.description.to_lowercase().contains(query)
        || view
            .category_name()
            .is_some_and(|name| name.to_lowercase().contains(query))
}
