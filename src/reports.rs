use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Result, StatementError};
use crate::models::{round2, CanonicalTransaction, Category};

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Days between first and last transaction, floored to 1.
    pub fn elapsed_days(&self) -> i64 {
        (self.end - self.start).num_days().max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_savings: f64,
    pub transaction_count: usize,
    pub date_range: DateRange,
    pub currency: String,
}

// ---------------------------------------------------------------------------
// Breakdowns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Breakdowns {
    pub spending_by_category: BTreeMap<Category, f64>,
    pub income_by_category: BTreeMap<Category, f64>,
}

pub fn category_breakdowns(transactions: &[CanonicalTransaction]) -> Breakdowns {
    let mut breakdowns = Breakdowns::default();
    for txn in transactions {
        let bucket = if txn.is_expense() {
            &mut breakdowns.spending_by_category
        } else if txn.is_income() {
            &mut breakdowns.income_by_category
        } else {
            continue;
        };
        *bucket.entry(txn.category).or_default() += txn.amount.abs();
    }
    for total in breakdowns
        .spending_by_category
        .values_mut()
        .chain(breakdowns.income_by_category.values_mut())
    {
        *total = round2(*total);
    }
    breakdowns
}

/// Category with the largest absolute spend; the earlier category wins a tie.
pub fn top_spending_category(spending: &BTreeMap<Category, f64>) -> Option<Category> {
    let mut best: Option<(Category, f64)> = None;
    for (category, total) in spending {
        if best.map_or(true, |(_, t)| *total > t) {
            best = Some((*category, *total));
        }
    }
    best.map(|(c, _)| c)
}

// ---------------------------------------------------------------------------
// Highlights
// ---------------------------------------------------------------------------

/// Largest outflow, first occurrence on ties.
pub fn highest_expense(transactions: &[CanonicalTransaction]) -> Option<&CanonicalTransaction> {
    transactions
        .iter()
        .filter(|t| t.is_expense())
        .fold(None, |best: Option<&CanonicalTransaction>, t| match best {
            Some(b) if b.amount <= t.amount => Some(b),
            _ => Some(t),
        })
}

/// Largest inflow, first occurrence on ties.
pub fn highest_income(transactions: &[CanonicalTransaction]) -> Option<&CanonicalTransaction> {
    transactions
        .iter()
        .filter(|t| t.is_income())
        .fold(None, |best: Option<&CanonicalTransaction>, t| match best {
            Some(b) if b.amount >= t.amount => Some(b),
            _ => Some(t),
        })
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    pub summary: StatementSummary,
    pub breakdowns: Breakdowns,
    pub highest_expense: Option<CanonicalTransaction>,
    pub highest_income: Option<CanonicalTransaction>,
    pub average_daily_spending: f64,
    pub most_frequent_category: Option<Category>,
}

pub fn summarize(
    transactions: &[CanonicalTransaction],
    supplemental_income: f64,
    currency: &str,
) -> Result<SummaryReport> {
    let start = transactions.iter().map(|t| t.date).min();
    let end = transactions.iter().map(|t| t.date).max();
    let (Some(start), Some(end)) = (start, end) else {
        return Err(StatementError::NoValidTransactions);
    };
    let date_range = DateRange { start, end };

    let income: f64 = transactions.iter().filter(|t| t.is_income()).map(|t| t.amount).sum();
    let expenses: f64 = transactions.iter().filter(|t| t.is_expense()).map(|t| t.amount.abs()).sum();
    let total_income = round2(income + supplemental_income);
    let total_expenses = round2(expenses);
    // Derived from the rounded totals so income - expenses == net exactly.
    let net_savings = round2(total_income - total_expenses);

    let breakdowns = category_breakdowns(transactions);
    let most_frequent_category = top_spending_category(&breakdowns.spending_by_category);

    Ok(SummaryReport {
        summary: StatementSummary {
            total_income,
            total_expenses,
            net_savings,
            transaction_count: transactions.len(),
            date_range,
            currency: currency.to_string(),
        },
        breakdowns,
        highest_expense: highest_expense(transactions).cloned(),
        highest_income: highest_income(transactions).cloned(),
        average_daily_spending: round2(total_expenses / date_range.elapsed_days() as f64),
        most_frequent_category,
    })
}
