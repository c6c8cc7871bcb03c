use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A loosely-typed value read from a statement before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    /// Wrap raw text, treating blank strings as empty.
    pub fn text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Header plus positional rows, as pulled out of a CSV, sheet or PDF page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.headers.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&Cell::Empty)
    }
}

/// Fixed spending taxonomy. Declaration order is the match order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Transport,
    Groceries,
    Rent,
    Utilities,
    #[serde(rename = "Airtime & Data")]
    AirtimeData,
    Entertainment,
    #[serde(rename = "Food & Dining")]
    FoodDining,
    Health,
    Shopping,
    Education,
    #[serde(rename = "Bank Charges")]
    BankCharges,
    Transfers,
    Income,
    #[serde(rename = "Miscellaneous Expense")]
    MiscellaneousExpense,
    Miscellaneous,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transport => "Transport",
            Self::Groceries => "Groceries",
            Self::Rent => "Rent",
            Self::Utilities => "Utilities",
            Self::AirtimeData => "Airtime & Data",
            Self::Entertainment => "Entertainment",
            Self::FoodDining => "Food & Dining",
            Self::Health => "Health",
            Self::Shopping => "Shopping",
            Self::Education => "Education",
            Self::BankCharges => "Bank Charges",
            Self::Transfers => "Transfers",
            Self::Income => "Income",
            Self::MiscellaneousExpense => "Miscellaneous Expense",
            Self::Miscellaneous => "Miscellaneous",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A cleaned, schema-normalized transaction. Positive amounts are inflows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl CanonicalTransaction {
    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Frequency {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringGroup {
    pub description: String,
    /// Absolute mean charge.
    pub amount: f64,
    pub frequency: Frequency,
    pub occurrence_count: usize,
    pub avg_interval_days: f64,
}

/// Best-effort account details scraped from statement text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
}

pub fn round2(val: f64) -> f64 {
    (val * 100.0).round() / 100.0
}

pub fn round1(val: f64) -> f64 {
    (val * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_display_name() {
        let json = serde_json::to_string(&Category::FoodDining).unwrap();
        assert_eq!(json, "\"Food & Dining\"");
        let back: Category = serde_json::from_str("\"Bank Charges\"").unwrap();
        assert_eq!(back, Category::BankCharges);
    }

    #[test]
    fn test_push_row_pads_to_header_width() {
        let mut table = RawTable::new(vec!["Date".into(), "Description".into(), "Amount".into()]);
        table.push_row(vec![Cell::text("2025-01-01")]);
        assert_eq!(table.rows[0].len(), 3);
        assert!(table.get(0, 2).is_empty());
        assert!(table.get(5, 0).is_empty());
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round2(10.005_1), 10.01);
        assert_eq!(round2(-45.204), -45.2);
        assert_eq!(round1(30.04), 30.0);
    }
}
