use std::collections::BTreeMap;

use chrono::{Datelike, Weekday};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::{round2, CanonicalTransaction, Category};

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Spend per weekday, serialized as a map in Monday..Sunday order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekdayTotals {
    totals: [Option<f64>; 7],
}

impl WeekdayTotals {
    fn add(&mut self, day: Weekday, amount: f64) {
        let slot = &mut self.totals[day.num_days_from_monday() as usize];
        *slot = Some(slot.unwrap_or(0.0) + amount);
    }

    pub fn get(&self, day: Weekday) -> Option<f64> {
        self.totals[day.num_days_from_monday() as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, f64)> + '_ {
        WEEK.iter()
            .zip(self.totals.iter())
            .filter_map(|(day, total)| total.map(|t| (*day, t)))
    }
}

impl Serialize for WeekdayTotals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present: Vec<(Weekday, f64)> = self.iter().collect();
        let mut map = serializer.serialize_map(Some(present.len()))?;
        for (day, total) in present {
            map.serialize_entry(weekday_name(day), &round2(total))?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct SpendingPatterns {
    /// Keyed `YYYY-MM`.
    pub monthly_spending: BTreeMap<String, f64>,
    pub weekday_spending: WeekdayTotals,
    /// Category -> month -> spend, zero-filled across every month seen.
    pub category_trends: BTreeMap<Category, BTreeMap<String, f64>>,
}

pub fn analyze_patterns(transactions: &[CanonicalTransaction]) -> SpendingPatterns {
    let mut patterns = SpendingPatterns::default();

    for txn in transactions.iter().filter(|t| t.is_expense()) {
        let spend = txn.amount.abs();
        let month = txn.date.format("%Y-%m").to_string();
        *patterns.monthly_spending.entry(month.clone()).or_default() += spend;
        patterns.weekday_spending.add(txn.date.weekday(), spend);
        *patterns
            .category_trends
            .entry(txn.category)
            .or_default()
            .entry(month)
            .or_default() += spend;
    }

    for total in patterns.monthly_spending.values_mut() {
        *total = round2(*total);
    }
    for by_month in patterns.category_trends.values_mut() {
        for month in patterns.monthly_spending.keys() {
            let total = by_month.entry(month.clone()).or_insert(0.0);
            *total = round2(*total);
        }
    }
    patterns
}
