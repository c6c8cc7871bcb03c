use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{round1, round2, CanonicalTransaction, Frequency, RecurringGroup};

#[derive(Debug, Clone)]
pub struct RecurrenceConfig {
    /// Groups whose amount standard deviation reaches this value are not recurring.
    pub amount_tolerance: f64,
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: 10.0,
        }
    }
}

/// Map an average gap between charges to a cadence. `None` means no known cadence.
pub fn frequency_for_interval(avg_days: f64) -> Option<Frequency> {
    if (6.0..=8.0).contains(&avg_days) {
        Some(Frequency::Weekly)
    } else if (25.0..=35.0).contains(&avg_days) {
        Some(Frequency::Monthly)
    } else if (85.0..=95.0).contains(&avg_days) {
        Some(Frequency::Quarterly)
    } else if avg_days >= 350.0 {
        Some(Frequency::Yearly)
    } else {
        None
    }
}

struct GroupAccumulator<'a> {
    representative: &'a str,
    amounts: Vec<f64>,
    dates: Vec<NaiveDate>,
}

struct GroupStats<'a> {
    representative: &'a str,
    count: usize,
    mean: f64,
    std_dev: f64,
    dates: Vec<NaiveDate>,
}

impl<'a> GroupAccumulator<'a> {
    fn finalize(mut self) -> GroupStats<'a> {
        let count = self.amounts.len();
        let mean = self.amounts.iter().sum::<f64>() / count as f64;
        let std_dev = if count > 1 {
            let var = self.amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };
        self.dates.sort();
        GroupStats {
            representative: self.representative,
            count,
            mean,
            std_dev,
            dates: self.dates,
        }
    }
}

fn mean_interval_days(sorted_dates: &[NaiveDate]) -> f64 {
    let gaps: Vec<i64> = sorted_dates
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days())
        .collect();
    gaps.iter().sum::<i64>() as f64 / gaps.len() as f64
}

/// Find outflows that repeat with a consistent amount and a known cadence.
pub fn detect_recurring(
    transactions: &[CanonicalTransaction],
    config: &RecurrenceConfig,
) -> Vec<RecurringGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<GroupAccumulator> = Vec::new();

    for txn in transactions.iter().filter(|t| t.is_expense()) {
        let key = txn.description.trim().to_lowercase();
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(GroupAccumulator {
                representative: &txn.description,
                amounts: Vec::new(),
                dates: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].amounts.push(txn.amount);
        groups[slot].dates.push(txn.date);
    }

    let mut recurring: Vec<RecurringGroup> = groups
        .into_iter()
        .map(GroupAccumulator::finalize)
        .filter(|g| g.count >= 2 && g.std_dev < config.amount_tolerance)
        .filter_map(|g| {
            let avg_interval = mean_interval_days(&g.dates);
            let Some(frequency) = frequency_for_interval(avg_interval) else {
                debug!(
                    "Dropping '{}': {} charges every {avg_interval:.1} days has no cadence",
                    g.representative, g.count
                );
                return None;
            };
            Some(RecurringGroup {
                description: g.representative.to_string(),
                amount: round2(g.mean.abs()),
                frequency,
                occurrence_count: g.count,
                avg_interval_days: round1(avg_interval),
            })
        })
        .collect();

    // Stable sort keeps first-seen order among equal amounts.
    recurring.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    recurring
}
