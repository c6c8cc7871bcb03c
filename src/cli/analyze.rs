use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};
use serde_json::Value;

use penny::error::{Result, StatementError};
use penny::fmt::money;
use penny::patterns::weekday_name;
use penny::settings::load_settings;
use penny::{Focus, ProcessOptions, StatementProcessor, StatementReport};

/// Rows shown in the transactions table before truncating.
const TRANSACTION_PREVIEW: usize = 20;

pub fn run(
    file: &str,
    currency: Option<&str>,
    income: f64,
    focus: Option<Focus>,
    json: bool,
) -> Result<()> {
    let settings = load_settings();
    let processor = StatementProcessor::new(&settings);
    let options = ProcessOptions::new(currency.unwrap_or(&settings.default_currency), income);

    if json {
        let value = match &options {
            Ok(options) => processor.view_to_json(Path::new(file), options, focus),
            Err(e) => e.to_json(),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return match value.get("error").and_then(Value::as_str) {
            Some(message) => Err(StatementError::Other(message.to_string())),
            None => Ok(()),
        };
    }

    let report = processor.process(Path::new(file), &options?)?;
    match focus {
        None => {
            print_summary(&report);
            print_breakdowns(&report);
            print_recurring(&report);
            print_patterns(&report);
            print_transactions(&report);
        }
        Some(Focus::Summary) => {
            print_summary(&report);
            print_breakdowns(&report);
        }
        Some(Focus::Spending) => {
            print_breakdowns(&report);
            print_patterns(&report);
        }
        Some(Focus::Recurring) => print_recurring(&report),
        Some(Focus::Patterns) => print_patterns(&report),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn print_summary(report: &StatementReport) {
    let s = &report.summary;
    let cur = s.currency.as_str();

    println!("{}", report.file_info.name.bold());
    if let Some(bank) = &report.account_info.metadata.bank_name {
        println!("Bank:       {bank}");
    }
    if let Some(number) = &report.account_info.metadata.account_number {
        println!("Account:    {number}");
    }
    println!("Period:     {} to {}", s.date_range.start, s.date_range.end);
    println!();

    let mut table = Table::new();
    table.set_header(vec!["Summary", "Amount"]);
    table.add_row(vec![Cell::new("Income".green().bold()), Cell::new(money(s.total_income, cur))]);
    table.add_row(vec![Cell::new("Expenses".red().bold()), Cell::new(money(s.total_expenses, cur))]);
    let net_label = if s.net_savings >= 0.0 {
        "Net Savings".green().bold()
    } else {
        "Net Savings".red().bold()
    };
    table.add_row(vec![Cell::new(net_label), Cell::new(money(s.net_savings, cur))]);
    table.add_row(vec![
        Cell::new("Avg Daily Spending"),
        Cell::new(money(report.analysis.average_daily_spending, cur)),
    ]);
    table.add_row(vec![Cell::new("Transactions"), Cell::new(s.transaction_count)]);
    println!("{table}");

    if let Some(t) = &report.highlights.highest_expense {
        println!("Largest expense: {} {} ({})", money(t.amount, cur), t.description, t.date);
    }
    if let Some(t) = &report.highlights.highest_income {
        println!("Largest income:  {} {} ({})", money(t.amount, cur), t.description, t.date);
    }
}

fn print_breakdowns(report: &StatementReport) {
    let cur = report.summary.currency.as_str();
    let spending = &report.breakdowns.spending_by_category;
    if spending.is_empty() {
        println!("\nNo spending in this statement.");
        return;
    }
    let total: f64 = spending.values().sum();

    let mut rows: Vec<_> = spending.iter().collect();
    rows.sort_by(|a, b| b.1.total_cmp(a.1));

    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "%"]);
    for (category, amount) in rows {
        let pct = if total > 0.0 { amount / total * 100.0 } else { 0.0 };
        let label = if Some(*category) == report.analysis.most_frequent_category {
            category.name().bold()
        } else {
            category.name().normal()
        };
        table.add_row(vec![
            Cell::new(label),
            Cell::new(money(*amount, cur)),
            Cell::new(format!("{pct:.1}%")),
        ]);
    }
    println!("\nSpending by Category\n{table}");

    let income = &report.breakdowns.income_by_category;
    if !income.is_empty() {
        let mut itable = Table::new();
        itable.set_header(vec!["Category", "Amount"]);
        for (category, amount) in income {
            itable.add_row(vec![Cell::new(category.name()), Cell::new(money(*amount, cur))]);
        }
        println!("\nIncome by Category\n{itable}");
    }
}

fn print_recurring(report: &StatementReport) {
    let cur = report.summary.currency.as_str();
    let recurring = &report.highlights.recurring_transactions;
    if recurring.is_empty() {
        println!("\nNo recurring charges found.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["Description", "Amount", "Frequency", "Count", "Every"]);
    for r in recurring {
        table.add_row(vec![
            Cell::new(&r.description),
            Cell::new(money(r.amount, cur)),
            Cell::new(format!("{:?}", r.frequency)),
            Cell::new(r.occurrence_count),
            Cell::new(format!("{:.1} days", r.avg_interval_days)),
        ]);
    }
    let total: f64 = recurring.iter().map(|r| r.amount).sum();
    println!("\nRecurring Charges ({} per cycle)\n{table}", money(total, cur));
}

fn print_patterns(report: &StatementReport) {
    let cur = report.summary.currency.as_str();
    let patterns = &report.analysis.spending_patterns;
    if patterns.monthly_spending.is_empty() {
        return;
    }

    let mut monthly = Table::new();
    monthly.set_header(vec!["Month", "Spending"]);
    for (month, amount) in &patterns.monthly_spending {
        monthly.add_row(vec![Cell::new(month), Cell::new(money(*amount, cur))]);
    }
    println!("\nMonthly Spending\n{monthly}");

    let mut weekday = Table::new();
    weekday.set_header(vec!["Weekday", "Spending"]);
    for (day, amount) in patterns.weekday_spending.iter() {
        weekday.add_row(vec![Cell::new(weekday_name(day)), Cell::new(money(amount, cur))]);
    }
    println!("\nSpending by Weekday\n{weekday}");
}

fn print_transactions(report: &StatementReport) {
    let cur = report.summary.currency.as_str();
    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Amount", "Category"]);
    for t in report.transactions.iter().take(TRANSACTION_PREVIEW) {
        let amount = if t.amount < 0.0 {
            money(t.amount, cur).red()
        } else {
            money(t.amount, cur).green()
        };
        table.add_row(vec![
            Cell::new(t.date),
            Cell::new(&t.description),
            Cell::new(amount),
            Cell::new(t.category.name()),
        ]);
    }
    println!("\nTransactions (newest first)\n{table}");
    let hidden = report.transactions.len().saturating_sub(TRANSACTION_PREVIEW);
    if hidden > 0 {
        println!("... and {hidden} more. Use --json for the full list.");
    }
}
