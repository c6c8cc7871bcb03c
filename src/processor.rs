use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};

use crate::categorizer::CategoryTable;
use crate::detect::detect_file_type;
use crate::error::{Result, StatementError};
use crate::extractor::{extract_table, Extraction};
use crate::models::{round2, AccountMetadata, CanonicalTransaction, Category, RecurringGroup};
use crate::normalizer::{coerce_date, normalize, NormalizedTable};
use crate::patterns::{analyze_patterns, SpendingPatterns};
use crate::recurring::{detect_recurring, RecurrenceConfig};
use crate::reports::{summarize, Breakdowns, StatementSummary};
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Per-call parameters, validated up front.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOptions {
    currency: String,
    supplemental_income: f64,
}

impl ProcessOptions {
    pub fn new(currency: &str, supplemental_income: f64) -> Result<Self> {
        let currency = currency.trim();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(StatementError::InvalidOptions(format!(
                "currency must be a 3-letter code, got '{currency}'"
            )));
        }
        if !supplemental_income.is_finite() || supplemental_income < 0.0 {
            return Err(StatementError::InvalidOptions(format!(
                "supplemental income must be a non-negative number, got {supplemental_income}"
            )));
        }
        Ok(Self {
            currency: currency.to_uppercase(),
            supplemental_income,
        })
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn supplemental_income(&self) -> f64 {
        self.supplemental_income
    }
}

// ---------------------------------------------------------------------------
// File details
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDetails {
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub size_bytes: u64,
    pub size_mb: f64,
    pub checksum: String,
}

pub fn file_info(file_path: &Path) -> Result<FileDetails> {
    let file_type = detect_file_type(file_path)?;
    let bytes = std::fs::read(file_path)?;
    let size_bytes = bytes.len() as u64;
    Ok(FileDetails {
        name: file_name(file_path),
        file_type: file_type.tag().to_string(),
        size_bytes,
        size_mb: round2(size_bytes as f64 / (1024.0 * 1024.0)),
        checksum: hex::encode(Sha256::digest(&bytes)),
    })
}

fn file_name(file_path: &Path) -> String {
    file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    #[serde(rename = "type")]
    pub file_type: String,
    pub name: String,
    pub processing_date: String,
    pub size_bytes: u64,
    pub checksum: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountInfo {
    pub file_name: String,
    pub file_type: String,
    pub processing_date: String,
    #[serde(flatten)]
    pub metadata: AccountMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlights {
    pub highest_expense: Option<CanonicalTransaction>,
    pub highest_income: Option<CanonicalTransaction>,
    pub recurring_transactions: Vec<RecurringGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub spending_patterns: SpendingPatterns,
    pub average_daily_spending: f64,
    pub most_frequent_category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementReport {
    pub file_info: FileInfo,
    pub account_info: AccountInfo,
    pub summary: StatementSummary,
    pub breakdowns: Breakdowns,
    pub highlights: Highlights,
    pub analysis: Analysis,
    /// Newest first.
    pub transactions: Vec<CanonicalTransaction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Focus {
    Summary,
    Spending,
    Recurring,
    Patterns,
}

impl StatementReport {
    /// A narrowed view of the report for one area of interest.
    pub fn focus(&self, focus: Focus) -> Value {
        match focus {
            Focus::Summary => json!({
                "file_info": self.file_info,
                "summary": self.summary,
                "breakdowns": self.breakdowns,
            }),
            Focus::Spending => json!({
                "spending_breakdown": self.breakdowns.spending_by_category,
                "highest_expense": self.highlights.highest_expense,
                "spending_patterns": self.analysis.spending_patterns,
            }),
            Focus::Recurring => {
                let recurring = &self.highlights.recurring_transactions;
                json!({
                    "recurring_transactions": recurring,
                    "summary": {
                        "total_recurring_amount": round2(recurring.iter().map(|r| r.amount).sum()),
                        "recurring_count": recurring.len(),
                    },
                })
            }
            Focus::Patterns => json!({
                "spending_patterns": self.analysis.spending_patterns,
                "average_daily_spending": self.analysis.average_daily_spending,
                "most_frequent_category": self.analysis.most_frequent_category,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

/// Runs the full pipeline. Holds only immutable configuration.
#[derive(Debug, Clone)]
pub struct StatementProcessor {
    settings: Settings,
    categories: CategoryTable,
    recurrence: RecurrenceConfig,
}

impl StatementProcessor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            settings: settings.clone(),
            categories: CategoryTable::with_extra_keywords(&settings.extra_keywords),
            recurrence: RecurrenceConfig {
                amount_tolerance: settings.recurrence_tolerance,
            },
        }
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    pub fn process(&self, file_path: &Path, options: &ProcessOptions) -> Result<StatementReport> {
        let file_type = detect_file_type(file_path)?;
        info!("Processing {} as {}", file_path.display(), file_type.name());
        let details = file_info(file_path)?;

        let Extraction { table, metadata } = extract_table(file_path, file_type, &self.settings)?;
        let normalized = normalize(&table)?;
        let mut transactions = self.clean_and_classify(normalized);
        if transactions.is_empty() {
            return Err(StatementError::NoValidTransactions);
        }
        info!("{} transactions after cleaning", transactions.len());

        let recurring = detect_recurring(&transactions, &self.recurrence);
        debug!("{} recurring groups", recurring.len());
        let spending_patterns = analyze_patterns(&transactions);
        let report = summarize(&transactions, options.supplemental_income, &options.currency)?;

        transactions.sort_by(|a, b| b.date.cmp(&a.date));

        let processing_date = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        Ok(StatementReport {
            file_info: FileInfo {
                file_type: details.file_type.clone(),
                name: details.name.clone(),
                processing_date: processing_date.clone(),
                size_bytes: details.size_bytes,
                checksum: details.checksum,
            },
            account_info: AccountInfo {
                file_name: details.name,
                file_type: details.file_type,
                processing_date,
                metadata,
            },
            summary: report.summary,
            breakdowns: report.breakdowns,
            highlights: Highlights {
                highest_expense: report.highest_expense,
                highest_income: report.highest_income,
                recurring_transactions: recurring,
            },
            analysis: Analysis {
                spending_patterns,
                average_daily_spending: report.average_daily_spending,
                most_frequent_category: report.most_frequent_category,
            },
            transactions,
        })
    }

    /// Run the pipeline and always return JSON: the report, or an error payload.
    pub fn process_to_json(&self, file_path: &Path, options: &ProcessOptions) -> Value {
        self.view_to_json(file_path, options, None)
    }

    /// Same boundary as `process_to_json`, narrowed to a focus view on success.
    pub fn view_to_json(&self, file_path: &Path, options: &ProcessOptions, focus: Option<Focus>) -> Value {
        let result = self.process(file_path, options).and_then(|report| match focus {
            Some(focus) => Ok(report.focus(focus)),
            None => Ok(serde_json::to_value(&report)?),
        });
        match result {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to process {}: {e}", file_path.display());
                e.to_json()
            }
        }
    }

    fn clean_and_classify(&self, normalized: NormalizedTable) -> Vec<CanonicalTransaction> {
        let total = normalized.records.len();
        let day_first = self.settings.day_first;
        let transactions: Vec<CanonicalTransaction> = normalized
            .records
            .into_iter()
            .filter_map(|record| {
                let date = coerce_date(&record.date, day_first)?;
                let description = record.description.as_text()?.trim().to_string();
                if description.is_empty() {
                    return None;
                }
                let amount = record.amount.filter(|a| a.is_finite())?;
                Some(CanonicalTransaction {
                    category: self.categories.classify(&description, Some(amount)),
                    date,
                    description,
                    amount,
                    balance: record.balance,
                    reference: record.reference,
                })
            })
            .collect();
        if transactions.len() < total {
            debug!("Dropped {} incomplete rows", total - transactions.len());
        }
        transactions
    }
}

impl Default for StatementProcessor {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
Date,Description,Amount
2025-01-01,Gym Membership,-50.00
2025-01-25,SALARY JAN,5000.00
2025-01-31,Gym Membership,-50.00
2025-02-10,UBER TRIP,-25.50
2025-03-02,Gym Membership,-50.00
,Missing date,-10.00
2025-02-11,,-10.00
2025-02-12,No amount,
";

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn options() -> ProcessOptions {
        ProcessOptions::new("ngn", 0.0).unwrap()
    }

    #[test]
    fn test_end_to_end_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "statement.csv", SAMPLE);
        let report = StatementProcessor::default().process(&path, &options()).unwrap();

        assert_eq!(report.summary.transaction_count, 5);
        assert_eq!(report.summary.total_income, 5000.0);
        assert_eq!(report.summary.total_expenses, 175.5);
        assert_eq!(report.summary.net_savings, 4824.5);
        assert_eq!(report.summary.currency, "NGN");
        assert_eq!(report.file_info.file_type, "csv");
        assert_eq!(report.file_info.name, "statement.csv");
        assert_eq!(report.account_info.file_name, "statement.csv");

        let recurring = &report.highlights.recurring_transactions;
        assert_eq!(recurring.len(), 1);
        assert_eq!(recurring[0].description, "Gym Membership");
        assert_eq!(recurring[0].occurrence_count, 3);

        let dates: Vec<String> = report.transactions.iter().map(|t| t.date.to_string()).collect();
        assert_eq!(dates, vec!["2025-03-02", "2025-02-10", "2025-01-31", "2025-01-25", "2025-01-01"]);
        assert_eq!(report.transactions[1].category, Category::Transport);
        assert_eq!(report.transactions[3].category, Category::Income);
    }

    #[test]
    fn test_json_shape() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "statement.csv", SAMPLE);
        let value = StatementProcessor::default().process_to_json(&path, &options());
        assert!(value.get("error").is_none());
        assert_eq!(value["summary"]["date_range"]["start"], "2025-01-01");
        assert_eq!(value["highlights"]["recurring_transactions"][0]["frequency"], "Monthly");
        assert_eq!(value["highlights"]["highest_income"]["category"], "Income");
        assert_eq!(value["transactions"][0]["date"], "2025-03-02");
        assert_eq!(value["file_info"]["checksum"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn test_idempotent_apart_from_processing_date() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "statement.csv", SAMPLE);
        let processor = StatementProcessor::default();
        let first = processor.process(&path, &options()).unwrap();
        let mut second = processor.process(&path, &options()).unwrap();
        second.file_info.processing_date = first.file_info.processing_date.clone();
        second.account_info.processing_date = first.account_info.processing_date.clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_supplemental_income() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "statement.csv", SAMPLE);
        let opts = ProcessOptions::new("USD", 1000.0).unwrap();
        let report = StatementProcessor::default().process(&path, &opts).unwrap();
        assert_eq!(report.summary.total_income, 6000.0);
        assert_eq!(report.summary.net_savings, 5824.5);
    }

    #[test]
    fn test_debit_credit_statement_with_preamble() {
        let dir = TempDir::new().unwrap();
        let csv = "\
Sunrise Bank,,,
Account Number: 0123456789,,,
,,,
Posted Date,Narration,Debit,Credit
02/01/2025,POS SHOPRITE,100.00,0
03/01/2025,SALARY,,2000.00
";
        let path = write_file(&dir, "export.csv", csv);
        let report = StatementProcessor::default().process(&path, &options()).unwrap();
        assert_eq!(report.account_info.metadata.account_number.as_deref(), Some("0123456789"));
        assert_eq!(report.account_info.metadata.bank_name.as_deref(), Some("Sunrise Bank"));
        let groceries = report.transactions.iter().find(|t| t.description == "POS SHOPRITE").unwrap();
        assert_eq!(groceries.amount, -100.0);
        assert_eq!(groceries.category, Category::Groceries);
    }

    #[test]
    fn test_single_day_statement() {
        let dir = TempDir::new().unwrap();
        let csv = "Date,Description,Amount\n2025-05-05,Lunch at cafe,-12.00\n2025-05-05,Taxi,-8.00\n";
        let path = write_file(&dir, "day.csv", csv);
        let report = StatementProcessor::default().process(&path, &options()).unwrap();
        assert_eq!(report.analysis.average_daily_spending, report.summary.total_expenses);
        assert_eq!(report.analysis.average_daily_spending, 20.0);
    }

    #[test]
    fn test_unsupported_type_payload() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "notes.txt", "hello");
        let value = StatementProcessor::default().process_to_json(&path, &options());
        assert_eq!(value["file_type"], ".txt");
        assert_eq!(value["supported_types"].as_array().unwrap().len(), 4);
        assert!(value["error"].as_str().unwrap().starts_with("Unsupported file type"));
    }

    #[test]
    fn test_missing_columns_payload() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "bad.csv", "Date,Narration\n2025-01-01,Coffee\n");
        let value = StatementProcessor::default().process_to_json(&path, &options());
        assert_eq!(value["missing_columns"], json!(["amount"]));
        assert_eq!(value["available_columns"], json!(["Date", "Narration"]));
    }

    #[test]
    fn test_no_valid_transactions() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "junk.csv", "Date,Description,Amount\nnot a date,Coffee,1.00\n");
        let err = StatementProcessor::default().process(&path, &options()).unwrap_err();
        assert!(matches!(err, StatementError::NoValidTransactions));
    }

    #[test]
    fn test_missing_file_is_generic_error() {
        let dir = TempDir::new().unwrap();
        let value = StatementProcessor::default().process_to_json(&dir.path().join("gone.csv"), &options());
        assert!(value["error"].as_str().unwrap().starts_with("Error processing statement:"));
    }

    #[test]
    fn test_option_validation() {
        assert_eq!(ProcessOptions::new(" usd ", 0.0).unwrap().currency(), "USD");
        assert!(matches!(ProcessOptions::new("NG", 0.0), Err(StatementError::InvalidOptions(_))));
        assert!(matches!(ProcessOptions::new("US1", 0.0), Err(StatementError::InvalidOptions(_))));
        assert!(matches!(ProcessOptions::new("USD", -1.0), Err(StatementError::InvalidOptions(_))));
        assert!(matches!(ProcessOptions::new("USD", f64::NAN), Err(StatementError::InvalidOptions(_))));
    }

    #[test]
    fn test_focus_views() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "statement.csv", SAMPLE);
        let report = StatementProcessor::default().process(&path, &options()).unwrap();

        let recurring = report.focus(Focus::Recurring);
        assert_eq!(recurring["summary"]["recurring_count"], 1);
        assert_eq!(recurring["summary"]["total_recurring_amount"], 50.0);

        let summary = report.focus(Focus::Summary);
        assert!(summary.get("file_info").is_some());
        assert!(summary.get("transactions").is_none());

        let spending = report.focus(Focus::Spending);
        assert_eq!(spending["highest_expense"]["amount"], -50.0);

        let patterns = report.focus(Focus::Patterns);
        assert_eq!(patterns["most_frequent_category"], "Miscellaneous Expense");
    }

    #[test]
    fn test_view_to_json() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "statement.csv", SAMPLE);
        let processor = StatementProcessor::default();

        let recurring = processor.view_to_json(&path, &options(), Some(Focus::Recurring));
        assert_eq!(recurring["summary"]["recurring_count"], 1);
        assert!(recurring.get("transactions").is_none());

        let full = processor.view_to_json(&path, &options(), None);
        assert!(full.get("transactions").is_some());

        let bad = write_file(&dir, "bad.csv", "Date,Narration\n2025-01-01,Coffee\n");
        let err = processor.view_to_json(&bad, &options(), Some(Focus::Summary));
        assert_eq!(err["error"], "Missing required columns: amount");
        assert!(err.get("summary").is_none());
    }

    #[test]
    fn test_file_info() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "abc.csv", "abc");
        let info = file_info(&path).unwrap();
        assert_eq!(info.size_bytes, 3);
        assert_eq!(info.file_type, "csv");
        assert_eq!(
            info.checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
