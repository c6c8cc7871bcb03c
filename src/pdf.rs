use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{Result, StatementError};
use crate::extractor::{is_transaction_like, scan_account_metadata, Extraction};
use crate::models::{Cell, RawTable};
use crate::normalizer::{parse_amount, Field};

/// Text of a PDF statement, one entry per page.
#[derive(Debug, Clone, Default)]
pub struct PdfText {
    pages: Vec<String>,
}

impl PdfText {
    pub fn from_text(text: &str) -> Self {
        let pages = text
            .split('\u{000C}')
            .filter(|p| !p.trim().is_empty())
            .map(str::to_string)
            .collect();
        Self { pages }
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|p| p.lines())
    }
}

// ---------------------------------------------------------------------------
// Strategies, tried in declaration order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PdfStrategy {
    StructuredTables,
    LayoutTables,
    LineScan,
}

pub const ALL_STRATEGIES: &[PdfStrategy] = &[
    PdfStrategy::StructuredTables,
    PdfStrategy::LayoutTables,
    PdfStrategy::LineScan,
];

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    Found { table: RawTable, transaction_like: bool },
    Failed(String),
}

impl PdfStrategy {
    pub fn key(&self) -> &'static str {
        match self {
            Self::StructuredTables => "structured_tables",
            Self::LayoutTables => "layout_tables",
            Self::LineScan => "line_scan",
        }
    }

    fn candidates(&self, doc: &PdfText) -> Vec<RawTable> {
        match self {
            Self::StructuredTables => structured_tables(doc),
            Self::LayoutTables => layout_tables(doc),
            Self::LineScan => line_scan(doc).into_iter().collect(),
        }
    }

    pub fn run(&self, doc: &PdfText) -> StrategyOutcome {
        let candidates = self.candidates(doc);
        let found = candidates.len();
        match select_candidate(candidates) {
            Some(table) => StrategyOutcome::Found {
                transaction_like: is_transaction_like(&table.headers),
                table,
            },
            None if found == 0 => StrategyOutcome::Failed("no tables found".to_string()),
            None => StrategyOutcome::Failed(format!("{found} tables found, all empty")),
        }
    }
}

/// Largest transaction-like table, else the largest of any; ties go to the earliest found.
pub fn select_candidate(tables: Vec<RawTable>) -> Option<RawTable> {
    let (likely, other): (Vec<RawTable>, Vec<RawTable>) = tables
        .into_iter()
        .filter(|t| !t.is_empty())
        .partition(|t| is_transaction_like(&t.headers));
    let pool = if likely.is_empty() { other } else { likely };
    let mut largest: Option<RawTable> = None;
    for table in pool {
        if largest.as_ref().map_or(true, |l| table.len() > l.len()) {
            largest = Some(table);
        }
    }
    largest
}

/// Try each strategy once, in order. The first transaction-like table wins.
pub fn run_cascade(doc: &PdfText) -> Result<RawTable> {
    let mut attempted = Vec::new();
    let mut fallback: Option<RawTable> = None;
    for strategy in ALL_STRATEGIES {
        attempted.push(strategy.key().to_string());
        match strategy.run(doc) {
            StrategyOutcome::Found { table, transaction_like: true } => {
                info!("PDF strategy {} produced {} rows", strategy.key(), table.len());
                return Ok(table);
            }
            StrategyOutcome::Found { table, .. } => {
                warn!(
                    "PDF strategy {} found a table without transaction columns [{}]",
                    strategy.key(),
                    table.headers.join(", ")
                );
                fallback.get_or_insert(table);
            }
            StrategyOutcome::Failed(reason) => {
                warn!("PDF strategy {} failed: {reason}", strategy.key());
            }
        }
    }
    fallback.ok_or(StatementError::ExtractionFailure {
        file_type: "pdf".to_string(),
        attempted,
    })
}

// ---------------------------------------------------------------------------
// (a) Structured tables: cells separated by tabs, pipes or wide gaps
// ---------------------------------------------------------------------------

fn wide_gap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").expect("valid regex"))
}

/// Tab and pipe rows keep blank interior cells; wide-gap rows cannot have any.
fn split_cells(line: &str) -> Vec<String> {
    let line = line.trim();
    let parts: Vec<&str> = if line.contains('\t') {
        line.split('\t').collect()
    } else if line.contains('|') {
        line.trim_matches('|').split('|').collect()
    } else {
        return wide_gap_re()
            .split(line)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
    };
    if parts.len() < 2 {
        return Vec::new();
    }
    parts.into_iter().map(|p| p.trim().to_string()).collect()
}

/// Group rows under header lines; a repeated identical header continues the table.
fn collect_tables<'a>(
    lines: impl Iterator<Item = &'a str>,
    mut split: impl FnMut(&str, Option<&[String]>) -> Vec<String>,
) -> Vec<RawTable> {
    let mut tables: Vec<RawTable> = Vec::new();
    let mut current: Option<RawTable> = None;
    for line in lines {
        let header_cells = split(line, None);
        if header_cells.len() >= 2 && is_transaction_like(&header_cells) {
            match current.take() {
                Some(t) if t.headers == header_cells => current = Some(t),
                Some(t) => {
                    tables.push(t);
                    current = Some(RawTable::new(header_cells));
                }
                None => current = Some(RawTable::new(header_cells)),
            }
            continue;
        }
        let Some(table) = current.as_mut() else {
            continue;
        };
        let cells = split(line, Some(&table.headers));
        if cells.iter().filter(|c| !c.is_empty()).count() >= 2 {
            table.push_row(cells.iter().map(|c| Cell::text(c)).collect());
        }
    }
    tables.extend(current);
    tables
}

/// Only rows with exactly one cell per header column are kept.
fn structured_tables(doc: &PdfText) -> Vec<RawTable> {
    collect_tables(doc.lines(), |line, current| {
        let cells = split_cells(line);
        match current {
            Some(headers) if cells.len() != headers.len() => Vec::new(),
            _ => cells,
        }
    })
}

// ---------------------------------------------------------------------------
// (b) Layout-aware tables: columns placed by header character offsets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Span {
    text: String,
    start: usize,
    end: usize,
}

fn word_spans(line: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let chars: Vec<char> = line.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        match (c.is_whitespace(), start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                spans.push(Span { text: chars[s..i].iter().collect(), start: s, end: i });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push(Span { text: chars[s..].iter().collect(), start: s, end: chars.len() });
    }
    spans
}

fn multiword_labels() -> &'static Vec<String> {
    static LABELS: OnceLock<Vec<String>> = OnceLock::new();
    LABELS.get_or_init(|| {
        [
            Field::Date,
            Field::Description,
            Field::Amount,
            Field::Debit,
            Field::Credit,
            Field::Balance,
            Field::Reference,
        ]
        .iter()
        .flat_map(|f| f.variants().iter())
        .filter(|v| v.contains(' '))
        .map(|v| v.to_string())
        .collect()
    })
}

/// Header words, with known multi-word labels ("Value Date") kept together.
fn header_spans(line: &str) -> Vec<Span> {
    let words = word_spans(line);
    let mut merged: Vec<Span> = Vec::new();
    let mut i = 0;
    while i < words.len() {
        let mut span = words[i].clone();
        let mut j = i + 1;
        while j < words.len() {
            let joined = format!("{} {}", span.text, words[j].text).to_lowercase();
            if !multiword_labels().iter().any(|l| l.starts_with(&joined)) {
                break;
            }
            span = Span {
                text: format!("{} {}", span.text, words[j].text),
                start: span.start,
                end: words[j].end,
            };
            j += 1;
        }
        merged.push(span);
        i = j;
    }
    merged
}

fn column_for(word: &Span, columns: &[Span]) -> usize {
    let overlap = |c: &Span| word.end.min(c.end) as i64 - word.start.max(c.start) as i64;
    let mut best = 0;
    let mut best_overlap = i64::MIN;
    for (idx, col) in columns.iter().enumerate() {
        let o = overlap(col);
        if o > best_overlap {
            best = idx;
            best_overlap = o;
        }
    }
    if best_overlap > 0 {
        return best;
    }
    let center = |s: &Span| (s.start + s.end) as f64 / 2.0;
    let mut nearest = 0;
    let mut nearest_dist = f64::MAX;
    for (idx, col) in columns.iter().enumerate() {
        let d = (center(word) - center(col)).abs();
        if d < nearest_dist {
            nearest = idx;
            nearest_dist = d;
        }
    }
    nearest
}

fn slice_by_layout(line: &str, headers: &[Span]) -> Vec<String> {
    let mut cells = vec![String::new(); headers.len()];
    for word in word_spans(line) {
        let cell = &mut cells[column_for(&word, headers)];
        if !cell.is_empty() {
            cell.push(' ');
        }
        cell.push_str(&word.text);
    }
    cells
}

fn layout_tables(doc: &PdfText) -> Vec<RawTable> {
    let mut tables = Vec::new();
    for page in doc.pages() {
        let mut header: Option<Vec<Span>> = None;
        let mut page_tables = collect_tables(page.lines(), |line, current| {
            if current.is_none() {
                let spans = header_spans(line);
                let labels: Vec<String> = spans.iter().map(|s| s.text.clone()).collect();
                if spans.len() >= 2 && is_transaction_like(&labels) {
                    header = Some(spans);
                }
                return labels;
            }
            match &header {
                Some(spans) => slice_by_layout(line, spans),
                None => Vec::new(),
            }
        });
        tables.append(&mut page_tables);
    }
    // Same header on consecutive pages continues one table.
    let mut merged: Vec<RawTable> = Vec::new();
    for table in tables {
        match merged.last_mut() {
            Some(last) if last.headers == table.headers => last.rows.extend(table.rows),
            _ => merged.push(table),
        }
    }
    debug!("Layout strategy found {} candidate tables", merged.len());
    merged
}

// ---------------------------------------------------------------------------
// (c) Line scan: any line that starts with a date
// ---------------------------------------------------------------------------

fn dated_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*(\d{4}-\d{2}-\d{2}|\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}|\d{1,2}[ \-][A-Za-z]{3,9}[ \-,]+\d{2,4})\s+(.+)$",
        )
        .expect("valid regex")
    })
}

fn amount_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\(?[-+]?[$₦€£]?\d{1,3}(?:,?\d{3})*\.\d{2}\)?-?(?:CR|DR|Cr|Dr)?$").expect("valid regex")
    })
}

struct ScannedAmount {
    value: f64,
    explicit_sign: bool,
}

fn scan_amount(token: &str) -> Option<ScannedAmount> {
    if !amount_token_re().is_match(token) {
        return None;
    }
    let upper = token.to_uppercase();
    let explicit_sign = upper.starts_with('(')
        || upper.starts_with('-')
        || upper.ends_with('-')
        || upper.ends_with("CR")
        || upper.ends_with("DR");
    parse_amount(token).map(|value| ScannedAmount { value, explicit_sign })
}

fn line_scan(doc: &PdfText) -> Option<RawTable> {
    let mut rows: Vec<(String, String, f64, Option<f64>)> = Vec::new();
    let mut prev_balance: Option<f64> = None;

    for line in doc.lines() {
        let Some(caps) = dated_line_re().captures(line) else {
            continue;
        };
        let date = caps[1].to_string();
        let mut tokens: Vec<String> = caps[2].split_whitespace().map(str::to_string).collect();
        // Fold a detached "CR"/"DR" marker into the number before it.
        if tokens.len() >= 2 && matches!(tokens.last().map(|t| t.to_uppercase()).as_deref(), Some("CR" | "DR")) {
            if let Some(marker) = tokens.pop() {
                if let Some(last) = tokens.last_mut() {
                    last.push_str(&marker);
                }
            }
        }
        let mut amounts: Vec<ScannedAmount> = Vec::new();
        while amounts.len() < 2 {
            let Some(scanned) = tokens.last().and_then(|t| scan_amount(t)) else {
                break;
            };
            tokens.pop();
            amounts.insert(0, scanned);
        }
        let description = tokens.join(" ");
        if amounts.is_empty() || description.is_empty() {
            continue;
        }
        let mut amount = amounts[0].value;
        let balance = amounts.get(1).map(|b| b.value);
        // Unsigned amounts take their direction from the running balance.
        if !amounts[0].explicit_sign {
            if let (Some(prev), Some(bal)) = (prev_balance, balance) {
                let delta = bal - prev;
                if (delta.abs() - amount.abs()).abs() < 0.01 {
                    amount = amount.abs().copysign(delta);
                }
            }
        }
        if balance.is_some() {
            prev_balance = balance;
        }
        rows.push((date, description, amount, balance));
    }

    if rows.is_empty() {
        return None;
    }
    let with_balance = rows.iter().any(|r| r.3.is_some());
    let mut headers = vec!["Date".to_string(), "Description".to_string(), "Amount".to_string()];
    if with_balance {
        headers.push("Balance".to_string());
    }
    let mut table = RawTable::new(headers);
    for (date, description, amount, balance) in rows {
        let mut row = vec![Cell::Text(date), Cell::Text(description), Cell::Number(amount)];
        if with_balance {
            row.push(balance.map(Cell::Number).unwrap_or(Cell::Empty));
        }
        table.push_row(row);
    }
    Some(table)
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run the strategy cascade over already-extracted statement text.
pub fn extract_from_text(text: &str) -> Result<Extraction> {
    let doc = PdfText::from_text(text);
    let metadata = scan_account_metadata(doc.lines().take(60));
    let table = run_cascade(&doc)?;
    Ok(Extraction { table, metadata })
}

#[cfg(feature = "pdf")]
pub fn read_pdf(file_path: &Path) -> Result<Extraction> {
    let bytes = std::fs::read(file_path)?;
    // pdf-extract panics on some malformed documents.
    let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes));
    let text = match extracted {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("Failed to extract text from PDF: {e}");
            String::new()
        }
        Err(_) => {
            warn!("PDF text extraction aborted on a malformed document");
            String::new()
        }
    };
    extract_from_text(&text)
}

#[cfg(not(feature = "pdf"))]
pub fn read_pdf(_file_path: &Path) -> Result<Extraction> {
    Err(StatementError::Other(
        "PDF support is not enabled in this build".to_string(),
    ))
}
