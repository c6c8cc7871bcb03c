use std::path::Path;
use std::sync::OnceLock;

use encoding_rs::Encoding;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::detect::FileType;
use crate::error::{Result, StatementError};
use crate::models::{AccountMetadata, Cell, RawTable};
use crate::settings::Settings;

/// How far into a file to look for the real header row past any preamble.
const HEADER_SCAN_LIMIT: usize = 25;

const DATE_KEYWORDS: &[&str] = &["date"];
const AMOUNT_KEYWORDS: &[&str] = &["amount", "debit", "credit", "withdrawal", "deposit"];
const DESCRIPTION_KEYWORDS: &[&str] = &[
    "description", "details", "narration", "particulars", "memo", "payee", "remarks",
];

/// A raw table plus whatever account details could be scraped alongside it.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub table: RawTable,
    pub metadata: AccountMetadata,
}

// ---------------------------------------------------------------------------
// Heuristics
// ---------------------------------------------------------------------------

/// Header row has a date column, an amount-ish column and a description-ish column.
pub fn is_transaction_like(headers: &[String]) -> bool {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let has = |keywords: &[&str]| {
        lowered
            .iter()
            .any(|h| keywords.iter().any(|k| h.contains(k)))
    };
    has(DATE_KEYWORDS) && has(AMOUNT_KEYWORDS) && has(DESCRIPTION_KEYWORDS)
}

fn row_labels(row: &[Cell]) -> Vec<String> {
    row.iter().map(|c| c.as_text().unwrap_or_default()).collect()
}

fn is_blank(row: &[Cell]) -> bool {
    row.iter().all(Cell::is_empty)
}

/// Index of the header row: the first transaction-like row near the top,
/// else the first non-blank row.
pub fn locate_header(rows: &[Vec<Cell>]) -> Option<usize> {
    rows.iter()
        .take(HEADER_SCAN_LIMIT)
        .position(|r| is_transaction_like(&row_labels(r)))
        .or_else(|| rows.iter().position(|r| !is_blank(r)))
}

/// Build a table from loose rows, returning it with the rows that preceded the header.
pub fn build_table(rows: Vec<Vec<Cell>>) -> Option<(RawTable, Vec<Vec<Cell>>)> {
    let header_idx = locate_header(&rows)?;
    let mut rows = rows.into_iter();
    let preamble: Vec<Vec<Cell>> = rows.by_ref().take(header_idx).collect();
    let header_row = rows.next()?;
    let headers = row_labels(&header_row)
        .into_iter()
        .enumerate()
        .map(|(i, h)| if h.is_empty() { format!("column_{}", i + 1) } else { h })
        .collect();
    let mut table = RawTable::new(headers);
    for row in rows.filter(|r| !is_blank(r)) {
        table.push_row(row);
    }
    Some((table, preamble))
}

fn account_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:account\s*(?:number|no\.?|#)|acct\.?\s*(?:no\.?|#)?|a/c\s*(?:no\.?)?)\s*[:#.\-]?\s*([0-9*xX][0-9*xX \-]{2,}[0-9])",
        )
        .expect("valid regex")
    })
}

const BANK_MARKERS: &[&str] = &["bank", "banc", "credit union", "building society"];

/// Best-effort scan for an account number and bank name in free text.
pub fn scan_account_metadata<'a>(lines: impl IntoIterator<Item = &'a str>) -> AccountMetadata {
    let mut meta = AccountMetadata::default();
    for line in lines {
        let line = line.trim();
        if meta.account_number.is_none() {
            if let Some(m) = account_number_re().captures(line).and_then(|c| c.get(1)) {
                let number: String = m.as_str().chars().filter(|c| !matches!(c, ' ' | '-')).collect();
                meta.account_number = Some(number);
            }
        }
        if meta.bank_name.is_none() && line.len() <= 60 {
            let lower = line.to_lowercase();
            if BANK_MARKERS.iter().any(|m| lower.contains(m)) && !lower.contains("statement") {
                let name = line.split([',', ':', '|']).next().unwrap_or(line).trim();
                if !name.is_empty() {
                    meta.bank_name = Some(name.to_string());
                }
            }
        }
        if meta.account_number.is_some() && meta.bank_name.is_some() {
            break;
        }
    }
    meta
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

/// Decode with the first encoding that accepts the bytes, else lossily.
pub fn decode_text(bytes: &[u8], labels: &[String]) -> String {
    for label in labels {
        let Some(encoding) = Encoding::for_label(label.trim().as_bytes()) else {
            warn!("Unknown encoding label '{label}', skipping");
            continue;
        };
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            debug!("Decoded statement as {}", encoding.name());
            return text.trim_start_matches('\u{feff}').to_string();
        }
        debug!("Statement is not valid {}", encoding.name());
    }
    warn!("No configured encoding decoded the statement cleanly; replacing invalid bytes");
    String::from_utf8_lossy(bytes)
        .trim_start_matches('\u{feff}')
        .to_string()
}

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Prefer the delimiter that splits some early line into a transaction-like
/// header, so a comma in a preamble line cannot win for a ';' file. Otherwise
/// the most frequent delimiter across the scanned lines, ',' by default.
pub fn sniff_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(HEADER_SCAN_LIMIT)
        .collect();
    for line in &lines {
        let mut best: Option<(u8, usize)> = None;
        for candidate in DELIMITERS {
            let fields: Vec<String> = line
                .split(candidate as char)
                .map(|f| f.trim().trim_matches('"').to_string())
                .collect();
            if fields.len() < 2 || !is_transaction_like(&fields) {
                continue;
            }
            if best.map_or(true, |(_, n)| fields.len() > n) {
                best = Some((candidate, fields.len()));
            }
        }
        if let Some((delimiter, _)) = best {
            return delimiter;
        }
    }
    let mut best = (b',', 0usize);
    for candidate in DELIMITERS {
        let count: usize = lines
            .iter()
            .map(|l| l.bytes().filter(|b| *b == candidate).count())
            .sum();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

pub fn parse_delimited(text: &str) -> Result<Option<Extraction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(sniff_delimiter(text))
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for result in rdr.records() {
        let Ok(record) = result else { continue };
        rows.push(record.iter().map(Cell::text).collect::<Vec<_>>());
    }
    let Some((table, preamble)) = build_table(rows) else {
        return Ok(None);
    };
    let preamble_lines: Vec<String> = preamble
        .iter()
        .map(|r| row_labels(r).join(" ").trim().to_string())
        .collect();
    let metadata = scan_account_metadata(preamble_lines.iter().map(String::as_str));
    Ok(Some(Extraction { table, metadata }))
}

fn read_delimited(file_path: &Path, settings: &Settings) -> Result<Extraction> {
    let bytes = std::fs::read(file_path)?;
    let text = decode_text(&bytes, &settings.encodings);
    parse_delimited(&text)?.ok_or_else(|| StatementError::ExtractionFailure {
        file_type: FileType::Csv.tag().to_string(),
        attempted: Vec::new(),
    })
}

// ---------------------------------------------------------------------------
// Spreadsheet
// ---------------------------------------------------------------------------

/// First table passing the likeness heuristic, else the first table seen.
pub fn pick_sheet(tables: impl IntoIterator<Item = (String, RawTable)>) -> Option<RawTable> {
    let mut first: Option<RawTable> = None;
    for (name, table) in tables {
        if is_transaction_like(&table.headers) {
            info!("Using sheet '{name}' ({} rows)", table.len());
            return Some(table);
        }
        debug!("Sheet '{name}' does not look like a transaction table");
        if first.is_none() {
            first = Some(table);
        }
    }
    if first.is_some() {
        warn!("No sheet looks like a transaction table; falling back to the first sheet");
    }
    first
}

#[cfg(feature = "spreadsheet")]
fn data_to_cell(data: &calamine::Data) -> Cell {
    use calamine::Data;
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => crate::normalizer::excel_serial_to_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Empty),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

#[cfg(feature = "spreadsheet")]
fn read_spreadsheet(file_path: &Path, file_type: FileType) -> Result<Extraction> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(file_path)?;
    let names = workbook.sheet_names().to_vec();
    let sheets = names.into_iter().filter_map(|name| {
        let range = match workbook.worksheet_range(&name) {
            Ok(range) => range,
            Err(e) => {
                warn!("Skipping unreadable sheet '{name}': {e}");
                return None;
            }
        };
        let rows: Vec<Vec<Cell>> = range
            .rows()
            .map(|r| r.iter().map(data_to_cell).collect())
            .collect();
        build_table(rows).map(|(table, _)| (name, table))
    });
    let table = pick_sheet(sheets).ok_or_else(|| StatementError::ExtractionFailure {
        file_type: file_type.tag().to_string(),
        attempted: Vec::new(),
    })?;
    Ok(Extraction {
        table,
        metadata: AccountMetadata::default(),
    })
}

#[cfg(not(feature = "spreadsheet"))]
fn read_spreadsheet(_file_path: &Path, _file_type: FileType) -> Result<Extraction> {
    Err(StatementError::Other(
        "Spreadsheet support is not enabled in this build".to_string(),
    ))
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn extract_table(file_path: &Path, file_type: FileType, settings: &Settings) -> Result<Extraction> {
    let extraction = match file_type {
        FileType::Csv => read_delimited(file_path, settings)?,
        FileType::XlsLegacy | FileType::Xlsx => read_spreadsheet(file_path, file_type)?,
        FileType::Pdf => crate::pdf::read_pdf(file_path)?,
    };
    info!(
        "Extracted {} rows with columns [{}]",
        extraction.table.len(),
        extraction.table.headers.join(", ")
    );
    Ok(extraction)
}
