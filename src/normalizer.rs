use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::error::{Result, StatementError};
use crate::models::{Cell, RawTable};

// ---------------------------------------------------------------------------
// Value coercion
// ---------------------------------------------------------------------------

const CURRENCY_SYMBOLS: &[char] = &['$', '₦', '€', '£', '¥', '₹', '"', ',', ' ', '\u{a0}'];

fn currency_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:[A-Z]{3}\s*)?(.*?)(?:\s*[A-Z]{3})?$").expect("valid regex"))
}

fn time_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.*?)[ T]\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?\s*(?:[AaPp][Mm])?(?:Z|[+-]\d{2}:?\d{2})?$")
            .expect("valid regex")
    })
}

/// Rewrite "1.234,56" and "-3,50" in point-decimal form. A final comma followed
/// by one or two digits, with no point after it, is a decimal separator.
fn decimal_comma_to_point(s: &str) -> String {
    let Some(pos) = s.rfind(',') else {
        return s.to_string();
    };
    let tail = &s[pos + 1..];
    let digits = tail.chars().take_while(|c| c.is_ascii_digit()).count();
    let rest = &tail[digits..];
    if (1..=2).contains(&digits) && !rest.contains(|c: char| c.is_ascii_digit() || c == '.') {
        format!("{}.{}", s[..pos].replace('.', ""), tail)
    } else {
        s.to_string()
    }
}

/// Parse a bank-formatted amount. Returns `None` for anything non-numeric.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let mut s = raw.trim().to_uppercase();
    if s.is_empty() {
        return None;
    }
    let mut negative = false;
    if let Some(rest) = s.strip_suffix("DR") {
        negative = true;
        s = rest.trim_end().to_string();
    } else if let Some(rest) = s.strip_suffix("CR") {
        s = rest.trim_end().to_string();
    }
    if let Some(inner) = currency_code_re().captures(&s).and_then(|c| c.get(1)) {
        s = inner.as_str().to_string();
    }
    let s = decimal_comma_to_point(&s);
    let mut s: String = s.chars().filter(|c| !CURRENCY_SYMBOLS.contains(c)).collect();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        negative = !negative;
        s = inner.to_string();
    }
    if let Some(inner) = s.strip_suffix('-') {
        negative = !negative;
        s = inner.to_string();
    }
    // "-$50.00" leaves "-50.00" once the symbol is gone.
    let value: f64 = s.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

fn expand_year(y: i32) -> i32 {
    match y {
        0..=69 => 2000 + y,
        70..=99 => 1900 + y,
        _ => y,
    }
}

fn parse_numeric_date(s: &str, day_first: bool) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split(['/', '-', '.']).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }
    if parts[0].len() == 4 {
        let y: i32 = parts[0].parse().ok()?;
        let m: u32 = parts[1].parse().ok()?;
        let d: u32 = parts[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    let a: u32 = parts[0].parse().ok()?;
    let b: u32 = parts[1].parse().ok()?;
    let y = expand_year(parts[2].parse().ok()?);
    let (mut m, mut d) = if day_first { (b, a) } else { (a, b) };
    if m > 12 && d <= 12 {
        std::mem::swap(&mut m, &mut d);
    }
    NaiveDate::from_ymd_opt(y, m, d)
}

const NAMED_MONTH_FORMATS: &[&str] = &[
    "%d-%b-%Y", "%d %b %Y", "%d-%B-%Y", "%d %B %Y", "%b %d, %Y", "%B %d, %Y", "%b %d %Y",
    "%d-%b-%y", "%d %b %y", "%d %b, %Y",
];

/// Parse a statement date in any of the common bank layouts.
pub fn parse_date(raw: &str, day_first: bool) -> Option<NaiveDate> {
    let mut s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(date_part) = time_suffix_re().captures(s).and_then(|c| c.get(1)) {
        s = date_part.as_str().trim();
    }
    if let Some(date) = parse_numeric_date(s, day_first) {
        return Some(date);
    }
    NAMED_MONTH_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Serial of 9999-12-31, the last date Excel can represent.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial.trunc() as i64))
}

pub fn coerce_date(cell: &Cell, day_first: bool) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        // Serials between 1954 and 2119; anything else is not a date.
        Cell::Number(n) if (20_000.0..80_000.0).contains(n) => excel_serial_to_date(*n),
        Cell::Text(s) => parse_date(s, day_first),
        _ => None,
    }
}

pub fn coerce_amount(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => parse_amount(s),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Column binding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Description,
    Amount,
    Debit,
    Credit,
    Balance,
    Reference,
}

impl Field {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Description => "description",
            Self::Amount => "amount",
            Self::Debit => "debit",
            Self::Credit => "credit",
            Self::Balance => "balance",
            Self::Reference => "reference",
        }
    }

    /// Known header variants, most specific first.
    pub fn variants(&self) -> &'static [&'static str] {
        match self {
            Self::Date => &[
                "transaction date", "trans date", "txn date", "posted date", "posting date",
                "booking date", "value date", "date",
            ],
            Self::Description => &[
                "description", "narration", "narrative", "transaction details", "details",
                "particulars", "memo", "payee", "remarks",
            ],
            Self::Amount => &["transaction amount", "amount", "amt"],
            Self::Debit => &["debit", "withdrawal", "money out", "paid out"],
            Self::Credit => &["credit", "deposit", "lodgement", "money in", "paid in"],
            Self::Balance => &["running balance", "balance", "running bal"],
            Self::Reference => &["reference", "ref", "cheque", "check number", "transaction id"],
        }
    }
}

// Debit and credit bind before amount so "Debit Amount" is never taken as the amount.
const BINDING_ORDER: &[Field] = &[
    Field::Date,
    Field::Debit,
    Field::Credit,
    Field::Amount,
    Field::Description,
    Field::Balance,
    Field::Reference,
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMapping {
    bindings: Vec<(Field, usize)>,
}

impl ColumnMapping {
    pub fn column(&self, field: Field) -> Option<usize> {
        self.bindings
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, idx)| *idx)
    }

    pub fn has(&self, field: Field) -> bool {
        self.column(field).is_some()
    }

    fn has_amount_source(&self) -> bool {
        self.has(Field::Amount) || self.has(Field::Debit) || self.has(Field::Credit)
    }
}

pub fn map_columns(headers: &[String]) -> ColumnMapping {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let mut mapping = ColumnMapping::default();
    for field in BINDING_ORDER {
        let found = field.variants().iter().find_map(|variant| {
            lowered.iter().enumerate().position(|(idx, header)| {
                !mapping.bindings.iter().any(|(_, used)| *used == idx) && header.contains(variant)
            })
        });
        if let Some(idx) = found {
            debug!("Bound column '{}' to {}", headers[idx], field.key());
            mapping.bindings.push((*field, idx));
        }
    }
    mapping
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// One source row reduced to canonical fields, not yet validated.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub date: Cell,
    pub description: Cell,
    pub amount: Option<f64>,
    pub balance: Option<f64>,
    pub reference: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub mapping: ColumnMapping,
    pub records: Vec<NormalizedRecord>,
}

enum AmountSource {
    DebitCredit(usize, usize),
    DebitOnly(usize),
    CreditOnly(usize),
    Direct(usize),
}

impl AmountSource {
    fn resolve(mapping: &ColumnMapping) -> Option<Self> {
        let amount = mapping.column(Field::Amount);
        match (mapping.column(Field::Debit), mapping.column(Field::Credit), amount) {
            (Some(d), Some(c), _) => Some(Self::DebitCredit(d, c)),
            (Some(d), None, None) => Some(Self::DebitOnly(d)),
            (None, Some(c), None) => Some(Self::CreditOnly(c)),
            (_, _, Some(a)) => Some(Self::Direct(a)),
            (None, None, None) => None,
        }
    }

    fn amount(&self, row: &[Cell]) -> Option<f64> {
        let numeric_or_zero = |idx: usize| row.get(idx).and_then(coerce_amount).unwrap_or(0.0);
        match *self {
            Self::DebitCredit(d, c) => Some(numeric_or_zero(c) - numeric_or_zero(d)),
            Self::DebitOnly(d) => Some(-numeric_or_zero(d)),
            Self::CreditOnly(c) => Some(numeric_or_zero(c)),
            Self::Direct(a) => row.get(a).and_then(coerce_amount),
        }
    }
}

pub fn normalize(table: &RawTable) -> Result<NormalizedTable> {
    let mapping = map_columns(&table.headers);

    let mut missing = Vec::new();
    if !mapping.has(Field::Date) {
        missing.push(Field::Date.key().to_string());
    }
    if !mapping.has(Field::Description) {
        missing.push(Field::Description.key().to_string());
    }
    if !mapping.has_amount_source() {
        missing.push(Field::Amount.key().to_string());
    }
    let (Some(date_idx), Some(desc_idx), Some(source)) = (
        mapping.column(Field::Date),
        mapping.column(Field::Description),
        AmountSource::resolve(&mapping),
    ) else {
        return Err(StatementError::MissingRequiredColumns {
            missing,
            available: table.headers.clone(),
        });
    };

    let cell = |row: &[Cell], idx: Option<usize>| -> Cell {
        idx.and_then(|i| row.get(i).cloned()).unwrap_or(Cell::Empty)
    };
    let balance_idx = mapping.column(Field::Balance);
    let reference_idx = mapping.column(Field::Reference);

    let records = table
        .rows
        .iter()
        .map(|row| NormalizedRecord {
            date: cell(row, Some(date_idx)),
            description: cell(row, Some(desc_idx)),
            amount: source.amount(row),
            balance: balance_idx.and_then(|i| row.get(i)).and_then(coerce_amount),
            reference: cell(row, reference_idx).as_text(),
        })
        .collect();

    Ok(NormalizedTable { mapping, records })
}
