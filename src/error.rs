use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatementError {
    #[error("Unsupported file type: {file_type}. Supported types: .csv, .xls, .xlsx, .pdf")]
    UnsupportedFileType { file_type: String },

    #[error("Could not extract a transaction table from {file_type} file")]
    ExtractionFailure {
        file_type: String,
        attempted: Vec<String>,
    },

    #[error("Missing required columns: {}", missing.join(", "))]
    MissingRequiredColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("No valid transactions found after cleaning")]
    NoValidTransactions,

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "spreadsheet")]
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, StatementError>;

/// Structured error returned across the processing boundary instead of a fault.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorPayload {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempted_strategies: Option<Vec<String>>,
}

impl StatementError {
    pub fn to_payload(&self) -> ErrorPayload {
        let mut payload = ErrorPayload {
            error: self.to_string(),
            file_type: None,
            supported_types: None,
            missing_columns: None,
            available_columns: None,
            attempted_strategies: None,
        };
        match self {
            Self::UnsupportedFileType { file_type } => {
                payload.file_type = Some(file_type.clone());
                payload.supported_types = Some(
                    crate::detect::SUPPORTED_EXTENSIONS
                        .iter()
                        .map(|e| format!(".{e}"))
                        .collect(),
                );
            }
            Self::ExtractionFailure { file_type, attempted } => {
                payload.file_type = Some(file_type.clone());
                if !attempted.is_empty() {
                    payload.attempted_strategies = Some(attempted.clone());
                }
            }
            Self::MissingRequiredColumns { missing, available } => {
                payload.missing_columns = Some(missing.clone());
                payload.available_columns = Some(available.clone());
            }
            Self::NoValidTransactions | Self::InvalidOptions(_) => {}
            // Anything else is a generic processing failure.
            _ => payload.error = format!("Error processing statement: {self}"),
        }
        payload
    }

    /// The payload as JSON, as printed across the processing boundary.
    pub fn to_json(&self) -> serde_json::Value {
        let payload = self.to_payload();
        serde_json::to_value(&payload).unwrap_or_else(|_| serde_json::json!({ "error": payload.error }))
    }
}
