use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::{Result, StatementError};

pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "xls", "xlsx", "pdf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    #[serde(rename = "xls")]
    XlsLegacy,
    Xlsx,
    Pdf,
}

impl FileType {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::XlsLegacy => "xls",
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Csv => "Delimited text",
            Self::XlsLegacy => "Excel 97-2003 workbook",
            Self::Xlsx => "Excel workbook",
            Self::Pdf => "PDF statement",
        }
    }

    pub fn is_spreadsheet(&self) -> bool {
        matches!(self, Self::XlsLegacy | Self::Xlsx)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Map a file name to its statement format. Only the extension is inspected.
pub fn detect_file_type(file_path: &Path) -> Result<FileType> {
    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => Ok(FileType::Csv),
        "xls" => Ok(FileType::XlsLegacy),
        "xlsx" => Ok(FileType::Xlsx),
        "pdf" => Ok(FileType::Pdf),
        _ => Err(StatementError::UnsupportedFileType {
            file_type: if ext.is_empty() {
                String::new()
            } else {
                format!(".{ext}")
            },
        }),
    }
}
