//! Qualification question import: tabular parsing, header normalization,
//! row validation, template generation and sequential bulk commit.

pub mod commit;
pub mod domain;
mod excel;
pub mod headers;
mod normalizer;
mod tabular;
mod template;
mod validator;

pub use commit::{
    append_questions, commit_questions, CampaignId, CommitFailure, CommitSummary, NewQuestion,
    QuestionRepository, RepositoryError,
};
pub use domain::{ImportResult, ParsedQuestion, QuestionOption, QuestionType};
pub use headers::{FieldMapping, QuestionField};
pub use tabular::{detect_delimiter, Delimiter};
pub use template::{generate_template, TEMPLATE_CONTENT_TYPE, TEMPLATE_FILENAME};
pub use validator::{DEFAULT_WEIGHT, MAX_WEIGHT, MIN_WEIGHT};

use crate::config::ImportConfig;
use std::io::Read;
use std::path::Path;

/// Structural failures that abort a whole import before any row is processed.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read question file: {0}")]
    Io(#[from] std::io::Error),
    #[error("question file is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read spreadsheet: {0}")]
    Excel(#[from] calamine::Error),
    #[error("file needs a header row and at least one data row")]
    EmptyFile,
    #[error("required column '{column}' not found in header")]
    MissingRequiredColumn { column: &'static str },
    #[error("file of {size} bytes exceeds the {limit} byte import limit")]
    TooLarge { size: usize, limit: usize },
}

/// Container format of an uploaded question file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    /// Any spreadsheet calamine reads; only the first worksheet is used.
    Excel,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => Self::Excel,
            _ => Self::Csv,
        }
    }

    pub fn from_content_type(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel"
            | "application/vnd.ms-excel.sheet.macroenabled.12"
            | "application/vnd.oasis.opendocument.spreadsheet" => Self::Excel,
            _ => Self::Csv,
        }
    }
}

pub struct QuestionImporter;

impl QuestionImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ImportResult, ImportError> {
        let path = path.as_ref();
        let format = SourceFormat::from_path(path);
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, format)
    }

    pub fn from_reader<R: Read>(
        mut reader: R,
        format: SourceFormat,
    ) -> Result<ImportResult, ImportError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(bytes, format)
    }

    /// Rejects payloads above the configured limit before decoding anything.
    pub fn from_upload(
        bytes: Vec<u8>,
        format: SourceFormat,
        limits: &ImportConfig,
    ) -> Result<ImportResult, ImportError> {
        if bytes.len() > limits.max_upload_bytes {
            return Err(ImportError::TooLarge {
                size: bytes.len(),
                limit: limits.max_upload_bytes,
            });
        }
        Self::from_bytes(bytes, format)
    }

    pub fn from_bytes(bytes: Vec<u8>, format: SourceFormat) -> Result<ImportResult, ImportError> {
        let text = match format {
            SourceFormat::Csv => String::from_utf8(bytes)?,
            SourceFormat::Excel => excel::workbook_to_csv(bytes)?,
        };
        Self::from_text(&text)
    }

    /// Parses, maps and validates CSV text. Row problems are reported per
    /// question; only structural problems return an error.
    pub fn from_text(text: &str) -> Result<ImportResult, ImportError> {
        let table = tabular::parse_table(text)?;
        let mapping = FieldMapping::from_header(&table.header)?;

        let questions: Vec<ParsedQuestion> = table
            .rows
            .iter()
            .map(|row| validator::validate_row(row, &mapping))
            .collect();

        let result = ImportResult::from_questions(questions);
        tracing::info!(
            delimiter = ?table.delimiter,
            valid = result.valid_count,
            invalid = result.invalid_count,
            total = result.total_count,
            "question import parsed"
        );
        Ok(result)
    }
}
