use super::domain::{ParsedQuestion, QuestionOption, QuestionType};
use super::headers::{FieldMapping, QuestionField};
use super::normalizer::{parse_bool, parse_options, parse_question_type};
use super::tabular::RawRow;
use std::collections::HashMap;

pub const DEFAULT_WEIGHT: u8 = 10;
pub const MIN_WEIGHT: u8 = 1;
pub const MAX_WEIGHT: u8 = 100;
pub const DEFAULT_REQUIRED: bool = true;
pub const MIN_CHOICE_OPTIONS: usize = 2;

/// Loosely typed view of one row: recognized field → trimmed cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RawRecord {
    values: HashMap<QuestionField, String>,
}

impl RawRecord {
    pub(crate) fn from_row(row: &RawRow, mapping: &FieldMapping) -> Self {
        let values = QuestionField::ordered()
            .into_iter()
            .filter_map(|field| {
                let index = mapping.column_of(field)?;
                let cell = row.cells.get(index).map(|cell| cell.trim()).unwrap_or("");
                Some((field, cell.to_string()))
            })
            .collect();

        Self { values }
    }

    /// Non-empty cell text for `field`.
    fn get(&self, field: QuestionField) -> Option<&str> {
        self.values
            .get(&field)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// Single conversion point from untyped cells to a typed question.
/// Every field is checked even after an earlier one failed.
pub(crate) fn validate_record(row_number: usize, record: &RawRecord) -> ParsedQuestion {
    let mut errors = Vec::new();

    let label = match record.get(QuestionField::Label) {
        Some(label) => label.to_string(),
        None => {
            errors.push("question text is required".to_string());
            String::new()
        }
    };

    let question_type = match record.get(QuestionField::Type) {
        None => QuestionType::Text,
        Some(raw) => parse_question_type(raw).unwrap_or_else(|| {
            errors.push(format!(
                "invalid type '{raw}' (expected one of: {})",
                QuestionType::ordered()
                    .iter()
                    .map(|candidate| candidate.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
            QuestionType::Text
        }),
    };

    let weight = match record.get(QuestionField::Weight) {
        None => DEFAULT_WEIGHT,
        Some(raw) => match raw.parse::<i64>() {
            Ok(value) if (i64::from(MIN_WEIGHT)..=i64::from(MAX_WEIGHT)).contains(&value) => {
                value as u8
            }
            Ok(value) => {
                errors.push(format!(
                    "weight {value} out of range ({MIN_WEIGHT}-{MAX_WEIGHT})"
                ));
                DEFAULT_WEIGHT
            }
            Err(_) => {
                errors.push(format!("weight '{raw}' is not an integer"));
                DEFAULT_WEIGHT
            }
        },
    };

    let is_required = boolean_field(record, QuestionField::Required, DEFAULT_REQUIRED, &mut errors);
    let is_ko = boolean_field(record, QuestionField::IsKo, false, &mut errors);
    let ko_value = record.get(QuestionField::KoValue).map(str::to_string);

    let options: Vec<QuestionOption> = record
        .get(QuestionField::Options)
        .map(|raw| parse_options(raw, &mut errors))
        .unwrap_or_default();

    if question_type == QuestionType::MultipleChoice && options.len() < MIN_CHOICE_OPTIONS {
        errors.push(format!(
            "multiple choice questions need at least {MIN_CHOICE_OPTIONS} options (found {})",
            options.len()
        ));
    }

    let is_valid = errors.is_empty();
    ParsedQuestion {
        row_number,
        label,
        question_type,
        weight,
        is_required,
        is_ko,
        ko_value,
        options,
        errors,
        is_valid,
    }
}

fn boolean_field(
    record: &RawRecord,
    field: QuestionField,
    default: bool,
    errors: &mut Vec<String>,
) -> bool {
    match record.get(field) {
        None => default,
        Some(raw) => parse_bool(raw).unwrap_or_else(|| {
            errors.push(format!(
                "{} value '{raw}' is not a yes/no answer",
                field.template_header()
            ));
            default
        }),
    }
}

pub(crate) fn validate_row(row: &RawRow, mapping: &FieldMapping) -> ParsedQuestion {
    let record = RawRecord::from_row(row, mapping);
    validate_record(row.line_number, &record)
}
