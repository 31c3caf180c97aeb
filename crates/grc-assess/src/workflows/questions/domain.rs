use serde::{Deserialize, Serialize};
use std::fmt;

/// Answer format of a qualification question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Text,
    MultipleChoice,
    Number,
    Date,
    Currency,
    Upload,
}

impl QuestionType {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Text,
            Self::MultipleChoice,
            Self::Number,
            Self::Date,
            Self::Currency,
            Self::Upload,
        ]
    }

    /// Canonical token accepted in the `tipo` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::MultipleChoice => "multiple_choice",
            Self::Number => "number",
            Self::Date => "date",
            Self::Currency => "currency",
            Self::Upload => "upload",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "Texto",
            Self::MultipleChoice => "Múltipla escolha",
            Self::Number => "Número",
            Self::Date => "Data",
            Self::Currency => "Moeda",
            Self::Upload => "Upload",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selectable answer of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub value: String,
    pub label: String,
    pub score: u32,
}

/// Validated candidate produced for one data row of an import file.
///
/// Invalid rows are kept so a review table can show every problem next to the
/// line it came from; `is_valid` is always `errors.is_empty()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedQuestion {
    pub row_number: usize,
    pub label: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub weight: u8,
    pub is_required: bool,
    pub is_ko: bool,
    pub ko_value: Option<String>,
    pub options: Vec<QuestionOption>,
    pub errors: Vec<String>,
    pub is_valid: bool,
}

/// Outcome of one import attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportResult {
    pub questions: Vec<ParsedQuestion>,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub total_count: usize,
}

impl ImportResult {
    pub fn from_questions(questions: Vec<ParsedQuestion>) -> Self {
        let valid_count = questions.iter().filter(|question| question.is_valid).count();
        let total_count = questions.len();

        Self {
            questions,
            valid_count,
            invalid_count: total_count - valid_count,
            total_count,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.invalid_count == 0
    }

    pub fn valid_questions(&self) -> impl Iterator<Item = &ParsedQuestion> {
        self.questions.iter().filter(|question| question.is_valid)
    }
}
