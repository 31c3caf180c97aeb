use super::ImportError;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Internal vocabulary every recognized column is normalized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionField {
    Label,
    Type,
    Weight,
    Required,
    IsKo,
    KoValue,
    Options,
}

impl QuestionField {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Label,
            Self::Type,
            Self::Weight,
            Self::Required,
            Self::IsKo,
            Self::KoValue,
            Self::Options,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Type => "type",
            Self::Weight => "weight",
            Self::Required => "required",
            Self::IsKo => "is_ko",
            Self::KoValue => "ko_value",
            Self::Options => "options",
        }
    }

    /// Column name written by the template generator.
    pub const fn template_header(self) -> &'static str {
        match self {
            Self::Label => "pergunta",
            Self::Type => "tipo",
            Self::Weight => "peso",
            Self::Required => "obrigatoria",
            Self::IsKo => "ko",
            Self::KoValue => "valor_ko",
            Self::Options => "opcoes",
        }
    }
}

static HEADER_SYNONYMS: OnceLock<HashMap<String, QuestionField>> = OnceLock::new();

fn header_synonyms() -> &'static HashMap<String, QuestionField> {
    HEADER_SYNONYMS.get_or_init(|| {
        const SYNONYMS: &[(&str, QuestionField)] = &[
            // Question text
            ("pergunta", QuestionField::Label),
            ("perguntas", QuestionField::Label),
            ("questão", QuestionField::Label),
            ("questao", QuestionField::Label),
            ("enunciado", QuestionField::Label),
            ("descrição", QuestionField::Label),
            ("descricao", QuestionField::Label),
            ("question", QuestionField::Label),
            ("label", QuestionField::Label),
            // Answer type
            ("tipo", QuestionField::Type),
            ("tipo_resposta", QuestionField::Type),
            ("tipo de resposta", QuestionField::Type),
            ("type", QuestionField::Type),
            ("question_type", QuestionField::Type),
            // Weight
            ("peso", QuestionField::Weight),
            ("pontuação máxima", QuestionField::Weight),
            ("pontuacao maxima", QuestionField::Weight),
            ("weight", QuestionField::Weight),
            // Required flag
            ("obrigatória", QuestionField::Required),
            ("obrigatoria", QuestionField::Required),
            ("obrigatório", QuestionField::Required),
            ("obrigatorio", QuestionField::Required),
            ("required", QuestionField::Required),
            ("is_required", QuestionField::Required),
            // Knockout flag
            ("ko", QuestionField::IsKo),
            ("is_ko", QuestionField::IsKo),
            ("eliminatória", QuestionField::IsKo),
            ("eliminatoria", QuestionField::IsKo),
            ("knockout", QuestionField::IsKo),
            // Knockout answer
            ("valor_ko", QuestionField::KoValue),
            ("valor ko", QuestionField::KoValue),
            ("resposta_ko", QuestionField::KoValue),
            ("resposta eliminatória", QuestionField::KoValue),
            ("ko_value", QuestionField::KoValue),
            ("ko value", QuestionField::KoValue),
            // Options
            ("opções", QuestionField::Options),
            ("opcoes", QuestionField::Options),
            ("alternativas", QuestionField::Options),
            ("options", QuestionField::Options),
            ("choices", QuestionField::Options),
        ];

        let mut map = HashMap::with_capacity(SYNONYMS.len());
        for (header, field) in SYNONYMS {
            map.insert(clean_header(header), *field);
        }
        map
    })
}

/// Lower-cases and drops everything outside `[a-z0-9à-ú_]`, spaces included.
pub(crate) fn clean_header(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|ch| {
            ch.is_ascii_lowercase()
                || ch.is_ascii_digit()
                || ('\u{e0}'..='\u{fa}').contains(ch)
                || *ch == '_'
        })
        .collect()
}

pub fn canonical_field(header: &str) -> Option<QuestionField> {
    header_synonyms().get(&clean_header(header)).copied()
}

/// Column index → canonical field, built once per import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    columns: Vec<(usize, QuestionField)>,
}

impl FieldMapping {
    /// Fails only when no column carries the question text.
    pub fn from_header(header: &[String]) -> Result<Self, ImportError> {
        let mut columns: Vec<(usize, QuestionField)> = Vec::new();

        for (index, cell) in header.iter().enumerate() {
            match canonical_field(cell) {
                Some(field) if columns.iter().any(|(_, mapped)| *mapped == field) => {
                    tracing::debug!(column = index, header = %cell, field = field.as_str(), "duplicate column ignored");
                }
                Some(field) => columns.push((index, field)),
                None => {
                    tracing::debug!(column = index, header = %cell, "unrecognized column ignored");
                }
            }
        }

        if !columns
            .iter()
            .any(|(_, field)| *field == QuestionField::Label)
        {
            return Err(ImportError::MissingRequiredColumn {
                column: QuestionField::Label.template_header(),
            });
        }

        Ok(Self { columns })
    }

    pub fn column_of(&self, field: QuestionField) -> Option<usize> {
        self.columns
            .iter()
            .find(|(_, mapped)| *mapped == field)
            .map(|(index, _)| *index)
    }

    pub fn fields(&self) -> impl Iterator<Item = QuestionField> + '_ {
        self.columns.iter().map(|(_, field)| *field)
    }
}
