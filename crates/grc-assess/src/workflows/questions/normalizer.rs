use super::domain::{QuestionOption, QuestionType};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

const SLUG_MAX_CHARS: usize = 30;

static TYPE_SYNONYMS: OnceLock<HashMap<String, QuestionType>> = OnceLock::new();

pub(crate) fn normalize_token(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// `sim/não/yes/no/true/false/1/0/s/n`; `None` for anything else.
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match normalize_token(value).as_str() {
        "sim" | "s" | "yes" | "y" | "true" | "verdadeiro" | "1" | "x" => Some(true),
        "não" | "nao" | "n" | "no" | "false" | "falso" | "0" => Some(false),
        _ => None,
    }
}

pub(crate) fn parse_question_type(value: &str) -> Option<QuestionType> {
    let token = normalize_token(value);
    type_synonyms().get(&token).copied().or_else(|| {
        QuestionType::ordered()
            .into_iter()
            .find(|candidate| candidate.as_str() == token)
    })
}

fn type_synonyms() -> &'static HashMap<String, QuestionType> {
    TYPE_SYNONYMS.get_or_init(|| {
        const SYNONYMS: &[(&str, QuestionType)] = &[
            ("texto", QuestionType::Text),
            ("texto livre", QuestionType::Text),
            ("dissertativa", QuestionType::Text),
            ("free text", QuestionType::Text),
            ("múltipla escolha", QuestionType::MultipleChoice),
            ("multipla escolha", QuestionType::MultipleChoice),
            ("múltipla_escolha", QuestionType::MultipleChoice),
            ("multipla_escolha", QuestionType::MultipleChoice),
            ("escolha", QuestionType::MultipleChoice),
            ("seleção", QuestionType::MultipleChoice),
            ("selecao", QuestionType::MultipleChoice),
            ("multiple choice", QuestionType::MultipleChoice),
            ("número", QuestionType::Number),
            ("numero", QuestionType::Number),
            ("numérico", QuestionType::Number),
            ("numerico", QuestionType::Number),
            ("data", QuestionType::Date),
            ("moeda", QuestionType::Currency),
            ("valor", QuestionType::Currency),
            ("monetário", QuestionType::Currency),
            ("monetario", QuestionType::Currency),
            ("arquivo", QuestionType::Upload),
            ("anexo", QuestionType::Upload),
            ("documento", QuestionType::Upload),
            ("file", QuestionType::Upload),
        ];

        let mut map = HashMap::with_capacity(SYNONYMS.len());
        for (token, question_type) in SYNONYMS {
            map.insert(normalize_token(token), *question_type);
        }
        map
    })
}

fn option_segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^(.+?)\(([0-9]+)\)$").expect("option segment regex"))
}

/// Parses `Label(score);Label(score);...`. A segment without a trailing
/// `(score)` still becomes an option worth zero points. A score that does
/// not fit in `u32` keeps its label, scores zero and is reported in `errors`.
pub(crate) fn parse_options(value: &str, errors: &mut Vec<String>) -> Vec<QuestionOption> {
    value
        .split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .enumerate()
        .map(|(index, segment)| {
            let (label, score) = match option_segment_regex().captures(segment) {
                Some(captures) => {
                    let label = captures[1].trim().to_string();
                    let digits = &captures[2];
                    let score = digits.parse::<u32>().unwrap_or_else(|_| {
                        errors.push(format!(
                            "option '{label}' score {digits} is out of range (max {})",
                            u32::MAX
                        ));
                        0
                    });
                    (label, score)
                }
                None => (segment.to_string(), 0),
            };
            QuestionOption {
                value: option_slug(&label, index),
                label,
                score,
            }
        })
        .collect()
}

pub(crate) fn option_slug(label: &str, index: usize) -> String {
    let slug: String = label
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(SLUG_MAX_CHARS)
        .collect();

    if slug.is_empty() {
        format!("opt_{}", index + 1)
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_accept_portuguese_and_english_tokens() {
        for token in ["sim", "SIM", "yes", "1", "S", " true "] {
            assert_eq!(parse_bool(token), Some(true), "token {token:?}");
        }
        for token in ["não", "NAO", "no", "0", "n", "False"] {
            assert_eq!(parse_bool(token), Some(false), "token {token:?}");
        }
        assert_eq!(parse_bool("talvez"), None);
    }

    #[test]
    fn question_types_resolve_synonyms_and_canonical_tokens() {
        assert_eq!(
            parse_question_type("Múltipla  Escolha"),
            Some(QuestionType::MultipleChoice)
        );
        assert_eq!(
            parse_question_type("multiple_choice"),
            Some(QuestionType::MultipleChoice)
        );
        assert_eq!(parse_question_type("Moeda"), Some(QuestionType::Currency));
        assert_eq!(parse_question_type("upload"), Some(QuestionType::Upload));
        assert_eq!(parse_question_type("escala"), None);
    }

    fn options(value: &str) -> Vec<QuestionOption> {
        let mut errors = Vec::new();
        let options = parse_options(value, &mut errors);
        assert!(errors.is_empty(), "errors: {errors:?}");
        options
    }

    #[test]
    fn options_parse_scores_and_degrade_without_them() {
        let options = options("Sim(10); Parcial (5) ;Não;");
        let summary: Vec<_> = options
            .iter()
            .map(|option| (option.label.as_str(), option.score))
            .collect();
        assert_eq!(summary, vec![("Sim", 10), ("Parcial", 5), ("Não", 0)]);
        assert_eq!(options[1].value, "parcial");
    }

    #[test]
    fn options_keep_parenthesised_text_inside_labels() {
        let options = options("ISO (27001) certificada(20);(15)");
        assert_eq!(options[0].label, "ISO (27001) certificada");
        assert_eq!(options[0].score, 20);
        assert_eq!(options[1].label, "(15)");
        assert_eq!(options[1].score, 0);
    }

    #[test]
    fn oversized_scores_are_reported_not_dropped() {
        let mut errors = Vec::new();
        let options = parse_options("Sim(5000000000);Não(0)", &mut errors);

        assert_eq!(options[0].label, "Sim");
        assert_eq!(options[0].score, 0);
        assert_eq!(options[1].label, "Não");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("5000000000"), "errors: {errors:?}");
    }

    #[test]
    fn slug_truncates_and_falls_back_to_position() {
        assert_eq!(option_slug("Sim, com ressalvas", 0), "sim,_com_ressalvas");
        assert_eq!(
            option_slug("Uma resposta extremamente longa para caber", 0).chars().count(),
            30
        );
        assert_eq!(option_slug("   ", 2), "opt_3");
    }
}
