use super::ScoringError;
use crate::config::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Scoring view of a question in a qualification campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationQuestion {
    pub id: String,
    pub weight: f64,
    #[serde(default)]
    pub is_ko: bool,
    #[serde(default)]
    pub ko_value: Option<String>,
}

impl QualificationQuestion {
    /// True when `answer` is this question's knockout answer.
    ///
    /// The match is wider than byte equality: both sides are
    /// trimmed and compared case-insensitively, so `" não "` triggers a
    /// `ko_value` of `"Não"`. Any other difference, including accents,
    /// does not match.
    pub fn is_knocked_out_by(&self, answer: &str) -> bool {
        if !self.is_ko {
            return false;
        }
        match self.ko_value.as_deref().map(str::trim) {
            Some(ko_value) if !ko_value.is_empty() => {
                answer.trim().to_lowercase() == ko_value.to_lowercase()
            }
            _ => false,
        }
    }
}

/// Vendor answer to one question, with points already awarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationResponse {
    pub question_id: String,
    pub answer: String,
    pub score_awarded: f64,
}

/// Aggregate result of a campaign; recomputing from the same responses
/// yields the same value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignScore {
    /// Whole percentage points, rounded half up.
    pub score: u8,
    pub ko_triggered: bool,
    /// Ids of the KO questions answered with their knockout value, in question order.
    pub ko_questions: Vec<String>,
    pub awarded_points: f64,
    pub possible_points: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignVerdict {
    Qualified,
    NotQualified,
    /// At least one knockout question failed; the percentage is irrelevant.
    Disqualified,
}

impl CampaignVerdict {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Qualified => "Qualificado",
            Self::NotQualified => "Não qualificado",
            Self::Disqualified => "Desclassificado (KO)",
        }
    }
}

impl CampaignScore {
    pub fn verdict(&self, pass_threshold: u8) -> CampaignVerdict {
        if self.ko_triggered {
            CampaignVerdict::Disqualified
        } else if self.score >= pass_threshold {
            CampaignVerdict::Qualified
        } else {
            CampaignVerdict::NotQualified
        }
    }

    pub fn is_compliant(&self, pass_threshold: u8) -> bool {
        self.verdict(pass_threshold) == CampaignVerdict::Qualified
    }
}

/// `Σ score_awarded / Σ weight × 100` over every campaign question, with the
/// knockout rule evaluated independently of the percentage. Unanswered
/// questions earn zero points.
pub fn score_campaign(
    questions: &[QualificationQuestion],
    responses: &[QualificationResponse],
) -> Result<CampaignScore, ScoringError> {
    let mut by_question: HashMap<&str, &QualificationResponse> =
        HashMap::with_capacity(responses.len());
    for response in responses {
        if !questions
            .iter()
            .any(|question| question.id == response.question_id)
        {
            return Err(ScoringError::UnknownQuestion {
                question_id: response.question_id.clone(),
            });
        }
        if by_question
            .insert(response.question_id.as_str(), response)
            .is_some()
        {
            return Err(ScoringError::DuplicateResponse {
                question_id: response.question_id.clone(),
            });
        }
    }

    let mut awarded_points = 0.0;
    let mut possible_points = 0.0;
    let mut ko_questions = Vec::new();

    for question in questions {
        if !question.weight.is_finite() || question.weight < 0.0 {
            return Err(ScoringError::InvalidQuestionWeight {
                question_id: question.id.clone(),
                weight: question.weight,
            });
        }
        possible_points += question.weight;

        let Some(response) = by_question.get(question.id.as_str()) else {
            continue;
        };

        let awarded = response.score_awarded;
        if !awarded.is_finite() || awarded < 0.0 || awarded > question.weight {
            return Err(ScoringError::AwardedPointsOutOfRange {
                question_id: question.id.clone(),
                awarded,
                weight: question.weight,
            });
        }
        awarded_points += awarded;

        if question.is_knocked_out_by(&response.answer) {
            ko_questions.push(question.id.clone());
        }
    }

    Ok(CampaignScore {
        score: percentage(awarded_points, possible_points),
        ko_triggered: !ko_questions.is_empty(),
        ko_questions,
        awarded_points,
        possible_points,
    })
}

fn percentage(awarded: f64, possible: f64) -> u8 {
    if possible <= 0.0 {
        return 0;
    }
    // Scale before dividing so exact halves such as 14.5 stay exact.
    let rounded = (awarded * 100.0 / possible + 0.5).floor();
    rounded.clamp(0.0, 100.0) as u8
}

/// Campaign scoring bound to the configured pass threshold.
#[derive(Debug, Clone)]
pub struct CampaignEvaluator {
    pass_threshold: u8,
}

/// Score plus verdict, as shown to reviewers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignOutcome {
    #[serde(flatten)]
    pub score: CampaignScore,
    pub pass_threshold: u8,
    pub verdict: CampaignVerdict,
    pub verdict_label: &'static str,
    pub compliant: bool,
}

impl CampaignEvaluator {
    pub fn new(pass_threshold: u8) -> Self {
        Self {
            pass_threshold: pass_threshold.min(100),
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.pass_threshold)
    }

    pub fn pass_threshold(&self) -> u8 {
        self.pass_threshold
    }

    pub fn evaluate(
        &self,
        questions: &[QualificationQuestion],
        responses: &[QualificationResponse],
    ) -> Result<CampaignOutcome, ScoringError> {
        let score = score_campaign(questions, responses)?;
        let verdict = score.verdict(self.pass_threshold);

        Ok(CampaignOutcome {
            pass_threshold: self.pass_threshold,
            verdict,
            verdict_label: verdict.label(),
            compliant: verdict == CampaignVerdict::Qualified,
            score,
        })
    }
}

impl Default for CampaignEvaluator {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}
