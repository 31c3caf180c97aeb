//! Pure scoring and classification: maturity-gap risk, qualification
//! campaign percentage with knockout rules, and the static band tables.

pub mod bands;
pub mod maturity;
pub mod qualification;

pub use bands::{
    risk_matrix_bands, risk_score_bands, BandTable, BandTableError, ClassificationBand,
    MatrixLevel, OutOfDomain, RiskLevel,
};
pub use maturity::{
    classify_control, prioritize_controls, risk_score, Control, ControlRisk, MaturityAssessment,
};
pub use qualification::{
    score_campaign, CampaignEvaluator, CampaignOutcome, CampaignScore, CampaignVerdict,
    QualificationQuestion, QualificationResponse,
};

use serde::Serialize;
use std::ops::RangeInclusive;

pub const MATRIX_AXIS_SCALE: RangeInclusive<i32> = 1..=5;

/// Domain errors; scoring never clamps invalid input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("{field} {value} is outside the maturity scale 0-5")]
    MaturityOutOfRange { field: &'static str, value: i32 },
    #[error("control {control_id} has weight {weight}; expected 1, 2 or 3")]
    ControlWeightOutOfRange { control_id: String, weight: i32 },
    #[error("assessment for control {assessment} paired with control {control}")]
    ControlMismatch { assessment: String, control: String },
    #[error("{axis} {value} is outside the risk matrix scale 1-5")]
    MatrixAxisOutOfRange { axis: &'static str, value: i32 },
    #[error("question {question_id} has invalid weight {weight}")]
    InvalidQuestionWeight { question_id: String, weight: f64 },
    #[error("question {question_id} awarded {awarded} points but is worth {weight}")]
    AwardedPointsOutOfRange {
        question_id: String,
        awarded: f64,
        weight: f64,
    },
    #[error("response references unknown question {question_id}")]
    UnknownQuestion { question_id: String },
    #[error("question {question_id} has more than one response")]
    DuplicateResponse { question_id: String },
    #[error(transparent)]
    Classification(#[from] OutOfDomain),
}

/// Classified cell of the 5x5 probability × impact matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixRisk {
    pub probability: i32,
    pub impact: i32,
    pub score: i32,
    pub level: MatrixLevel,
    pub label: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

pub fn risk_matrix_level(probability: i32, impact: i32) -> Result<MatrixRisk, ScoringError> {
    for (axis, value) in [("probability", probability), ("impact", impact)] {
        if !MATRIX_AXIS_SCALE.contains(&value) {
            return Err(ScoringError::MatrixAxisOutOfRange { axis, value });
        }
    }

    let score = probability * impact;
    let band = risk_matrix_bands().classify(score)?;

    Ok(MatrixRisk {
        probability,
        impact,
        score,
        level: band.level,
        label: band.label,
        color: band.color,
        description: band.action,
    })
}
