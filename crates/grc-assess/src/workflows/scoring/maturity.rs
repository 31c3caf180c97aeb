use super::bands::{risk_score_bands, RiskLevel};
use super::ScoringError;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::ops::RangeInclusive;

pub const MATURITY_SCALE: RangeInclusive<i32> = 0..=5;
pub const CONTROL_WEIGHT_SCALE: RangeInclusive<i32> = 1..=3;

/// Current and desired maturity of one control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaturityAssessment {
    pub control_id: String,
    pub maturity_level: i32,
    pub target_maturity: i32,
}

/// Control criticality: 1 = low, 3 = high.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub id: String,
    pub weight: i32,
}

/// Risk score of a control together with its band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlRisk {
    pub control_id: String,
    pub maturity_level: i32,
    pub target_maturity: i32,
    pub weight: i32,
    pub gap: i32,
    pub score: i32,
    pub level: RiskLevel,
    pub label: &'static str,
    pub color: &'static str,
    pub action: &'static str,
}

/// `(target_maturity - maturity_level) * weight`. Out-of-scale inputs are
/// rejected rather than clamped.
pub fn risk_score(assessment: &MaturityAssessment, control: &Control) -> Result<i32, ScoringError> {
    if assessment.control_id != control.id {
        return Err(ScoringError::ControlMismatch {
            assessment: assessment.control_id.clone(),
            control: control.id.clone(),
        });
    }
    check_maturity("maturity_level", assessment.maturity_level)?;
    check_maturity("target_maturity", assessment.target_maturity)?;
    if !CONTROL_WEIGHT_SCALE.contains(&control.weight) {
        return Err(ScoringError::ControlWeightOutOfRange {
            control_id: control.id.clone(),
            weight: control.weight,
        });
    }

    Ok((assessment.target_maturity - assessment.maturity_level) * control.weight)
}

fn check_maturity(field: &'static str, value: i32) -> Result<(), ScoringError> {
    if MATURITY_SCALE.contains(&value) {
        Ok(())
    } else {
        Err(ScoringError::MaturityOutOfRange { field, value })
    }
}

pub fn classify_control(
    assessment: &MaturityAssessment,
    control: &Control,
) -> Result<ControlRisk, ScoringError> {
    let score = risk_score(assessment, control)?;
    let band = risk_score_bands().classify(score)?;

    Ok(ControlRisk {
        control_id: control.id.clone(),
        maturity_level: assessment.maturity_level,
        target_maturity: assessment.target_maturity,
        weight: control.weight,
        gap: assessment.target_maturity - assessment.maturity_level,
        score,
        level: band.level,
        label: band.label,
        color: band.color,
        action: band.action,
    })
}

/// Classifies every control and orders by descending score, then by higher
/// weight, then by input order.
pub fn prioritize_controls(
    controls: &[(MaturityAssessment, Control)],
) -> Result<Vec<ControlRisk>, ScoringError> {
    let mut ranked = controls
        .iter()
        .map(|(assessment, control)| classify_control(assessment, control))
        .collect::<Result<Vec<_>, _>>()?;

    ranked.sort_by_key(|risk| (Reverse(risk.score), Reverse(risk.weight)));
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(id: &str, level: i32, target: i32, weight: i32) -> (MaturityAssessment, Control) {
        (
            MaturityAssessment {
                control_id: id.to_string(),
                maturity_level: level,
                target_maturity: target,
            },
            Control {
                id: id.to_string(),
                weight,
            },
        )
    }

    #[test]
    fn gap_times_weight_lands_in_high_band() {
        let (assessment, control) = pair("AC-01", 1, 4, 3);
        let risk = classify_control(&assessment, &control).expect("scores");

        assert_eq!(risk.score, 9);
        assert_eq!(risk.gap, 3);
        assert_eq!(risk.level, RiskLevel::High);
        assert_eq!(risk.label, "High");
    }

    #[test]
    fn doubling_weight_doubles_score() {
        let (assessment, low) = pair("AC-02", 2, 4, 1);
        let (_, medium) = pair("AC-02", 2, 4, 2);
        assert_eq!(risk_score(&assessment, &low).expect("scores"), 2);
        assert_eq!(risk_score(&assessment, &medium).expect("scores"), 4);
    }

    #[test]
    fn met_or_exceeded_targets_classify_lowest() {
        for (level, target) in [(3, 3), (5, 2)] {
            let (assessment, control) = pair("AC-03", level, target, 3);
            let risk = classify_control(&assessment, &control).expect("scores");
            assert!(risk.score <= 0);
            assert_eq!(risk.level, RiskLevel::Low);
        }
    }

    #[test]
    fn rejects_out_of_scale_inputs() {
        let (assessment, control) = pair("AC-04", 6, 4, 2);
        assert!(matches!(
            risk_score(&assessment, &control),
            Err(ScoringError::MaturityOutOfRange {
                field: "maturity_level",
                value: 6
            })
        ));

        let (assessment, control) = pair("AC-04", 1, -1, 2);
        assert!(matches!(
            risk_score(&assessment, &control),
            Err(ScoringError::MaturityOutOfRange {
                field: "target_maturity",
                ..
            })
        ));

        let (assessment, control) = pair("AC-04", 1, 4, 4);
        assert!(matches!(
            risk_score(&assessment, &control),
            Err(ScoringError::ControlWeightOutOfRange { weight: 4, .. })
        ));
    }

    #[test]
    fn rejects_mismatched_control() {
        let (assessment, _) = pair("AC-05", 1, 4, 2);
        let (_, control) = pair("AC-06", 1, 4, 2);
        assert!(matches!(
            risk_score(&assessment, &control),
            Err(ScoringError::ControlMismatch { .. })
        ));
    }

    #[test]
    fn prioritization_prefers_score_then_weight() {
        let ranked = prioritize_controls(&[
            pair("low", 4, 5, 1),
            pair("gap-two-weight-three", 3, 5, 3),
            pair("gap-three-weight-two", 2, 5, 2),
            pair("critical", 0, 5, 3),
        ])
        .expect("ranks");

        let order: Vec<_> = ranked.iter().map(|risk| risk.control_id.as_str()).collect();
        assert_eq!(
            order,
            vec!["critical", "gap-two-weight-three", "gap-three-weight-two", "low"]
        );
        assert_eq!(ranked[0].level, RiskLevel::Critical);
    }
}
