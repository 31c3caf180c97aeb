use serde::Serialize;
use std::sync::OnceLock;

/// Labeled interval of an integer score; `max: None` is open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationBand<L> {
    pub level: L,
    pub min: i32,
    pub max: Option<i32>,
    pub label: &'static str,
    pub color: &'static str,
    pub action: &'static str,
}

impl<L> ClassificationBand<L> {
    pub fn contains(&self, score: i32) -> bool {
        score >= self.min && self.max.map_or(true, |max| score <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BandTableError {
    #[error("band table has no bands")]
    Empty,
    #[error("first band starts at {first_min}, above the domain minimum {domain_min}")]
    UncoveredMinimum { domain_min: i32, first_min: i32 },
    #[error("band '{label}' does not start right after the previous band (expected {expected}, found {found})")]
    NotContiguous {
        label: &'static str,
        expected: i32,
        found: i32,
    },
    #[error("band '{label}' has max {max} below its min {min}")]
    Inverted {
        label: &'static str,
        min: i32,
        max: i32,
    },
    #[error("only the last band may be open-ended (band '{label}')")]
    OpenBeforeLast { label: &'static str },
    #[error("last band '{label}' must be open-ended")]
    BoundedLast { label: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("score {score} is below the classification domain (minimum {domain_min})")]
pub struct OutOfDomain {
    pub score: i32,
    pub domain_min: i32,
}

/// Ordered, contiguous, exhaustive set of bands over `[domain_min, +inf)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandTable<L> {
    domain_min: i32,
    bands: Vec<ClassificationBand<L>>,
}

impl<L> BandTable<L> {
    pub fn new(domain_min: i32, bands: Vec<ClassificationBand<L>>) -> Result<Self, BandTableError> {
        let first = bands.first().ok_or(BandTableError::Empty)?;
        if first.min > domain_min {
            return Err(BandTableError::UncoveredMinimum {
                domain_min,
                first_min: first.min,
            });
        }

        let last_index = bands.len() - 1;
        let mut expected_min = first.min;
        for (index, band) in bands.iter().enumerate() {
            if band.min != expected_min {
                return Err(BandTableError::NotContiguous {
                    label: band.label,
                    expected: expected_min,
                    found: band.min,
                });
            }

            match band.max {
                Some(_) if index == last_index => {
                    return Err(BandTableError::BoundedLast { label: band.label });
                }
                Some(max) if max < band.min => {
                    return Err(BandTableError::Inverted {
                        label: band.label,
                        min: band.min,
                        max,
                    });
                }
                Some(max) => expected_min = max + 1,
                None if index != last_index => {
                    return Err(BandTableError::OpenBeforeLast { label: band.label });
                }
                None => {}
            }
        }

        Ok(Self { domain_min, bands })
    }

    pub fn domain_min(&self) -> i32 {
        self.domain_min
    }

    pub fn bands(&self) -> &[ClassificationBand<L>] {
        &self.bands
    }

    /// Linear scan; tables hold a handful of bands.
    pub fn classify(&self, score: i32) -> Result<&ClassificationBand<L>, OutOfDomain> {
        let out_of_domain = OutOfDomain {
            score,
            domain_min: self.domain_min,
        };
        if score < self.domain_min {
            return Err(out_of_domain);
        }
        self.bands
            .iter()
            .find(|band| band.contains(score))
            .ok_or(out_of_domain)
    }
}

/// Severity of a maturity-gap risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Level of a 5x5 probability × impact product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatrixLevel {
    VeryLow,
    Low,
    Medium,
    High,
    Critical,
}

/// Smallest possible gap score: target 0, current 5, weight 3.
pub const RISK_SCORE_DOMAIN_MIN: i32 = -15;
pub const RISK_MATRIX_DOMAIN_MIN: i32 = 1;

static RISK_SCORE_BANDS: OnceLock<BandTable<RiskLevel>> = OnceLock::new();
static RISK_MATRIX_BANDS: OnceLock<BandTable<MatrixLevel>> = OnceLock::new();

pub fn risk_score_bands() -> &'static BandTable<RiskLevel> {
    RISK_SCORE_BANDS.get_or_init(|| {
        BandTable::new(
            RISK_SCORE_DOMAIN_MIN,
            vec![
                ClassificationBand {
                    level: RiskLevel::Low,
                    min: RISK_SCORE_DOMAIN_MIN,
                    max: Some(2),
                    label: "Low",
                    color: "#16a34a",
                    action: "Maintain current controls and review at the next assessment cycle",
                },
                ClassificationBand {
                    level: RiskLevel::Medium,
                    min: 3,
                    max: Some(5),
                    label: "Medium",
                    color: "#ca8a04",
                    action: "Plan improvement actions within the next two quarters",
                },
                ClassificationBand {
                    level: RiskLevel::High,
                    min: 6,
                    max: Some(9),
                    label: "High",
                    color: "#ea580c",
                    action: "Open an action plan with an owner and a deadline within 90 days",
                },
                ClassificationBand {
                    level: RiskLevel::Critical,
                    min: 10,
                    max: None,
                    label: "Critical",
                    color: "#dc2626",
                    action: "Escalate to leadership and remediate immediately",
                },
            ],
        )
        .expect("risk score bands are contiguous")
    })
}

pub fn risk_matrix_bands() -> &'static BandTable<MatrixLevel> {
    RISK_MATRIX_BANDS.get_or_init(|| {
        BandTable::new(
            RISK_MATRIX_DOMAIN_MIN,
            vec![
                ClassificationBand {
                    level: MatrixLevel::VeryLow,
                    min: 1,
                    max: Some(3),
                    label: "Muito Baixo",
                    color: "#15803d",
                    action: "Risco aceitável, monitoramento de rotina",
                },
                ClassificationBand {
                    level: MatrixLevel::Low,
                    min: 4,
                    max: Some(6),
                    label: "Baixo",
                    color: "#65a30d",
                    action: "Risco tolerável, revisar periodicamente",
                },
                ClassificationBand {
                    level: MatrixLevel::Medium,
                    min: 7,
                    max: Some(12),
                    label: "Médio",
                    color: "#ca8a04",
                    action: "Requer plano de tratamento e acompanhamento",
                },
                ClassificationBand {
                    level: MatrixLevel::High,
                    min: 13,
                    max: Some(19),
                    label: "Alto",
                    color: "#ea580c",
                    action: "Tratamento prioritário com prazo definido",
                },
                ClassificationBand {
                    level: MatrixLevel::Critical,
                    min: 20,
                    max: None,
                    label: "Crítico",
                    color: "#dc2626",
                    action: "Ação imediata e comunicação à alta direção",
                },
            ],
        )
        .expect("risk matrix bands are contiguous")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(min: i32, max: Option<i32>, label: &'static str) -> ClassificationBand<u8> {
        ClassificationBand {
            level: 0,
            min,
            max,
            label,
            color: "#000000",
            action: "",
        }
    }

    #[test]
    fn static_tables_pass_configuration_checks() {
        let risk = risk_score_bands();
        BandTable::new(risk.domain_min(), risk.bands().to_vec()).expect("risk table valid");

        let matrix = risk_matrix_bands();
        BandTable::new(matrix.domain_min(), matrix.bands().to_vec()).expect("matrix table valid");
    }

    #[test]
    fn risk_bands_cover_the_whole_score_range() {
        let table = risk_score_bands();
        for score in RISK_SCORE_DOMAIN_MIN..=15 {
            assert!(table.classify(score).is_ok(), "score {score} unclassified");
        }
        assert_eq!(table.classify(-3).expect("classified").level, RiskLevel::Low);
        assert_eq!(table.classify(9).expect("classified").level, RiskLevel::High);
        assert_eq!(table.classify(15).expect("classified").label, "Critical");
        assert!(table.classify(-16).is_err());
    }

    #[test]
    fn matrix_bands_cover_one_to_twenty_five() {
        let table = risk_matrix_bands();
        assert_eq!(table.classify(1).expect("classified").label, "Muito Baixo");
        assert_eq!(table.classify(12).expect("classified").label, "Médio");
        assert_eq!(table.classify(25).expect("classified").label, "Crítico");
        assert!(table.classify(0).is_err());
    }

    #[test]
    fn rejects_gaps_overlaps_and_bounded_tails() {
        assert_eq!(
            BandTable::<u8>::new(0, Vec::new()),
            Err(BandTableError::Empty)
        );
        assert!(matches!(
            BandTable::new(0, vec![band(0, Some(4), "a"), band(6, None, "b")]),
            Err(BandTableError::NotContiguous { label: "b", .. })
        ));
        assert!(matches!(
            BandTable::new(0, vec![band(0, Some(4), "a"), band(3, None, "b")]),
            Err(BandTableError::NotContiguous { .. })
        ));
        assert!(matches!(
            BandTable::new(0, vec![band(0, Some(4), "a"), band(5, Some(9), "b")]),
            Err(BandTableError::BoundedLast { label: "b" })
        ));
        assert!(matches!(
            BandTable::new(0, vec![band(1, None, "a")]),
            Err(BandTableError::UncoveredMinimum { .. })
        ));
        assert!(matches!(
            BandTable::new(0, vec![band(0, None, "a"), band(1, None, "b")]),
            Err(BandTableError::OpenBeforeLast { label: "a" })
        ));
    }
}
