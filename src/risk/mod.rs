//! Landslide risk scoring.
//!
//! Two formulas coexist and are kept apart on purpose: the weighted-factor
//! model feeds the dashboard composite, the additive-points model feeds the
//! technical report and the simulator. Both sit behind [`RiskModel`].

mod composite;
mod points;
mod weighted;

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{catalog::Catalog, synth::GeologicalSnapshot};

pub use composite::{collapse_risk, CompositeRisk};
pub use points::PointsModel;
pub use weighted::{FactorWeights, WeightedFactorModel};

pub trait RiskModel {
    fn kind(&self) -> ModelKind;
    fn assess(&self, catalog: &Catalog, snapshot: &GeologicalSnapshot) -> RiskAssessment;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    WeightedFactor,
    AdditivePoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Slope,
    Precipitation,
    Soil,
    Elevation,
    GeologicalFormation,
}

/// Ordinal risk labels. `VeryHigh` only comes out of the weighted and
/// composite scales, `Critical` only out of the points scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
    Critical,
}

impl Tier {
    pub const ALL: [Tier; 6] = [
        Tier::VeryLow,
        Tier::Low,
        Tier::Medium,
        Tier::High,
        Tier::VeryHigh,
        Tier::Critical,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tier::VeryLow => "Muy Bajo",
            Tier::Low => "Bajo",
            Tier::Medium => "Medio",
            Tier::High => "Alto",
            Tier::VeryHigh => "Muy Alto",
            Tier::Critical => "Crítico",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Threshold sets for turning a 0-100 score into a [`Tier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierScale {
    /// 20 / 40 / 60 / 80, five tiers up to "Muy Alto".
    Weighted,
    /// 30 / 60 / 80, four tiers up to "Crítico".
    Points,
    /// 30 / 50 / 70 (inclusive), four tiers up to "Muy Alto".
    Composite,
}

impl TierScale {
    pub fn classify(&self, score: f64) -> Tier {
        match self {
            TierScale::Weighted => {
                if score < 20.0 {
                    Tier::VeryLow
                } else if score < 40.0 {
                    Tier::Low
                } else if score < 60.0 {
                    Tier::Medium
                } else if score < 80.0 {
                    Tier::High
                } else {
                    Tier::VeryHigh
                }
            }
            TierScale::Points => {
                if score < 30.0 {
                    Tier::Low
                } else if score < 60.0 {
                    Tier::Medium
                } else if score < 80.0 {
                    Tier::High
                } else {
                    Tier::Critical
                }
            }
            TierScale::Composite => {
                if score >= 70.0 {
                    Tier::VeryHigh
                } else if score >= 50.0 {
                    Tier::High
                } else if score >= 30.0 {
                    Tier::Medium
                } else {
                    Tier::Low
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub model: ModelKind,
    /// Clamped to 0..=100.
    pub score: u8,
    pub tier: Tier,
    /// Per-factor contribution: a 0-100 percentage for the weighted model,
    /// raw points for the points model.
    pub factors: BTreeMap<Factor, f64>,
    /// Human-readable notes on the bands that drove the score.
    #[serde(default)]
    pub findings: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub recommendations: Vec<String>,
}

impl RiskAssessment {
    pub fn factor(&self, factor: Factor) -> f64 {
        self.factors.get(&factor).copied().unwrap_or(0.0)
    }
}

pub(crate) fn clamp_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}
