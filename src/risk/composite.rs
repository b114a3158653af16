use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Tier, TierScale};
use crate::{rng::Jitter, synth::GeologicalSnapshot};

const LANDSLIDE_SHARE: f64 = 0.6;
const COLLAPSE_SHARE: f64 = 0.4;

/// Collapse risk in percent, unrounded.
pub fn collapse_risk<R: Rng + ?Sized>(snapshot: &GeologicalSnapshot, rng: &mut R) -> f64 {
    let elevation_term = if snapshot.elevation_m > 2300.0 { 15.0 } else { 5.0 };
    let raw = snapshot.slope_deg * 1.2
        + (snapshot.precipitation_mm - 1500.0) / 30.0
        + elevation_term
        + rng.uniform(0.0, 10.0);
    raw.clamp(0.0, 100.0)
}

/// Dashboard blend of the weighted-factor landslide score with collapse risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeRisk {
    pub landslide: u8,
    pub collapse: u8,
    pub overall: u8,
    pub tier: Tier,
}

impl CompositeRisk {
    pub fn blend(landslide: u8, collapse: f64) -> Self {
        let overall = (landslide as f64 * LANDSLIDE_SHARE + collapse * COLLAPSE_SHARE)
            .round()
            .clamp(0.0, 100.0);
        Self {
            landslide,
            collapse: collapse.round().clamp(0.0, 100.0) as u8,
            overall: overall as u8,
            // Classified on the reported percentage.
            tier: TierScale::Composite.classify(overall),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SoilType;
    use rand::rngs::mock::StepRng;

    fn snapshot(slope: f64, elevation: f64, precipitation: f64) -> GeologicalSnapshot {
        GeologicalSnapshot {
            elevation_m: elevation,
            slope_deg: slope,
            precipitation_mm: precipitation,
            soil: SoilType::Entisol,
            geological_formation: "Batolito Antioqueño".into(),
        }
    }

    #[test]
    fn collapse_uses_midpoint_draw() {
        let snap = snapshot(30.0, 2400.0, 2200.0);
        // 36 + 23.33 + 15 + 5
        let collapse = collapse_risk(&snap, &mut StepRng::new(1 << 63, 0));
        assert!((collapse - 79.333_333).abs() < 1e-3);
    }

    #[test]
    fn collapse_is_clamped() {
        let dry = snapshot(0.0, 2000.0, 0.0);
        assert_eq!(collapse_risk(&dry, &mut StepRng::new(0, 0)), 0.0);
        let extreme = snapshot(45.0, 2600.0, 5000.0);
        assert_eq!(collapse_risk(&extreme, &mut StepRng::new(0, 0)), 100.0);
    }

    #[test]
    fn blend_weights_landslide_sixty_forty() {
        let composite = CompositeRisk::blend(53, 79.333_333);
        // 31.8 + 31.73
        assert_eq!(composite.overall, 64);
        assert_eq!(composite.collapse, 79);
        assert_eq!(composite.tier, Tier::High);
    }

    #[test]
    fn tier_matches_rounded_overall() {
        // 39.6 + 30.0 = 69.6, shown as 70.
        let composite = CompositeRisk::blend(66, 75.0);
        assert_eq!(composite.overall, 70);
        assert_eq!(composite.tier, Tier::VeryHigh);

        // 29.4 + 0.2 = 29.6, shown as 30.
        let composite = CompositeRisk::blend(49, 0.5);
        assert_eq!(composite.overall, 30);
        assert_eq!(composite.tier, Tier::Medium);
    }
}
