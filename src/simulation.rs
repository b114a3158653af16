//! What-if simulation on top of the additive-points model.
//!
//! The caller owns a [`Simulator`] (or a bare [`SimulationState`]); nothing
//! here keeps state between calls.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{
    catalog::Catalog,
    risk::{PointsModel, RiskModel, Tier, TierScale},
    synth::GeologicalSnapshot,
};

/// Reference asset value in COP used for the economic impact estimate.
pub const REFERENCE_ASSET_VALUE_COP: f64 = 150_000_000.0;
/// Share of the asset value lost per point of added risk.
pub const IMPACT_PER_POINT: f64 = 0.02;
const STABLE_BAND: f64 = 2.0;

/// User-tunable environmental and social factors, each a 0-100 percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationControls {
    pub soil_saturation: f64,
    pub vegetation_cover: f64,
    pub human_activity: f64,
    pub population_density: f64,
    pub infrastructure_vulnerability: f64,
    pub drainage_quality: f64,
}

impl Default for SimulationControls {
    fn default() -> Self {
        Self {
            soil_saturation: 50.0,
            vegetation_cover: 70.0,
            human_activity: 40.0,
            population_density: 30.0,
            infrastructure_vulnerability: 45.0,
            drainage_quality: 60.0,
        }
    }
}

impl SimulationControls {
    fn clamp(&mut self) {
        for value in [
            &mut self.soil_saturation,
            &mut self.vegetation_cover,
            &mut self.human_activity,
            &mut self.population_density,
            &mut self.infrastructure_vulnerability,
            &mut self.drainage_quality,
        ] {
            *value = value.clamp(0.0, 100.0);
        }
    }

    /// Points added on top of the base score.
    pub fn adjustment(&self) -> f64 {
        self.soil_saturation / 100.0 * 0.3 * 30.0
            + (1.0 - self.vegetation_cover / 100.0) * 0.25 * 25.0
            + self.human_activity / 100.0 * 0.2 * 20.0
            + self.infrastructure_vulnerability / 100.0 * 0.15 * 15.0
            + (1.0 - self.drainage_quality / 100.0) * 0.2 * 20.0
            + self.population_density / 100.0 * 0.1 * 10.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    #[serde(flatten)]
    pub terrain: GeologicalSnapshot,
    #[serde(flatten)]
    pub controls: SimulationControls,
}

impl SimulationState {
    pub fn from_snapshot(snapshot: &GeologicalSnapshot) -> Self {
        Self {
            terrain: snapshot.clone(),
            controls: SimulationControls::default(),
        }
    }

    /// Restores the slope floor and the 0-100 control range.
    pub fn normalize(&mut self) {
        self.terrain.slope_deg = self.terrain.slope_deg.max(0.0);
        self.terrain.precipitation_mm = self.terrain.precipitation_mm.max(0.0);
        self.controls.clamp();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioPreset {
    Drought,
    HeavyRain,
    Deforestation,
    Urbanization,
    Mitigation,
}

impl ScenarioPreset {
    pub const ALL: [ScenarioPreset; 5] = [
        ScenarioPreset::Drought,
        ScenarioPreset::HeavyRain,
        ScenarioPreset::Deforestation,
        ScenarioPreset::Urbanization,
        ScenarioPreset::Mitigation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ScenarioPreset::Drought => "Sequía",
            ScenarioPreset::HeavyRain => "Lluvias intensas",
            ScenarioPreset::Deforestation => "Deforestación",
            ScenarioPreset::Urbanization => "Urbanización",
            ScenarioPreset::Mitigation => "Mejoras de mitigación",
        }
    }

    /// Overwrites the preset's fields; everything else keeps its value.
    /// Precipitation presets scale the original snapshot, not the current
    /// slider.
    pub fn apply(&self, state: &mut SimulationState, original: &GeologicalSnapshot) {
        let c = &mut state.controls;
        match self {
            ScenarioPreset::Drought => {
                state.terrain.precipitation_mm = original.precipitation_mm * 0.6;
                c.soil_saturation = 20.0;
                c.vegetation_cover = 40.0;
                c.human_activity = 60.0;
            }
            ScenarioPreset::HeavyRain => {
                state.terrain.precipitation_mm = original.precipitation_mm * 1.8;
                c.soil_saturation = 90.0;
                c.vegetation_cover = 85.0;
                c.human_activity = 30.0;
            }
            ScenarioPreset::Deforestation => {
                c.vegetation_cover = 20.0;
                c.human_activity = 80.0;
                c.soil_saturation = 70.0;
                c.drainage_quality = 30.0;
            }
            ScenarioPreset::Urbanization => {
                c.human_activity = 85.0;
                c.population_density = 80.0;
                c.infrastructure_vulnerability = 70.0;
                c.drainage_quality = 40.0;
                c.vegetation_cover = 30.0;
            }
            ScenarioPreset::Mitigation => {
                c.drainage_quality = 90.0;
                c.vegetation_cover = 85.0;
                c.infrastructure_vulnerability = 20.0;
                c.human_activity = 25.0;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyClimate {
    pub precipitation_mm: f64,
    pub temperature_c: f64,
    pub risk_multiplier: f64,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Month::January => "Enero",
            Month::February => "Febrero",
            Month::March => "Marzo",
            Month::April => "Abril",
            Month::May => "Mayo",
            Month::June => "Junio",
            Month::July => "Julio",
            Month::August => "Agosto",
            Month::September => "Septiembre",
            Month::October => "Octubre",
            Month::November => "Noviembre",
            Month::December => "Diciembre",
        }
    }

    pub fn climate(&self) -> MonthlyClimate {
        let (precipitation_mm, temperature_c, risk_multiplier) = match self {
            Month::January => (80.0, 22.0, 0.7),
            Month::February => (90.0, 23.0, 0.7),
            Month::March => (120.0, 24.0, 0.8),
            Month::April => (180.0, 23.0, 1.0),
            Month::May => (220.0, 22.0, 1.2),
            Month::June => (160.0, 21.0, 1.0),
            Month::July => (140.0, 21.0, 0.9),
            Month::August => (150.0, 22.0, 0.9),
            Month::September => (190.0, 22.0, 1.1),
            Month::October => (240.0, 22.0, 1.3),
            Month::November => (200.0, 22.0, 1.2),
            Month::December => (120.0, 22.0, 0.8),
        };
        MonthlyClimate {
            precipitation_mm,
            temperature_c,
            risk_multiplier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    /// Points-model score of the untouched snapshot.
    pub original_score: u8,
    /// Points-model score of the simulated terrain, before control
    /// adjustments.
    pub base_score: u8,
    pub simulated_score: f64,
    pub delta: f64,
    pub trend: Trend,
    pub simulated_tier: Tier,
    /// Signed, in COP.
    pub estimated_economic_impact: f64,
}

/// Base score plus control adjustments, scaled by the month's multiplier
/// and clamped to 0-100.
pub fn adjusted_score(catalog: &Catalog, state: &SimulationState, month: Option<Month>) -> f64 {
    let base = PointsModel.assess(catalog, &state.terrain).score as f64;
    let mut adjusted = base + state.controls.adjustment();
    if let Some(month) = month {
        adjusted *= month.climate().risk_multiplier;
    }
    adjusted.clamp(0.0, 100.0)
}

pub fn simulate(
    catalog: &Catalog,
    original: &GeologicalSnapshot,
    state: &SimulationState,
    month: Option<Month>,
) -> SimulationOutcome {
    let original_score = PointsModel.assess(catalog, original).score;
    let base_score = PointsModel.assess(catalog, &state.terrain).score;
    let simulated_score = adjusted_score(catalog, state, month);
    let delta = simulated_score - original_score as f64;
    let trend = if delta.abs() < STABLE_BAND {
        Trend::Stable
    } else if delta > 0.0 {
        Trend::Rising
    } else {
        Trend::Falling
    };

    SimulationOutcome {
        original_score,
        base_score,
        simulated_score,
        delta,
        trend,
        simulated_tier: TierScale::Points.classify(simulated_score),
        estimated_economic_impact: delta * IMPACT_PER_POINT * REFERENCE_ASSET_VALUE_COP,
    }
}

/// Caller-held simulation session for one analysed snapshot.
#[derive(Debug, Clone)]
pub struct Simulator<'a> {
    catalog: &'a Catalog,
    original: GeologicalSnapshot,
    state: SimulationState,
    month: Option<Month>,
    preset: Option<ScenarioPreset>,
}

impl<'a> Simulator<'a> {
    pub fn new(catalog: &'a Catalog, original: GeologicalSnapshot) -> Self {
        let state = SimulationState::from_snapshot(&original);
        Self {
            catalog,
            original,
            state,
            month: None,
            preset: None,
        }
    }

    pub fn original(&self) -> &GeologicalSnapshot {
        &self.original
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn month(&self) -> Option<Month> {
        self.month
    }

    pub fn preset(&self) -> Option<ScenarioPreset> {
        self.preset
    }

    pub fn update(&mut self, edit: impl FnOnce(&mut SimulationState)) {
        edit(&mut self.state);
        self.state.normalize();
    }

    pub fn set_controls(&mut self, controls: SimulationControls) {
        self.update(|state| state.controls = controls);
    }

    pub fn set_month(&mut self, month: Option<Month>) {
        self.month = month;
    }

    pub fn apply_preset(&mut self, preset: ScenarioPreset) {
        preset.apply(&mut self.state, &self.original);
        self.state.normalize();
        self.preset = Some(preset);
    }

    /// Back to the original snapshot, default controls and current
    /// conditions.
    pub fn reset(&mut self) {
        self.state = SimulationState::from_snapshot(&self.original);
        self.month = None;
        self.preset = None;
    }

    pub fn outcome(&self) -> SimulationOutcome {
        simulate(self.catalog, &self.original, &self.state, self.month)
    }
}
