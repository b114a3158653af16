pub mod analysis;
pub mod catalog;
pub mod config;
pub mod error;
pub mod report;
pub mod resolver;
pub mod risk;
pub mod rng;
pub mod simulation;
pub mod synth;
pub mod web;

pub use analysis::{Analysis, Analyzer, Pacing};
pub use catalog::{Catalog, CatalogLoader, Coordinates, District, SoilType};
pub use config::Config;
pub use error::{Result, RiskError};
pub use report::{Report, ReportFormat};
pub use resolver::LocationRequest;
pub use risk::{RiskAssessment, RiskModel, Tier};
pub use simulation::{SimulationOutcome, Simulator};
