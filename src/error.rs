use thiserror::Error;

use crate::catalog::CatalogError;
use crate::report::ExportError;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("district not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("report export failed: {0}")]
    Export(#[from] ExportError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl RiskError {
    pub fn validation(msg: impl Into<String>) -> Self {
        RiskError::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;
