pub mod app_config;
pub mod config;
pub mod document;
pub mod normalize;
pub mod survey;
pub mod types;
pub mod valuation;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use normalize::{fold_digits, normalize_display, normalize_key};
pub use survey::SurveyIdentifier;
pub use types::{AdministrativeLocator, MatchMode, ScrapeRequest, ScrapeResult, ScrapeStatus};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("administrative locator field `{field}` is empty")]
    InvalidLocator { field: &'static str },

    #[error("invalid survey number list: {0}")]
    InvalidSurveyList(String),

    #[error("no area band contains {area}")]
    NoAreaBand { area: f64 },

    #[error("rate \"{raw}\" for band {band} is not a number")]
    InvalidRate { band: String, raw: String },
}
