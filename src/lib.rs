pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::jobs::{GridScanJob, RegressionJob, ReportJob, TrackFitJob, VaccinationJob};
pub use config::{cli::LocalStorage, toml_config::LabConfig};
pub use crate::core::runner::JobRunner;
pub use utils::error::{LabError, Result};
