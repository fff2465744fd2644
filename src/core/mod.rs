pub mod analysis;
pub mod neighbourhood;
pub mod regression;
pub mod runner;
pub mod track_fit;
pub mod vaccine;

pub use crate::domain::model::{Grid, Individual, LineFit, RegressionFit, TrackEvent, TrackFit};
pub use crate::domain::ports::{Analysis, CenterLookup, Job, Storage};
pub use crate::utils::error::Result;
