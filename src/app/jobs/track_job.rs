use crate::app::jobs::output_file;
use crate::config::toml_config::TracksConfig;
use crate::core::track_fit::fit_event;
use crate::core::{Job, Storage, TrackEvent, TrackFit};
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;

pub const TRACK_FITS_FILE: &str = "track_fits.json";

pub struct TrackFitJob<S: Storage> {
    storage: S,
    config: TracksConfig,
    output_path: String,
}

impl<S: Storage> TrackFitJob<S> {
    pub fn new(storage: S, config: TracksConfig, output_path: impl Into<String>) -> Self {
        Self {
            storage,
            config,
            output_path: output_path.into(),
        }
    }
}

impl<S: Storage> Job for TrackFitJob<S> {
    type Input = Vec<TrackEvent>;
    type Output = Vec<TrackFit>;

    fn name(&self) -> &str {
        "tracks"
    }

    fn extract(&self) -> Result<Vec<TrackEvent>> {
        let input = validate_required_field("tracks.input", &self.config.input)?;
        let events: Vec<TrackEvent> = serde_json::from_slice(&self.storage.read_file(input)?)?;
        tracing::info!("🎯 Loaded {} track events", events.len());
        Ok(events)
    }

    fn transform(&self, events: Vec<TrackEvent>) -> Result<Vec<TrackFit>> {
        let options = self.config.fit_options();
        let fits = events
            .iter()
            .map(|event| fit_event(event, &options))
            .collect::<Result<Vec<_>>>()?;

        let with_slope = fits
            .iter()
            .filter(|f| f.slope_x.is_some() || f.slope_y.is_some())
            .count();
        tracing::info!(
            "🎯 Fitted {} events, {} with residuals kept",
            fits.len(),
            with_slope
        );
        Ok(fits)
    }

    fn load(&self, fits: Vec<TrackFit>) -> Result<String> {
        let path = output_file(&self.output_path, TRACK_FITS_FILE);
        self.storage
            .write_file(&path, serde_json::to_string_pretty(&fits)?.as_bytes())?;
        Ok(path)
    }
}
