use crate::app::jobs::output_file;
use crate::config::toml_config::VaccineConfig;
use crate::core::vaccine::{
    apply_vaccine_to_population, brand_histogram, generate_random_population, read_population,
    write_population, CenterDirectory, VaccinationPolicy,
};
use crate::core::{CenterLookup, Job, Storage};
use crate::domain::model::{AllocationSummary, CenterDay, Individual, JabSite};
use crate::utils::error::{LabError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;

pub const POPULATION_FILE: &str = "population.csv";
pub const HISTOGRAM_FILE: &str = "brand_histogram.json";

pub struct VaccinationInput {
    pub population: Vec<Individual>,
    pub directory: CenterDirectory,
    pub site: JabSite,
}

#[derive(Debug, Clone, Serialize)]
pub struct VaccinationOutcome {
    #[serde(skip)]
    pub population: Vec<Individual>,
    pub summary: AllocationSummary,
    pub brand_histogram: BTreeMap<String, usize>,
}

pub struct VaccinationJob<S: Storage> {
    storage: S,
    config: VaccineConfig,
    output_path: String,
}

impl<S: Storage> VaccinationJob<S> {
    pub fn new(storage: S, config: VaccineConfig, output_path: impl Into<String>) -> Self {
        Self {
            storage,
            config,
            output_path: output_path.into(),
        }
    }

    fn load_directory(&self) -> Result<CenterDirectory> {
        match &self.config.centers_file {
            Some(path) => {
                let data = self.storage.read_file(path)?;
                let directory = CenterDirectory::from_csv_reader(data.as_slice())?;
                tracing::info!("🏥 Loaded {} center days from {}", directory.len(), path);
                Ok(directory)
            }
            None => Ok(CenterDirectory::new([CenterDay {
                location: self.config.location.clone(),
                date: self.config.date,
                vaccine_name: self.config.vaccine_name.clone(),
            }])),
        }
    }
}

impl<S: Storage> Job for VaccinationJob<S> {
    type Input = VaccinationInput;
    type Output = VaccinationOutcome;

    fn name(&self) -> &str {
        "vaccinate"
    }

    fn extract(&self) -> Result<VaccinationInput> {
        let directory = self.load_directory()?;
        let site = JabSite {
            location: self.config.location.clone(),
            date: self.config.date,
        };
        if directory.center_day(&site.location, site.date).is_none() {
            return Err(LabError::UnknownCenter {
                location: site.location,
                date: site.date.to_string(),
            });
        }

        let population = match &self.config.population_file {
            Some(path) => read_population(self.storage.read_file(path)?.as_slice())?,
            None => {
                let mut rng = match self.config.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                generate_random_population(
                    self.config.population_size,
                    &directory.sites(),
                    &mut rng,
                )
            }
        };
        tracing::info!("👥 Population of {} individuals ready", population.len());

        Ok(VaccinationInput {
            population,
            directory,
            site,
        })
    }

    fn transform(&self, input: VaccinationInput) -> Result<VaccinationOutcome> {
        let VaccinationInput {
            mut population,
            directory,
            site,
        } = input;

        let policy = VaccinationPolicy::new(self.config.threshold_age);
        let summary =
            apply_vaccine_to_population(&mut population, self.config.doses, &policy, &site)?;
        let brand_histogram = brand_histogram(&population, &directory)?;

        tracing::info!(
            "💉 {} first and {} second doses given, {} left",
            summary.first_doses,
            summary.second_doses,
            summary.remaining_doses
        );

        Ok(VaccinationOutcome {
            population,
            summary,
            brand_histogram,
        })
    }

    fn load(&self, output: VaccinationOutcome) -> Result<String> {
        let mut csv_data = Vec::new();
        write_population(&mut csv_data, &output.population)?;
        self.storage
            .write_file(&output_file(&self.output_path, POPULATION_FILE), &csv_data)?;

        let histogram_path = output_file(&self.output_path, HISTOGRAM_FILE);
        let json_data = serde_json::to_string_pretty(&output)?;
        self.storage
            .write_file(&histogram_path, json_data.as_bytes())?;

        Ok(histogram_path)
    }
}
