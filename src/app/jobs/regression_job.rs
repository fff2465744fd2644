use crate::app::jobs::output_file;
use crate::config::toml_config::RegressionConfig;
use crate::core::regression::{read_dataset, synthetic_dataset};
use crate::core::{Job, RegressionFit, Storage};
use crate::utils::error::Result;
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

pub const REGRESSION_FILE: &str = "regression.json";

#[derive(Debug, Clone, Serialize)]
pub struct RegressionSummary {
    pub samples: usize,
    pub alpha: f64,
    pub steps: usize,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    pub final_cost: Option<f64>,
    pub cost_history: Vec<f64>,
}

pub struct RegressionJob<S: Storage> {
    storage: S,
    config: RegressionConfig,
    output_path: String,
}

impl<S: Storage> RegressionJob<S> {
    pub fn new(storage: S, config: RegressionConfig, output_path: impl Into<String>) -> Self {
        Self {
            storage,
            config,
            output_path: output_path.into(),
        }
    }
}

impl<S: Storage> Job for RegressionJob<S> {
    type Input = (DMatrix<f64>, DVector<f64>);
    type Output = (usize, RegressionFit);

    fn name(&self) -> &str {
        "regress"
    }

    fn extract(&self) -> Result<Self::Input> {
        match &self.config.dataset {
            Some(path) => {
                let data = self.storage.read_file(path)?;
                let (x, y) = read_dataset(data.as_slice())?;
                tracing::info!("📈 Loaded {} samples x {} features", x.nrows(), x.ncols());
                Ok((x, y))
            }
            None => {
                // 合成資料與權重初始化使用不同的種子
                let mut rng = match self.config.seed {
                    Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
                    None => StdRng::from_entropy(),
                };
                tracing::info!(
                    "📈 Generating {} synthetic samples with coefficients {:?}",
                    self.config.samples,
                    self.config.coefficients
                );
                Ok(synthetic_dataset(
                    self.config.samples,
                    &self.config.coefficients,
                    self.config.intercept,
                    &mut rng,
                ))
            }
        }
    }

    fn transform(&self, (x, y): Self::Input) -> Result<Self::Output> {
        let fit = self.config.gradient_descent().fit(&x, &y)?;
        tracing::info!(
            "📉 Intercept {:.4}, coefficients {:?}, final cost {:?}",
            fit.intercept(),
            fit.coefficients(),
            fit.final_cost()
        );
        Ok((x.nrows(), fit))
    }

    fn load(&self, (samples, fit): Self::Output) -> Result<String> {
        let summary = RegressionSummary {
            samples,
            alpha: self.config.alpha,
            steps: self.config.steps,
            intercept: fit.intercept(),
            coefficients: fit.coefficients(),
            final_cost: fit.final_cost(),
            cost_history: fit.cost_history,
        };

        let path = output_file(&self.output_path, REGRESSION_FILE);
        self.storage
            .write_file(&path, serde_json::to_string_pretty(&summary)?.as_bytes())?;
        Ok(path)
    }
}
