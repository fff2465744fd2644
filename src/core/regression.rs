use crate::domain::model::RegressionFit;
use crate::utils::error::{LabError, Result};
use crate::utils::validation::{validate_finite_positive, validate_positive_number};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::io::Read;

/// 均方誤差的一半：Σe² / 2m
pub fn cost(estimated: &DVector<f64>, truth: &DVector<f64>) -> f64 {
    let m = truth.len() as f64;
    (estimated - truth).norm_squared() / (2.0 * m)
}

pub fn check_dimensions(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(LabError::DimensionMismatch {
            what: "samples in features and target".to_string(),
            expected: x.nrows(),
            actual: y.len(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct GradientDescent {
    pub alpha: f64,
    pub steps: usize,
    /// 每隔幾步記錄一次 cost，0 表示不記錄
    pub log_every: usize,
    pub seed: Option<u64>,
}

impl Default for GradientDescent {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            steps: 500,
            log_every: 10,
            seed: None,
        }
    }
}

impl GradientDescent {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 批次梯度下降。特徵矩陣前面補一欄 1 作為截距，權重以標準常態分佈初始化。
    pub fn fit(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<RegressionFit> {
        check_dimensions(x, y)?;
        validate_finite_positive("regression.alpha", self.alpha)?;
        validate_positive_number("regression.steps", self.steps, 1)?;
        if x.nrows() == 0 {
            return Err(LabError::ValidationError {
                message: "cannot fit a regression on zero samples".to_string(),
            });
        }

        let m = x.nrows() as f64;
        let design = x.clone().insert_column(0, 1.0);

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut weights: DVector<f64> =
            DVector::from_fn(design.ncols(), |_, _| rng.sample::<f64, _>(StandardNormal));

        let mut cost_history = Vec::with_capacity(self.steps);
        for step in 0..self.steps {
            let estimated = &design * &weights;
            let step_cost = cost(&estimated, y);

            let error = estimated - y;
            let gradient = design.transpose() * error / m;
            weights -= gradient * self.alpha;

            if self.log_every > 0 && step % self.log_every == 0 {
                tracing::debug!("step: {}\tcost: {}", step, step_cost);
            }
            cost_history.push(step_cost);
        }

        Ok(RegressionFit {
            params: weights,
            cost_history,
        })
    }
}

impl RegressionFit {
    pub fn intercept(&self) -> f64 {
        self.params[0]
    }

    pub fn coefficients(&self) -> Vec<f64> {
        self.params.iter().skip(1).copied().collect()
    }

    pub fn final_cost(&self) -> Option<f64> {
        self.cost_history.last().copied()
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>> {
        let expected = self.params.len() - 1;
        if x.ncols() != expected {
            return Err(LabError::DimensionMismatch {
                what: "feature columns".to_string(),
                expected,
                actual: x.ncols(),
            });
        }
        Ok(x.clone().insert_column(0, 1.0) * &self.params)
    }
}

/// X ~ N(0, 1)，y = intercept + X·coefficients，無雜訊
pub fn synthetic_dataset<R: Rng>(
    samples: usize,
    coefficients: &[f64],
    intercept: f64,
    rng: &mut R,
) -> (DMatrix<f64>, DVector<f64>) {
    let x = DMatrix::from_fn(samples, coefficients.len(), |_, _| {
        rng.sample::<f64, _>(StandardNormal)
    });
    let y = (&x * DVector::from_column_slice(coefficients)).add_scalar(intercept);
    (x, y)
}

/// 有標題列的 CSV，最後一欄為目標值
pub fn read_dataset<R: Read>(reader: R) -> Result<(DMatrix<f64>, DVector<f64>)> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let n_cols = csv_reader.headers()?.len();
    if n_cols < 2 {
        return Err(LabError::ValidationError {
            message: "dataset needs at least one feature column and one target column"
                .to_string(),
        });
    }

    let mut features = Vec::new();
    let mut targets = Vec::new();
    for (row_idx, record) in csv_reader.records().enumerate() {
        let record = record?;
        let values = record
            .iter()
            .map(|cell| {
                cell.parse::<f64>().map_err(|_| LabError::ProcessingError {
                    message: format!("row {}: '{}' is not a number", row_idx + 1, cell),
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let (target, row) = match values.split_last() {
            Some(split) => split,
            None => continue,
        };
        features.extend_from_slice(row);
        targets.push(*target);
    }

    let x = DMatrix::from_row_slice(targets.len(), n_cols - 1, &features);
    Ok((x, DVector::from_vec(targets)))
}
