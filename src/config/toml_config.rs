use crate::core::track_fit::{linspace, FitOptions};
use crate::core::regression::GradientDescent;
use crate::utils::error::{LabError, Result};
use crate::utils::validation::{self, Validate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabConfig {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub vaccine: VaccineConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub regression: RegressionConfig,
    #[serde(default)]
    pub tracks: TracksConfig,
    #[serde(default)]
    pub report: ReportConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./output".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaccineConfig {
    pub threshold_age: u32,
    pub doses: u32,
    /// 沒有 population_file 時隨機產生的人數
    pub population_size: usize,
    pub seed: Option<u64>,
    pub population_file: Option<String>,
    pub centers_file: Option<String>,
    /// 本次施打的地點與日期 (日期需加引號，例如 "2021-03-01")
    pub location: String,
    pub date: NaiveDate,
    /// 沒有 centers_file 時本地點使用的疫苗品牌
    pub vaccine_name: String,
}

impl Default for VaccineConfig {
    fn default() -> Self {
        Self {
            threshold_age: 70,
            doses: 120,
            population_size: 100,
            seed: None,
            population_file: None,
            centers_file: None,
            location: "central".to_string(),
            date: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap_or_default(),
            vaccine_name: "unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub input: Option<String>,
    /// "dense" 或 "edges"
    pub format: String,
    pub fill_value: f64,
    /// 沒有設定時輸出到 output.path/dominant_edges.txt
    pub log_file: Option<String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            input: None,
            format: "dense".to_string(),
            fill_value: 0.0,
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    pub alpha: f64,
    pub steps: usize,
    pub log_every: usize,
    pub seed: Option<u64>,
    /// 有標題列的 CSV，最後一欄為目標值；未設定時使用合成資料
    pub dataset: Option<String>,
    pub samples: usize,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            steps: 500,
            log_every: 10,
            seed: None,
            dataset: None,
            samples: 100,
            coefficients: vec![3.5, 4.0, -4.0],
            intercept: 1.0,
        }
    }
}

impl RegressionConfig {
    pub fn gradient_descent(&self) -> GradientDescent {
        GradientDescent {
            alpha: self.alpha,
            steps: self.steps,
            log_every: self.log_every,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TracksConfig {
    pub input: Option<String>,
    pub vertical: bool,
    pub slope_threshold: f64,
    pub min_global_layers: usize,
    pub min_double_layers: usize,
    pub layer_split: u32,
    pub separation: isize,
    pub grid_start: f64,
    pub grid_stop: f64,
    pub grid_points: usize,
}

impl Default for TracksConfig {
    fn default() -> Self {
        let options = FitOptions::default();
        Self {
            input: None,
            vertical: options.vertical,
            slope_threshold: options.slope_threshold,
            min_global_layers: options.min_global_layers,
            min_double_layers: options.min_double_layers,
            layer_split: options.layer_split,
            separation: options.separation,
            grid_start: 0.0,
            grid_stop: 200.0,
            grid_points: 50,
        }
    }
}

impl TracksConfig {
    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            vertical: self.vertical,
            slope_threshold: self.slope_threshold,
            min_global_layers: self.min_global_layers,
            min_double_layers: self.min_double_layers,
            layer_split: self.layer_split,
            separation: self.separation,
            grid: linspace(self.grid_start, self.grid_stop, self.grid_points),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub name: String,
    pub input: Option<String>,
    /// 未設定時讀取第一欄
    pub column: Option<String>,
    pub include_incomplete: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            name: "report".to_string(),
            input: None,
            column: None,
            include_incomplete: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_logs: Option<bool>,
}

impl LabConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LabError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LabError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LabError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }

    pub fn output_path(&self) -> &str {
        &self.output.path
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("output.path", &self.output.path)?;

        // 疫苗
        validation::validate_range("vaccine.threshold_age", self.vaccine.threshold_age, 0, 150)?;
        validation::validate_non_empty("vaccine.location", &self.vaccine.location)?;
        if self.vaccine.population_file.is_none() {
            validation::validate_positive_number(
                "vaccine.population_size",
                self.vaccine.population_size,
                1,
            )?;
        }
        let csv_inputs: Vec<String> = [&self.vaccine.population_file, &self.vaccine.centers_file]
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        validation::validate_file_extensions("vaccine inputs", &csv_inputs, &["csv"])?;

        // 網格
        validation::validate_one_of("grid.format", &self.grid.format, &["dense", "edges"])?;
        if !self.grid.fill_value.is_finite() {
            return Err(LabError::InvalidConfigValueError {
                field: "grid.fill_value".to_string(),
                value: self.grid.fill_value.to_string(),
                reason: "Fill value must be finite".to_string(),
            });
        }

        // 迴歸
        validation::validate_finite_positive("regression.alpha", self.regression.alpha)?;
        validation::validate_positive_number("regression.steps", self.regression.steps, 1)?;
        if self.regression.dataset.is_none() {
            validation::validate_positive_number("regression.samples", self.regression.samples, 1)?;
        }

        // 徑跡
        validation::validate_positive_number("tracks.grid_points", self.tracks.grid_points, 1)?;
        validation::validate_positive_number(
            "tracks.min_global_layers",
            self.tracks.min_global_layers,
            2,
        )?;
        if !(self.tracks.slope_threshold.is_finite() && self.tracks.slope_threshold >= 0.0) {
            return Err(LabError::InvalidConfigValueError {
                field: "tracks.slope_threshold".to_string(),
                value: self.tracks.slope_threshold.to_string(),
                reason: "Threshold must be a finite, non-negative number".to_string(),
            });
        }
        if let Some(input) = &self.tracks.input {
            validation::validate_file_extensions("tracks.input", &[input.clone()], &["json"])?;
        }

        validation::validate_non_empty("report.name", &self.report.name)?;

        Ok(())
    }
}

impl Validate for LabConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
