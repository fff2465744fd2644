use crate::app::jobs::output_file;
use crate::config::toml_config::ReportConfig;
use crate::core::analysis::{CounterAnalysis, Report, SummaryAnalysis};
use crate::core::{Analysis, Job, Storage};
use crate::utils::error::{LabError, Result};
use crate::utils::validation::validate_required_field;
use std::io::Read;

pub const REPORT_FILE: &str = "report.txt";

pub struct ReportJob<S: Storage> {
    storage: S,
    config: ReportConfig,
    output_path: String,
}

impl<S: Storage> ReportJob<S> {
    pub fn new(storage: S, config: ReportConfig, output_path: impl Into<String>) -> Self {
        Self {
            storage,
            config,
            output_path: output_path.into(),
        }
    }
}

/// 讀取 CSV 中的一欄整數，未指定欄名時取第一欄
pub fn read_integer_column<R: Read>(reader: R, column: Option<&str>) -> Result<Vec<i64>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let index = match column {
        Some(name) => csv_reader
            .headers()?
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LabError::ValidationError {
                message: format!("column '{}' not found in input", name),
            })?,
        None => 0,
    };

    let mut values = Vec::new();
    for (row_idx, record) in csv_reader.records().enumerate() {
        let record = record?;
        let cell = record.get(index).unwrap_or_default();
        let value = cell.parse::<i64>().map_err(|_| LabError::ProcessingError {
            message: format!("row {}: '{}' is not an integer", row_idx + 1, cell),
        })?;
        values.push(value);
    }
    Ok(values)
}

impl<S: Storage> Job for ReportJob<S> {
    type Input = Vec<i64>;
    type Output = Report;

    fn name(&self) -> &str {
        "report"
    }

    fn extract(&self) -> Result<Vec<i64>> {
        let input = validate_required_field("report.input", &self.config.input)?;
        let data = self.storage.read_file(input)?;
        let values = read_integer_column(data.as_slice(), self.config.column.as_deref())?;
        tracing::info!("📋 Loaded {} values from {}", values.len(), input);
        Ok(values)
    }

    fn transform(&self, values: Vec<i64>) -> Result<Report> {
        let mut report = Report::new(self.config.name.clone());
        report.add_analysis(Box::new(CounterAnalysis::new(
            "counter",
            "This counts number of occurences in a vector",
        )));
        report.add_analysis(Box::new(SummaryAnalysis::new("summary", "")));

        for analysis in report.analyses_mut() {
            analysis.load_data(values.clone());
            match analysis.run() {
                Ok(()) => analysis.set_complete(true),
                Err(e) => tracing::warn!("⚠️ Analysis '{}' failed: {}", analysis.name(), e),
            }
        }

        Ok(report)
    }

    fn load(&self, report: Report) -> Result<String> {
        let mut data = Vec::new();
        report.write_to(&mut data, !self.config.include_incomplete)?;

        let path = output_file(&self.output_path, REPORT_FILE);
        self.storage.write_file(&path, &data)?;
        Ok(path)
    }
}
