use crate::domain::ports::Analysis;
use crate::utils::error::{LabError, Result};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;

/// 各種分析共用的欄位
#[derive(Debug, Clone, Default)]
pub struct AnalysisState {
    pub name: String,
    pub description: String,
    pub complete: bool,
    data: Option<Vec<i64>>,
}

impl AnalysisState {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            complete: false,
            data: None,
        }
    }

    fn loaded_data(&self) -> Result<&[i64]> {
        match self.data.as_deref() {
            Some(data) if !data.is_empty() => Ok(data),
            Some(_) => Err(LabError::ProcessingError {
                message: format!("analysis '{}' received empty data", self.name),
            }),
            None => Err(LabError::ProcessingError {
                message: format!("analysis '{}' has no data loaded", self.name),
            }),
        }
    }
}

macro_rules! delegate_state {
    () => {
        fn name(&self) -> &str {
            &self.state.name
        }

        fn description(&self) -> &str {
            &self.state.description
        }

        fn load_data(&mut self, data: Vec<i64>) {
            self.state.data = Some(data);
        }

        fn is_complete(&self) -> bool {
            self.state.complete
        }

        fn set_complete(&mut self, status: bool) {
            self.state.complete = status;
        }
    };
}

/// 計算每個值出現的次數
#[derive(Debug, Clone, Default)]
pub struct CounterAnalysis {
    state: AnalysisState,
    counts: Option<Vec<(i64, usize)>>,
}

impl CounterAnalysis {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            state: AnalysisState::new(name, description),
            counts: None,
        }
    }

    /// 依次數遞減排列，次數相同時依值遞增
    pub fn counts(&self) -> Option<&[(i64, usize)]> {
        self.counts.as_deref()
    }
}

impl Analysis for CounterAnalysis {
    delegate_state!();

    fn run(&mut self) -> Result<()> {
        let data = self.state.loaded_data()?;

        let mut counter: HashMap<i64, usize> = HashMap::new();
        for value in data {
            *counter.entry(*value).or_insert(0) += 1;
        }

        let mut counts: Vec<(i64, usize)> = counter.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        self.counts = Some(counts);
        Ok(())
    }

    fn results(&self) -> Option<String> {
        self.counts.as_ref().map(|counts| {
            let body = counts
                .iter()
                .map(|(value, count)| format!("{}: {}", value, count))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{{}}}", body)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: i64,
    pub max: i64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "count={} mean={:.3} std={:.3} min={} max={}",
            self.count, self.mean, self.std_dev, self.min, self.max
        )
    }
}

/// 基本敘述統計，標準差為母體標準差
#[derive(Debug, Clone, Default)]
pub struct SummaryAnalysis {
    state: AnalysisState,
    summary: Option<Summary>,
}

impl SummaryAnalysis {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            state: AnalysisState::new(name, description),
            summary: None,
        }
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }
}

impl Analysis for SummaryAnalysis {
    delegate_state!();

    fn run(&mut self) -> Result<()> {
        let data = self.state.loaded_data()?;

        let count = data.len();
        let mean = data.iter().map(|&v| v as f64).sum::<f64>() / count as f64;
        let variance = data
            .iter()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / count as f64;

        self.summary = Some(Summary {
            count,
            mean,
            std_dev: variance.sqrt(),
            min: data.iter().copied().min().unwrap_or_default(),
            max: data.iter().copied().max().unwrap_or_default(),
        });
        Ok(())
    }

    fn results(&self) -> Option<String> {
        self.summary.map(|s| s.to_string())
    }
}

/// 收集多個分析並輸出結果
#[derive(Default)]
pub struct Report {
    pub name: String,
    analyses: Vec<Box<dyn Analysis>>,
}

impl Report {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            analyses: Vec::new(),
        }
    }

    pub fn add_analysis(&mut self, analysis: Box<dyn Analysis>) {
        self.analyses.push(analysis);
    }

    pub fn analyses(&self) -> &[Box<dyn Analysis>] {
        &self.analyses
    }

    pub fn analyses_mut(&mut self) -> &mut [Box<dyn Analysis>] {
        &mut self.analyses
    }

    /// `only_completed` 為 true 時略過尚未完成的分析
    pub fn generate(&self, only_completed: bool) -> String {
        let mut out = format!("Report {}\n", self.name);
        for analysis in &self.analyses {
            if only_completed && !analysis.is_complete() {
                tracing::debug!("Skipping incomplete analysis '{}'", analysis.name());
                continue;
            }
            out.push_str(&analysis.render());
            out.push('\n');
        }
        out
    }

    pub fn write_to<W: Write>(&self, mut writer: W, only_completed: bool) -> Result<()> {
        writer.write_all(self.generate(only_completed).as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
