use chrono::NaiveDate;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// 人口中的單一個體，一筆 CSV 紀錄對應一個
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub id: u32,
    pub age: u32,
    pub is_at_risk: bool,
    pub has_first_jab: bool,
    pub has_second_jab: bool,
    pub jab_location: Option<String>,
    pub date_first_jab: Option<NaiveDate>,
}

impl Individual {
    pub fn new(id: u32, age: u32, is_at_risk: bool) -> Self {
        Self {
            id,
            age,
            is_at_risk,
            has_first_jab: false,
            has_second_jab: false,
            jab_location: None,
            date_first_jab: None,
        }
    }

    pub fn is_fully_vaccinated(&self) -> bool {
        self.has_first_jab && self.has_second_jab
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterDay {
    pub location: String,
    pub date: NaiveDate,
    pub vaccine_name: String,
}

/// 接種地點與日期
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JabSite {
    pub location: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub first_doses: u32,
    pub second_doses: u32,
    pub skipped_ineligible: u32,
    pub skipped_complete: u32,
    pub remaining_doses: u32,
}

/// 邊權重矩陣，row-major，建立後唯讀
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    weights: Vec<f64>,
}

impl Grid {
    pub(crate) fn from_parts(rows: usize, cols: usize, weights: Vec<f64>) -> Self {
        debug_assert_eq!(rows * cols, weights.len());
        Self {
            rows,
            cols,
            weights,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn borders(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            self.weights.get(row * self.cols + col).copied()
        } else {
            None
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.weights
            .iter()
            .enumerate()
            .map(move |(idx, w)| ((idx / self.cols, idx % self.cols), *w))
    }
}

/// 某一軸的命中座標
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hits {
    pub xpos: Vec<f64>,
    pub ypos: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEvent {
    #[serde(default)]
    pub event_id: Option<u64>,
    pub hit_layers: Vec<u32>,
    pub n_hit_layers_x: usize,
    pub n_hit_layers_y: usize,
    pub x_layers: Hits,
    pub y_layers: Hits,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

/// 各欄位為 None 代表未計算，不是 0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackFit {
    pub event_id: Option<u64>,
    pub line_x: Option<Vec<f64>>,
    pub line_y: Option<Vec<f64>>,
    pub residuals_x: Option<Vec<f64>>,
    pub residuals_y: Option<Vec<f64>>,
    pub slope_x: Option<f64>,
    pub slope_y: Option<f64>,
    pub top_x: Option<Vec<f64>>,
    pub bottom_x: Option<Vec<f64>>,
    pub top_y: Option<Vec<f64>>,
    pub bottom_y: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionFit {
    /// params[0] 為截距
    pub params: DVector<f64>,
    pub cost_history: Vec<f64>,
}
