//! 粒子徑跡的直線擬合。
//!
//! 每一軸各自判斷：命中層數足夠時做全域擬合，唯一層數足夠時再把命中點分成
//! 上下兩段各自擬合。沒有計算的輸出保持 `None`。

use crate::domain::model::{Hits, LineFit, TrackEvent, TrackFit};
use crate::utils::error::{LabError, Result};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub vertical: bool,
    pub slope_threshold: f64,
    pub min_global_layers: usize,
    pub min_double_layers: usize,
    /// 層編號 >= layer_split 屬於 x 層，其餘屬於 y 層
    pub layer_split: u32,
    pub separation: isize,
    pub grid: Vec<f64>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            vertical: false,
            slope_threshold: 0.0,
            min_global_layers: 3,
            min_double_layers: 4,
            layer_split: 5,
            separation: -2,
            grid: linspace(0.0, 200.0, 50),
        }
    }
}

pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| {
                    if i == num - 1 {
                        stop
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// 最小平方法擬合 y = slope·x + intercept
pub fn global_fit(xs: &[f64], ys: &[f64]) -> Result<LineFit> {
    if xs.len() != ys.len() {
        return Err(LabError::DimensionMismatch {
            what: "hit coordinates".to_string(),
            expected: xs.len(),
            actual: ys.len(),
        });
    }
    if xs.len() < 2 {
        return Err(LabError::DegenerateFit {
            reason: format!("need at least 2 points, got {}", xs.len()),
        });
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (sxx, sxy) = xs
        .iter()
        .zip(ys)
        .fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
            let dx = x - mean_x;
            (sxx + dx * dx, sxy + dx * (y - mean_y))
        });

    // 只容許平均值的捨入誤差：n·ε·max|x|
    let rounding = n * f64::EPSILON * xs.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    if sxx <= rounding * rounding {
        return Err(LabError::DegenerateFit {
            reason: "all points share the same x coordinate".to_string(),
        });
    }

    let slope = sxy / sxx;
    if !slope.is_finite() {
        return Err(LabError::DegenerateFit {
            reason: format!("slope is not finite ({})", slope),
        });
    }
    Ok(LineFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

impl LineFit {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn evaluate(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter().map(|&x| self.at(x)).collect()
    }

    /// slope·x + intercept - y
    pub fn residuals(&self, xs: &[f64], ys: &[f64]) -> Vec<f64> {
        xs.iter().zip(ys).map(|(&x, &y)| self.at(x) - y).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SplitFit {
    pub top: Option<LineFit>,
    pub bottom: Option<LineFit>,
}

/// 依 y 由高到低排序後在 `separation` 處切開，負值從尾端算起
pub fn double_fit(xs: &[f64], ys: &[f64], separation: isize) -> Result<SplitFit> {
    if xs.len() != ys.len() {
        return Err(LabError::DimensionMismatch {
            what: "hit coordinates".to_string(),
            expected: xs.len(),
            actual: ys.len(),
        });
    }

    let mut points: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
    points.sort_by(|a, b| b.1.total_cmp(&a.1));

    let len = points.len() as isize;
    let split = if separation < 0 {
        len + separation
    } else {
        separation
    }
    .clamp(0, len) as usize;

    let (top, bottom) = points.split_at(split);
    Ok(SplitFit {
        top: fit_part(top),
        bottom: fit_part(bottom),
    })
}

fn fit_part(points: &[(f64, f64)]) -> Option<LineFit> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
    global_fit(&xs, &ys).ok()
}

struct AxisFit {
    line: Vec<f64>,
    residuals: Option<Vec<f64>>,
    slope: Option<f64>,
}

/// 只有退化擬合會被略過，其他錯誤往上傳
fn fit_axis(
    axis: &str,
    hits: &Hits,
    n_hit_layers: usize,
    options: &FitOptions,
) -> Result<Option<AxisFit>> {
    if n_hit_layers < options.min_global_layers {
        return Ok(None);
    }

    let fit = match global_fit(&hits.xpos, &hits.ypos) {
        Ok(fit) => fit,
        Err(e @ LabError::DegenerateFit { .. }) => {
            tracing::warn!("⚠️ Global fit on {} skipped: {}", axis, e);
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let keep_residuals = if options.vertical {
        fit.slope.abs() >= options.slope_threshold
    } else {
        fit.slope != 0.0
    };

    Ok(Some(AxisFit {
        line: fit.evaluate(&options.grid),
        residuals: keep_residuals.then(|| fit.residuals(&hits.xpos, &hits.ypos)),
        slope: keep_residuals.then_some(fit.slope),
    }))
}

fn check_hits(axis: &str, hits: &Hits) -> Result<()> {
    if hits.xpos.len() != hits.ypos.len() {
        return Err(LabError::DimensionMismatch {
            what: format!("{} hit coordinates", axis),
            expected: hits.xpos.len(),
            actual: hits.ypos.len(),
        });
    }
    Ok(())
}

fn unique_layers(layers: &[u32], keep: impl Fn(u32) -> bool) -> usize {
    layers
        .iter()
        .copied()
        .filter(|&l| keep(l))
        .collect::<BTreeSet<_>>()
        .len()
}

fn split_lines(hits: &Hits, options: &FitOptions) -> Result<(Option<Vec<f64>>, Option<Vec<f64>>)> {
    let split = double_fit(&hits.xpos, &hits.ypos, options.separation)?;
    Ok((
        split.top.map(|f| f.evaluate(&options.grid)),
        split.bottom.map(|f| f.evaluate(&options.grid)),
    ))
}

pub fn fit_event(event: &TrackEvent, options: &FitOptions) -> Result<TrackFit> {
    let mut result = TrackFit {
        event_id: event.event_id,
        ..Default::default()
    };

    check_hits("x", &event.x_layers)?;
    check_hits("y", &event.y_layers)?;

    if let Some(axis) = fit_axis("x", &event.x_layers, event.n_hit_layers_x, options)? {
        result.line_x = Some(axis.line);
        result.residuals_x = axis.residuals;
        result.slope_x = axis.slope;
    }

    if let Some(axis) = fit_axis("y", &event.y_layers, event.n_hit_layers_y, options)? {
        result.line_y = Some(axis.line);
        result.residuals_y = axis.residuals;
        result.slope_y = axis.slope;
    }

    let split = options.layer_split;
    if unique_layers(&event.hit_layers, |l| l >= split) >= options.min_double_layers {
        (result.top_x, result.bottom_x) = split_lines(&event.x_layers, options)?;
    }

    if unique_layers(&event.hit_layers, |l| l < split) >= options.min_double_layers {
        (result.top_y, result.bottom_y) = split_lines(&event.y_layers, options)?;
    }

    Ok(result)
}
