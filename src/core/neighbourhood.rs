use crate::domain::model::Grid;
use crate::utils::error::{LabError, Result};
use serde::Deserialize;
use std::io::{Read, Write};

/// 邊列表建立的方陣最多格數 (約 512 MB 的 f64)
pub const MAX_GRID_CELLS: usize = 1 << 26;

/// N, S, W, E, NW, NE, SW, SE
pub const DIRECTIONS: [(isize, isize); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// 回傳落在 `[0, borders)` 範圍內的相鄰座標，順序依 `DIRECTIONS`
pub fn neighbourhood(
    coord: (usize, usize),
    borders: (usize, usize),
) -> impl Iterator<Item = (usize, usize)> {
    DIRECTIONS.iter().filter_map(move |&(dr, dc)| {
        let row = coord.0.checked_add_signed(dr)?;
        let col = coord.1.checked_add_signed(dc)?;
        (row < borders.0 && col < borders.1).then_some((row, col))
    })
}

/// 對每個格子與每個有效鄰居比較權重，中心權重 >= 鄰居時記錄一次該格子。
/// 同一格子可能出現多次，總數即為符合條件的比較次數。
pub fn dominant_edges(grid: &Grid) -> Vec<(usize, usize)> {
    let borders = grid.borders();
    let mut edges = Vec::new();

    for ((u, v), weight) in grid.cells() {
        for (i, j) in neighbourhood((u, v), borders) {
            if let Some(neighbour) = grid.get(i, j) {
                if weight >= neighbour {
                    edges.push((u, v));
                }
            }
        }
    }

    edges
}

pub fn write_edges<W: Write>(mut writer: W, edges: &[(usize, usize)]) -> Result<()> {
    for (u, v) in edges {
        writeln!(writer, "({}, {})", u, v)?;
    }
    writer.flush()?;
    Ok(())
}

impl Grid {
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);

        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
            return Err(LabError::InvalidGrid {
                reason: format!(
                    "row {} has {} columns, expected {}",
                    idx,
                    row.len(),
                    n_cols
                ),
            });
        }

        Ok(Grid::from_parts(
            n_rows,
            n_cols,
            rows.into_iter().flatten().collect(),
        ))
    }

    /// 無標題列的稠密矩陣，空白或 NaN 的格子以 `fill` 取代
    pub fn from_dense_csv<R: Read>(reader: R, fill: f64) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (row_idx, record) in csv_reader.records().enumerate() {
            let record = record?;
            let row = record
                .iter()
                .enumerate()
                .map(|(col_idx, cell)| parse_cell(cell, fill, row_idx, col_idx))
                .collect::<Result<Vec<f64>>>()?;
            rows.push(row);
        }

        tracing::debug!("Loaded dense grid with {} rows", rows.len());
        Self::from_rows(rows)
    }

    /// `u,v,weight` 邊列表，矩陣大小為最大索引 + 1，缺少的邊以 `fill` 補上
    pub fn from_edge_list_csv<R: Read>(reader: R, fill: f64) -> Result<Self> {
        #[derive(Deserialize)]
        struct EdgeRow {
            u: usize,
            v: usize,
            weight: Option<f64>,
        }

        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let edges = csv_reader
            .deserialize::<EdgeRow>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let n = match edges.iter().map(|e| e.u.max(e.v)).max() {
            Some(max_index) => max_index.checked_add(1).ok_or_else(|| LabError::InvalidGrid {
                reason: format!("node index {} is out of range", max_index),
            })?,
            None => 0,
        };
        let cells = n
            .checked_mul(n)
            .filter(|&cells| cells <= MAX_GRID_CELLS)
            .ok_or_else(|| LabError::InvalidGrid {
                reason: format!(
                    "{}x{} grid exceeds the limit of {} cells",
                    n, n, MAX_GRID_CELLS
                ),
            })?;
        let mut weights = vec![fill; cells];
        for edge in &edges {
            weights[edge.u * n + edge.v] = edge.weight.filter(|w| !w.is_nan()).unwrap_or(fill);
        }

        tracing::debug!("Loaded {} edges into a {}x{} grid", edges.len(), n, n);
        Ok(Grid::from_parts(n, n, weights))
    }
}

fn parse_cell(cell: &str, fill: f64, row: usize, col: usize) -> Result<f64> {
    if cell.is_empty() {
        return Ok(fill);
    }
    match cell.parse::<f64>() {
        Ok(value) if value.is_nan() => Ok(fill),
        Ok(value) => Ok(value),
        Err(_) => Err(LabError::InvalidGrid {
            reason: format!("cell ({}, {}) is not a number: '{}'", row, col, cell),
        }),
    }
}
