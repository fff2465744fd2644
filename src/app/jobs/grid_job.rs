use crate::app::jobs::output_file;
use crate::config::toml_config::GridConfig;
use crate::core::neighbourhood::{dominant_edges, write_edges};
use crate::core::{Grid, Job, Storage};
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;

pub const EDGES_FILE: &str = "dominant_edges.txt";

pub struct GridScanJob<S: Storage> {
    storage: S,
    config: GridConfig,
    output_path: String,
}

impl<S: Storage> GridScanJob<S> {
    pub fn new(storage: S, config: GridConfig, output_path: impl Into<String>) -> Self {
        Self {
            storage,
            config,
            output_path: output_path.into(),
        }
    }
}

impl<S: Storage> Job for GridScanJob<S> {
    type Input = Grid;
    type Output = Vec<(usize, usize)>;

    fn name(&self) -> &str {
        "neighbours"
    }

    fn extract(&self) -> Result<Grid> {
        let input = validate_required_field("grid.input", &self.config.input)?;
        let data = self.storage.read_file(input)?;

        let grid = match self.config.format.as_str() {
            "edges" => Grid::from_edge_list_csv(data.as_slice(), self.config.fill_value)?,
            _ => Grid::from_dense_csv(data.as_slice(), self.config.fill_value)?,
        };
        tracing::info!("🗺️ Loaded {}x{} grid from {}", grid.rows(), grid.cols(), input);
        Ok(grid)
    }

    fn transform(&self, grid: Grid) -> Result<Vec<(usize, usize)>> {
        let edges = dominant_edges(&grid);
        tracing::info!(
            "Found {} edges in the input Graph satisfying the condition.",
            edges.len()
        );
        Ok(edges)
    }

    fn load(&self, edges: Vec<(usize, usize)>) -> Result<String> {
        let path = match &self.config.log_file {
            Some(path) => path.clone(),
            None => output_file(&self.output_path, EDGES_FILE),
        };

        let mut data = Vec::new();
        write_edges(&mut data, &edges)?;
        self.storage.write_file(&path, &data)?;
        Ok(path)
    }
}
