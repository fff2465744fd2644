pub mod grid_job;
pub mod regression_job;
pub mod report_job;
pub mod track_job;
pub mod vaccination_job;

pub use grid_job::GridScanJob;
pub use regression_job::RegressionJob;
pub use report_job::ReportJob;
pub use track_job::TrackFitJob;
pub use vaccination_job::VaccinationJob;

use std::path::Path;

/// 輸出目錄下的檔案路徑
pub(crate) fn output_file(output_path: &str, file_name: &str) -> String {
    Path::new(output_path)
        .join(file_name)
        .to_string_lossy()
        .into_owned()
}
