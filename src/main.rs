use clap::Parser;
use lab_kit::config::Command;
use lab_kit::core::Job;
use lab_kit::utils::error::ErrorSeverity;
use lab_kit::utils::{logger, validation::Validate};
use lab_kit::{
    CliConfig, GridScanJob, JobRunner, LabConfig, LabError, LocalStorage, RegressionJob,
    ReportJob, TrackFitJob, VaccinationJob,
};

fn run_job<J: Job>(job: J, monitor_enabled: bool) -> lab_kit::Result<String> {
    JobRunner::new_with_monitoring(job, monitor_enabled).run()
}

fn dispatch(cli: &CliConfig, config: LabConfig, monitor_enabled: bool) -> lab_kit::Result<String> {
    let storage = LocalStorage::default();
    let output_path = config.output.path.clone();

    match &cli.command {
        Command::Vaccinate(_) => run_job(
            VaccinationJob::new(storage, config.vaccine, output_path),
            monitor_enabled,
        ),
        Command::Neighbours(_) => run_job(
            GridScanJob::new(storage, config.grid, output_path),
            monitor_enabled,
        ),
        Command::Regress(_) => run_job(
            RegressionJob::new(storage, config.regression, output_path),
            monitor_enabled,
        ),
        Command::Tracks(_) => run_job(
            TrackFitJob::new(storage, config.tracks, output_path),
            monitor_enabled,
        ),
        Command::Report(_) => run_job(
            ReportJob::new(storage, config.report, output_path),
            monitor_enabled,
        ),
    }
}

fn exit_with(e: &LabError) -> ! {
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入配置；日誌格式可能由配置決定，錯誤先直接輸出
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "❌ Failed to load config file '{}': {}",
                cli.config.as_deref().unwrap_or("<defaults>"),
                e
            );
            exit_with(&e);
        }
    };

    if cli.json_logs || config.json_logs() {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting lab-kit {}", cli.command.name());
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        exit_with(&e);
    }

    let monitor_enabled = cli.monitor_enabled(&config);
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    match dispatch(&cli, config, monitor_enabled) {
        Ok(output_path) => {
            println!("✅ {} completed successfully!", cli.command.name());
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
                cli.command.name(),
                e,
                e.category(),
                e.severity()
            );
            exit_with(&e);
        }
    }

    Ok(())
}
