pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use self::args::{
    CliConfig, Command, NeighboursArgs, RegressArgs, ReportArgs, TracksArgs, VaccinateArgs,
};

#[cfg(feature = "cli")]
mod args {
    use super::toml_config::LabConfig;
    use crate::utils::error::Result;
    use chrono::NaiveDate;
    use clap::{Args, Parser, Subcommand};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "lab-kit")]
    #[command(about = "Dose allocation, grid scans, regression, track fits and reports")]
    pub struct CliConfig {
        /// Path to a TOML configuration file
        #[arg(short, long, global = true)]
        pub config: Option<String>,

        /// Output directory (overrides output.path)
        #[arg(short, long, global = true)]
        pub output: Option<String>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        /// Log CPU and memory usage after each phase
        #[arg(long, global = true)]
        pub monitor: bool,

        /// Emit logs as JSON lines
        #[arg(long, global = true)]
        pub json_logs: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Allocate vaccine doses over a population and count brands
        Vaccinate(VaccinateArgs),
        /// List grid cells whose weight is greater or equal to their neighbours
        Neighbours(NeighboursArgs),
        /// Fit a linear regression by batch gradient descent
        Regress(RegressArgs),
        /// Fit lines to particle-track hits
        Tracks(TracksArgs),
        /// Run counter and summary analyses over a column of integers
        Report(ReportArgs),
    }

    impl Command {
        pub fn name(&self) -> &'static str {
            match self {
                Command::Vaccinate(_) => "vaccinate",
                Command::Neighbours(_) => "neighbours",
                Command::Regress(_) => "regress",
                Command::Tracks(_) => "tracks",
                Command::Report(_) => "report",
            }
        }
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct VaccinateArgs {
        #[arg(long)]
        pub doses: Option<u32>,
        #[arg(long)]
        pub threshold_age: Option<u32>,
        /// Population CSV; a random population is generated when omitted
        #[arg(long)]
        pub population: Option<String>,
        /// Vaccine center CSV (location,date,vaccine_name)
        #[arg(long)]
        pub centers: Option<String>,
        #[arg(long)]
        pub size: Option<usize>,
        #[arg(long)]
        pub seed: Option<u64>,
        #[arg(long)]
        pub location: Option<String>,
        #[arg(long)]
        pub date: Option<NaiveDate>,
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct NeighboursArgs {
        /// Grid file containing the weights to check
        #[arg(short, long)]
        pub input: Option<String>,
        /// Read the input as a u,v,weight edge list
        #[arg(long)]
        pub edges: bool,
        /// Value used for empty cells
        #[arg(long)]
        pub fill: Option<f64>,
        /// Write the edge list here instead of the output directory
        #[arg(long)]
        pub log_file: Option<String>,
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct RegressArgs {
        /// CSV with a header row; the last column is the target
        #[arg(short, long)]
        pub data: Option<String>,
        #[arg(long)]
        pub alpha: Option<f64>,
        #[arg(long)]
        pub steps: Option<usize>,
        #[arg(long)]
        pub seed: Option<u64>,
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct TracksArgs {
        /// JSON array of track events
        #[arg(short, long)]
        pub input: Option<String>,
        #[arg(long)]
        pub vertical: bool,
        #[arg(long)]
        pub slope_threshold: Option<f64>,
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct ReportArgs {
        /// CSV holding the integer values to analyse
        #[arg(short, long)]
        pub input: Option<String>,
        #[arg(long)]
        pub column: Option<String>,
        #[arg(long)]
        pub name: Option<String>,
        /// Also print analyses that did not complete
        #[arg(long)]
        pub all: bool,
    }

    impl CliConfig {
        /// 載入 TOML (若有) 並套用命令列覆蓋設定
        pub fn resolve(&self) -> Result<LabConfig> {
            let mut config = match &self.config {
                Some(path) => LabConfig::from_file(path)?,
                None => LabConfig::default(),
            };
            self.apply_overrides(&mut config);
            Ok(config)
        }

        pub fn apply_overrides(&self, config: &mut LabConfig) {
            if let Some(output) = &self.output {
                config.output.path = output.clone();
            }

            match &self.command {
                Command::Vaccinate(args) => {
                    let vaccine = &mut config.vaccine;
                    override_with(&mut vaccine.doses, args.doses);
                    override_with(&mut vaccine.threshold_age, args.threshold_age);
                    override_with(&mut vaccine.population_size, args.size);
                    override_with(&mut vaccine.location, args.location.clone());
                    override_with(&mut vaccine.date, args.date);
                    if args.seed.is_some() {
                        vaccine.seed = args.seed;
                    }
                    if args.population.is_some() {
                        vaccine.population_file = args.population.clone();
                    }
                    if args.centers.is_some() {
                        vaccine.centers_file = args.centers.clone();
                    }
                }
                Command::Neighbours(args) => {
                    let grid = &mut config.grid;
                    if args.input.is_some() {
                        grid.input = args.input.clone();
                    }
                    if args.edges {
                        grid.format = "edges".to_string();
                    }
                    override_with(&mut grid.fill_value, args.fill);
                    if args.log_file.is_some() {
                        grid.log_file = args.log_file.clone();
                    }
                }
                Command::Regress(args) => {
                    let regression = &mut config.regression;
                    if args.data.is_some() {
                        regression.dataset = args.data.clone();
                    }
                    override_with(&mut regression.alpha, args.alpha);
                    override_with(&mut regression.steps, args.steps);
                    if args.seed.is_some() {
                        regression.seed = args.seed;
                    }
                }
                Command::Tracks(args) => {
                    let tracks = &mut config.tracks;
                    if args.input.is_some() {
                        tracks.input = args.input.clone();
                    }
                    if args.vertical {
                        tracks.vertical = true;
                    }
                    override_with(&mut tracks.slope_threshold, args.slope_threshold);
                }
                Command::Report(args) => {
                    let report = &mut config.report;
                    if args.input.is_some() {
                        report.input = args.input.clone();
                    }
                    if args.column.is_some() {
                        report.column = args.column.clone();
                    }
                    override_with(&mut report.name, args.name.clone());
                    if args.all {
                        report.include_incomplete = true;
                    }
                }
            }
        }

        pub fn monitor_enabled(&self, config: &LabConfig) -> bool {
            self.monitor || config.monitoring_enabled()
        }
    }

    fn override_with<T>(target: &mut T, value: Option<T>) {
        if let Some(value) = value {
            *target = value;
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_vaccinate_overrides() {
            let cli = CliConfig::parse_from([
                "lab-kit",
                "--output",
                "/tmp/out",
                "vaccinate",
                "--doses",
                "5",
                "--threshold-age",
                "60",
                "--date",
                "2021-05-01",
            ]);
            let config = cli.resolve().unwrap();

            assert_eq!(config.output.path, "/tmp/out");
            assert_eq!(config.vaccine.doses, 5);
            assert_eq!(config.vaccine.threshold_age, 60);
            assert_eq!(
                config.vaccine.date,
                NaiveDate::from_ymd_opt(2021, 5, 1).unwrap()
            );
            assert_eq!(cli.command.name(), "vaccinate");
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli = CliConfig::parse_from([
                "lab-kit",
                "neighbours",
                "-i",
                "grid.csv",
                "--edges",
                "--verbose",
            ]);
            assert!(cli.verbose);

            let config = cli.resolve().unwrap();
            assert_eq!(config.grid.input.as_deref(), Some("grid.csv"));
            assert_eq!(config.grid.format, "edges");
        }

        #[test]
        fn test_overrides_leave_other_sections_alone() {
            let cli = CliConfig::parse_from(["lab-kit", "regress", "--alpha", "0.1"]);
            let config = cli.resolve().unwrap();
            assert_eq!(config.regression.alpha, 0.1);
            assert_eq!(config.vaccine.doses, 120);
            assert!(!cli.monitor_enabled(&config));
        }
    }
}
