// validate_config_main.rs
use clap::{Parser, ValueEnum};
use microsim_config::config_files::{
    CentroidConfiguration, Detectors, FlowRealDataSet, MasterControlPlan, OdMatrices,
    SectionSpeedLimitsAndCapacities, StaticMacroScenarios, TrafficDemands, TrafficManagementStrategy,
};
use microsim_config::models::Scenario;
use microsim_config::{ConfigFile, ConfigError, ConfigResult};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    CentroidConfiguration,
    OdMatrices,
    SectionSpeedLimits,
    Detectors,
    FlowRealDataSet,
    MasterControlPlan,
    TrafficManagementStrategy,
    TrafficDemands,
    Scenario,
    StaticMacroScenarios,
}

#[derive(Parser, Debug)]
#[command(name = "validate_config")]
#[command(about = "Import a configuration file, check it and print a summary")]
struct Cli {
    /// Kind of aggregate stored in the file
    #[arg(long, value_enum)]
    kind: Kind,

    /// Path to the configuration file
    #[arg(long)]
    path: PathBuf,

    /// Also write the real data set CSV into this directory
    #[arg(long)]
    csv_dir: Option<PathBuf>,
}

fn summarize<T: ConfigFile + Display>(path: &Path) -> ConfigResult<()> {
    let record = T::import_from_file(path)?;
    println!("{record}");
    Ok(())
}

fn run(cli: &Cli) -> ConfigResult<()> {
    match cli.kind {
        Kind::CentroidConfiguration => summarize::<CentroidConfiguration>(&cli.path),
        Kind::OdMatrices => summarize::<OdMatrices>(&cli.path),
        Kind::SectionSpeedLimits => summarize::<SectionSpeedLimitsAndCapacities>(&cli.path),
        Kind::Detectors => summarize::<Detectors>(&cli.path),
        Kind::MasterControlPlan => summarize::<MasterControlPlan>(&cli.path),
        Kind::TrafficManagementStrategy => summarize::<TrafficManagementStrategy>(&cli.path),
        Kind::TrafficDemands => summarize::<TrafficDemands>(&cli.path),
        Kind::Scenario => summarize::<Scenario>(&cli.path),
        Kind::StaticMacroScenarios => summarize::<StaticMacroScenarios>(&cli.path),
        Kind::FlowRealDataSet => {
            let mut data_set = FlowRealDataSet::import_from_file(&cli.path)?;
            if let Some(directory) = &cli.csv_dir {
                let filename = cli
                    .path
                    .file_stem()
                    .map(|stem| format!("{}.csv", stem.to_string_lossy()))
                    .ok_or_else(|| ConfigError::FileNotFound(cli.path.clone()))?;
                let csv = data_set.export_to_real_data_set_csv(directory, &filename)?;
                println!("Wrote {}", csv.display());
            }
            println!("{data_set}");
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} is not a valid {:?} file: {}", cli.path.display(), cli.kind, e);
            ExitCode::FAILURE
        }
    }
}
