// sample_config_main.rs
use clap::Parser;
use log::info;
use microsim_config::samples::{
    sample_centroid_configuration, sample_flow_detectors, sample_flow_real_data_set, sample_od_matrices,
    sample_scenario, sample_section_speed_limits, sample_static_macro_scenarios, sample_traffic_demands,
};
use microsim_config::{ConfigFile, ConfigResult, Settings};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "sample_config")]
#[command(about = "Write a consistent set of randomized configuration files")]
struct Cli {
    /// Directory the files are written into
    #[arg(long, default_value = "sample_configs")]
    output_dir: PathBuf,

    /// Seed of the random generator
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of centroids, sections and detectors
    #[arg(long, default_value_t = 8)]
    size: usize,

    /// Optional TOML settings file
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn run(cli: &Cli) -> ConfigResult<()> {
    let settings = Settings::load(cli.settings.as_deref())?;
    fs::create_dir_all(&cli.output_dir)?;
    let mut rng = StdRng::seed_from_u64(cli.seed);
    let out = |name: &str| cli.output_dir.join(name);

    let configuration = sample_centroid_configuration(&mut rng, cli.size);
    configuration.export_to_file(out("centroid_configuration.pkl"))?;
    sample_od_matrices(&mut rng, &configuration, &settings, cli.size * 2).export_to_file(out("od_matrices.pkl"))?;
    sample_traffic_demands(&settings).export_to_file(out("traffic_demands.pkl"))?;
    sample_section_speed_limits(&mut rng, cli.size).export_to_file(out("section_speed_limits.pkl"))?;

    let detectors = sample_flow_detectors(cli.size);
    detectors.export_to_file(out("detectors.pkl"))?;
    let mut real_data = sample_flow_real_data_set(&mut rng, &detectors, &settings);
    real_data.export_to_real_data_set_csv(&cli.output_dir, "real_data_set.csv")?;
    real_data.export_to_file(out("flow_real_data_set.pkl"))?;

    sample_scenario(&settings).export_to_file(out("scenario.pkl"))?;
    sample_static_macro_scenarios(&settings).export_to_file(out("static_macro_scenarios.pkl"))?;

    info!("Sample configuration written to {}", cli.output_dir.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Could not write sample configuration: {}", e);
            ExitCode::FAILURE
        }
    }
}
