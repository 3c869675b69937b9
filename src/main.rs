//! Runs the configured intervention modes and writes one raw and one summary CSV per mode.
//!
//! Usage: `hiv-netsim [--config FILE] [--mode NAME]... [--prep P]... [--replicates N] [--steps N]`

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use hiv_netsim::{
    logging::{enable_logging, parse_level},
    run_all,
    runner::write_outputs,
    SimError, SimulationConfig, SimulationInputs, MODE_NAMES,
};

#[derive(Parser, Debug)]
#[command(name = "hiv-netsim")]
#[command(about = "Simulate HIV transmission over a contact network under intervention modes")]
struct Args {
    /// JSON configuration file; built-in defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mode to run (repeatable); replaces the configured list
    #[arg(long = "mode")]
    modes: Vec<String>,

    /// PrEP coverage to sweep (repeatable); replaces the configured list
    #[arg(long = "prep")]
    prep_values: Vec<f64>,

    /// Replicates per mode
    #[arg(long)]
    replicates: Option<usize>,

    /// Steps per replicate
    #[arg(long)]
    steps: Option<usize>,

    /// Base seed; replicate r uses seed + r
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for CSV output
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// List available modes and exit
    #[arg(long)]
    list_modes: bool,
}

impl Args {
    fn load_config(&self) -> Result<SimulationConfig, SimError> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_json_file(path)?,
            None => SimulationConfig::default(),
        };
        if !self.modes.is_empty() {
            config.modes.clone_from(&self.modes);
        }
        if !self.prep_values.is_empty() {
            config.prep_values.clone_from(&self.prep_values);
        }
        if let Some(replicates) = self.replicates {
            config.replicates_per_mode = replicates;
        }
        if let Some(steps) = self.steps {
            config.steps_per_run = steps;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir.clone_from(output_dir);
        }
        config.validate()?;
        Ok(config)
    }
}

fn run(args: &Args) -> Result<(), SimError> {
    enable_logging(parse_level(&args.log_level)?)?;

    if args.list_modes {
        for mode in MODE_NAMES {
            println!("{mode}");
        }
        return Ok(());
    }

    let config = args.load_config()?;
    let inputs = SimulationInputs::from_config(config)?;
    let runs = run_all(&inputs)?;

    let config = inputs.config();
    let written = write_outputs(
        &config.output_dir,
        &runs,
        config.steps_per_run,
        inputs.network().population(),
    )?;
    info!("wrote {} files to {}", written.len(), config.output_dir.display());
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("hiv-netsim: {err}");
            ExitCode::FAILURE
        }
    }
}
