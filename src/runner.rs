/*!

Runs every configured mode: each mode's replicates run in parallel, are collected in replicate
order, and are summarized. Output files are written after all replicates of a mode finish.

*/

use crate::{
    config::{NetworkSource, SimulationConfig},
    epidemic::{EpidemicParameters, ModeSetup, Replicate},
    error::SimError,
    intervention::Intervention,
    network::{generate_network, load_network, ContactNetwork},
    parameters::ParameterTable,
    report::{write_raw_csv, write_summary_csv, ModeSummary, TimeSeriesRecord},
    survival::SurvivalCurve,
};
use log::{info, warn};
use rayon::prelude::*;
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
    time::Instant,
};

/// Everything shared by all replicates of all modes.
pub struct SimulationInputs {
    config: SimulationConfig,
    table: ParameterTable,
    survival: SurvivalCurve,
    network: ContactNetwork,
    pool: Option<rayon::ThreadPool>,
}

impl SimulationInputs {
    /// Validates the configuration and builds the table, the survival curve, and the network.
    pub fn from_config(config: SimulationConfig) -> Result<Self, SimError> {
        config.validate()?;
        let table = config.parameter_table()?;
        let survival = config.survival.curve()?;
        let network = match &config.network {
            NetworkSource::Synthetic(spec) => generate_network(spec, &table)?,
            NetworkSource::Files { nodes, edges } => load_network(nodes, edges, &table)?,
        };
        Self::new(config, table, survival, network)
    }

    pub fn new(
        config: SimulationConfig,
        table: ParameterTable,
        survival: SurvivalCurve,
        network: ContactNetwork,
    ) -> Result<Self, SimError> {
        config.validate()?;
        let pool = match config.threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|error| {
                        SimError::config(format!("cannot start {threads} threads: {error}"))
                    })?,
            ),
            None => None,
        };
        info!(
            "survival curve S(t) = {:.2} * exp(-{:.4} t); {} people, {} partnerships",
            survival.c(),
            survival.k(),
            network.population(),
            network.edge_count()
        );
        Ok(SimulationInputs {
            config,
            table,
            survival,
            network,
            pool,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub fn network(&self) -> &ContactNetwork {
        &self.network
    }

    #[must_use]
    pub fn table(&self) -> &ParameterTable {
        &self.table
    }

    #[must_use]
    pub fn survival(&self) -> &SurvivalCurve {
        &self.survival
    }

    fn mode_setup(&self, mode: &str, prep_coverage: f64) -> Result<ModeSetup, SimError> {
        let settings = self.config.intervention.with_prep_coverage(prep_coverage);
        let intervention = Intervention::from_name(mode, &settings)?;
        ModeSetup::new(
            intervention,
            &self.table,
            self.survival,
            EpidemicParameters::from_config(&self.config),
        )
    }
}

/// All replicates of one mode at one PrEP coverage.
#[derive(Clone, Debug, PartialEq)]
pub struct ModeRun {
    pub mode: String,
    pub prep_coverage: f64,
    /// Indexed by replicate.
    pub records: Vec<TimeSeriesRecord>,
    pub summary: ModeSummary,
}

/// Runs every replicate of `mode` at the configured `intervention.prep_coverage`.
pub fn run_mode(inputs: &SimulationInputs, mode: &str) -> Result<ModeRun, SimError> {
    run_mode_at(inputs, mode, inputs.config.intervention.prep_coverage)
}

/// Runs every replicate of `mode` with PrEP offered at `prep_coverage`. Replicate `r` is seeded
/// with `seed + r`.
pub fn run_mode_at(
    inputs: &SimulationInputs,
    mode: &str,
    prep_coverage: f64,
) -> Result<ModeRun, SimError> {
    let setup = inputs.mode_setup(mode, prep_coverage)?;
    let replicates = inputs.config.replicates_per_mode;
    let base_seed = inputs.config.seed;
    let network = &inputs.network;

    info!(
        "running mode {mode} (PrEP coverage {}): {replicates} replicates of {} steps",
        setup.intervention().prep_coverage(),
        inputs.config.steps_per_run
    );
    let start = Instant::now();

    let run_replicates = || {
        (0..replicates)
            .into_par_iter()
            .map(|replicate| {
                let seed = base_seed.wrapping_add(replicate as u64);
                Replicate::new(network, &setup, replicate, seed).map(Replicate::run)
            })
            .collect::<Result<Vec<_>, _>>()
    };
    let records = match &inputs.pool {
        Some(pool) => pool.install(run_replicates),
        None => run_replicates(),
    }?;

    let summary = ModeSummary::from_records(mode, &records);
    if let Some(last) = summary.steps.last() {
        info!(
            "mode {mode} finished in {:.2?}; mean counts at step {}: {:?}",
            start.elapsed(),
            last.step,
            last.mean
        );
    }

    Ok(ModeRun {
        mode: mode.to_string(),
        prep_coverage: setup.intervention().prep_coverage(),
        records,
        summary,
    })
}

/// Every (mode, PrEP coverage) pair to run, modes outermost. `baseline` never offers PrEP, so it
/// runs once whatever the sweep.
fn sweep(config: &SimulationConfig) -> Vec<(&str, f64)> {
    let levels = config.prep_levels();
    let mut pairs = Vec::with_capacity(config.modes.len() * levels.len());
    for mode in &config.modes {
        if mode == "baseline" {
            pairs.push((mode.as_str(), 0.0));
        } else {
            pairs.extend(levels.iter().map(|prep| (mode.as_str(), *prep)));
        }
    }
    pairs
}

/// Runs every configured mode at every configured PrEP coverage. All mode names are resolved
/// before anything runs.
pub fn run_all(inputs: &SimulationInputs) -> Result<Vec<ModeRun>, SimError> {
    let pairs = sweep(&inputs.config);
    for (mode, prep_coverage) in &pairs {
        inputs.mode_setup(mode, *prep_coverage)?;
    }
    pairs
        .into_iter()
        .map(|(mode, prep_coverage)| run_mode_at(inputs, mode, prep_coverage))
        .collect()
}

/// `{mode}_prep{pct}_steps{n}_nodes{n}_iters{r}`
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn file_stem(run: &ModeRun, steps: usize, nodes: usize) -> String {
    format!(
        "{}_prep{}_steps{steps}_nodes{nodes}_iters{}",
        run.mode,
        (run.prep_coverage * 100.0).round() as u32,
        run.records.len()
    )
}

/// Writes `<stem>_raw.csv` and `<stem>_summary.csv` for each run into `output_dir`, creating it
/// if needed. Returns the paths written.
pub fn write_outputs(
    output_dir: &Path,
    runs: &[ModeRun],
    steps: usize,
    nodes: usize,
) -> Result<Vec<PathBuf>, SimError> {
    fs::create_dir_all(output_dir)?;
    let mut written = Vec::with_capacity(runs.len() * 2);
    for run in runs {
        let stem = file_stem(run, steps, nodes);

        let raw_path = output_dir.join(format!("{stem}_raw.csv"));
        if raw_path.exists() {
            warn!("overwriting {}", raw_path.display());
        }
        let raw_file = BufWriter::new(File::create(&raw_path)?);
        write_raw_csv(raw_file, &run.mode, run.prep_coverage, &run.records)?;

        let summary_path = output_dir.join(format!("{stem}_summary.csv"));
        write_summary_csv(BufWriter::new(File::create(&summary_path)?), &run.summary)?;

        info!("wrote {} and {}", raw_path.display(), summary_path.display());
        written.push(raw_path);
        written.push(summary_path);
    }
    Ok(written)
}
