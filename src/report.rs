/*!

Per-step population counts: the recorder that fills them in during a replicate, the cross-replicate
summary, and CSV output for external plotting.

*/

use crate::{
    context::{Context, DataPlugin},
    error::SimError,
    people::{ContextPeopleExt, DiseaseState},
    property::Property,
};
use serde::{Deserialize, Serialize};
use std::{io::Write, ops::Index};

/// Number of people in each disease state at one instant.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateCounts([usize; DiseaseState::COUNT]);

impl StateCounts {
    pub fn from_states(states: &[DiseaseState]) -> Self {
        let mut counts = StateCounts::default();
        for state in states {
            counts.0[state.index()] += 1;
        }
        counts
    }

    #[must_use]
    #[inline]
    pub fn get(&self, state: DiseaseState) -> usize {
        self.0[state.index()]
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Everyone who has left the susceptible state, dead or alive.
    #[must_use]
    pub fn ever_infected(&self) -> usize {
        self.total() - self.get(DiseaseState::Susceptible)
    }

    #[must_use]
    pub fn infected_alive(&self) -> usize {
        self.get(DiseaseState::InfectedUndiagnosed)
            + self.get(DiseaseState::DiagnosedNoArt)
            + self.get(DiseaseState::DiagnosedArt)
    }
}

impl Index<DiseaseState> for StateCounts {
    type Output = usize;

    fn index(&self, state: DiseaseState) -> &usize {
        &self.0[state.index()]
    }
}

/// The counts of one replicate: the seeded population plus one entry per completed step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    pub replicate: usize,
    pub seed: u64,
    pub initial: StateCounts,
    pub steps: Vec<StateCounts>,
}

impl TimeSeriesRecord {
    /// Number of completed steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Counts at `step`, where step 0 is the initial population and step `n` follows the n-th
    /// update.
    #[must_use]
    pub fn counts_at(&self, step: usize) -> Option<&StateCounts> {
        if step == 0 {
            Some(&self.initial)
        } else {
            self.steps.get(step - 1)
        }
    }

    /// Cumulative number ever infected after each step.
    #[must_use]
    pub fn ever_infected(&self) -> Vec<usize> {
        self.steps.iter().map(StateCounts::ever_infected).collect()
    }
}

#[derive(Default)]
struct Recorder {
    initial: StateCounts,
    steps: Vec<StateCounts>,
}

impl DataPlugin for Recorder {
    const new: &'static dyn Fn() -> Self = &Recorder::default;
}

/// Recording hooks for the epidemic engine.
pub trait ContextRecorderExt {
    /// Stores the counts of the seeded population and clears any previous steps.
    fn record_initial_counts(&mut self);
    /// Appends the current counts as the next step.
    fn record_step_counts(&mut self);
    fn recorded_steps(&self) -> usize;
    /// Moves the recorded counts out into a finished record.
    fn take_record(&mut self, replicate: usize, seed: u64) -> TimeSeriesRecord;
}

impl ContextRecorderExt for Context {
    fn record_initial_counts(&mut self) {
        let counts = self.count_by_state();
        let recorder = self.get_data_container_mut::<Recorder>();
        recorder.initial = counts;
        recorder.steps.clear();
    }

    fn record_step_counts(&mut self) {
        let counts = self.count_by_state();
        self.get_data_container_mut::<Recorder>().steps.push(counts);
    }

    fn recorded_steps(&self) -> usize {
        self.get_data_container::<Recorder>()
            .map_or(0, |recorder| recorder.steps.len())
    }

    fn take_record(&mut self, replicate: usize, seed: u64) -> TimeSeriesRecord {
        let recorder = self.get_data_container_mut::<Recorder>();
        TimeSeriesRecord {
            replicate,
            seed,
            initial: recorder.initial,
            steps: std::mem::take(&mut recorder.steps),
        }
    }
}

/// Per-state statistics across replicates at one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepSummary {
    pub step: usize,
    pub mean: [f64; DiseaseState::COUNT],
    /// Sample variance; zero with a single replicate.
    pub variance: [f64; DiseaseState::COUNT],
    pub median: [f64; DiseaseState::COUNT],
    pub q1: [f64; DiseaseState::COUNT],
    pub q3: [f64; DiseaseState::COUNT],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModeSummary {
    pub mode: String,
    pub replicates: usize,
    /// Step 0 (the seeded population) through the last step.
    pub steps: Vec<StepSummary>,
}

/// Linear-interpolation quantile of sorted data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            #[allow(clippy::cast_precision_loss)]
            let position = q * (n - 1) as f64;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let lower = position.floor() as usize;
            let upper = (lower + 1).min(n - 1);
            let fraction = position - position.floor();
            sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
        }
    }
}

impl ModeSummary {
    #[allow(clippy::cast_precision_loss)]
    pub fn from_records(mode: &str, records: &[TimeSeriesRecord]) -> Self {
        let Some(step_count) = records.iter().map(TimeSeriesRecord::len).min() else {
            return ModeSummary {
                mode: mode.to_string(),
                replicates: 0,
                steps: Vec::new(),
            };
        };
        let n = records.len() as f64;

        let steps = (0..=step_count)
            .map(|step| {
                let mut summary = StepSummary {
                    step,
                    mean: [0.0; DiseaseState::COUNT],
                    variance: [0.0; DiseaseState::COUNT],
                    median: [0.0; DiseaseState::COUNT],
                    q1: [0.0; DiseaseState::COUNT],
                    q3: [0.0; DiseaseState::COUNT],
                };
                for state in DiseaseState::VALUES {
                    let i = state.index();
                    let mut values: Vec<f64> = records
                        .iter()
                        .filter_map(|record| record.counts_at(step))
                        .map(|counts| counts.get(*state) as f64)
                        .collect();
                    let mean = values.iter().sum::<f64>() / n;
                    summary.mean[i] = mean;
                    summary.variance[i] = if values.len() > 1 {
                        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
                    } else {
                        0.0
                    };
                    values.sort_by(f64::total_cmp);
                    summary.median[i] = quantile(&values, 0.5);
                    summary.q1[i] = quantile(&values, 0.25);
                    summary.q3[i] = quantile(&values, 0.75);
                }
                summary
            })
            .collect();

        ModeSummary {
            mode: mode.to_string(),
            replicates: records.len(),
            steps,
        }
    }
}

/// Writes one row per step with every replicate's counts side by side:
/// `step,mode,prep_coverage,susceptible_1,...,dead_1,susceptible_2,...`.
pub fn write_raw_csv<W: Write>(
    writer: W,
    mode: &str,
    prep_coverage: f64,
    records: &[TimeSeriesRecord],
) -> Result<(), SimError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec!["step".to_string(), "mode".to_string(), "prep_coverage".to_string()];
    for replicate in 1..=records.len() {
        for state in DiseaseState::VALUES {
            header.push(format!("{}_{replicate}", state.label()));
        }
    }
    csv_writer.write_record(&header)?;

    let step_count = records.iter().map(TimeSeriesRecord::len).max().unwrap_or(0);
    for step in 0..=step_count {
        let mut row = vec![step.to_string(), mode.to_string(), prep_coverage.to_string()];
        for record in records {
            let counts = record.counts_at(step).copied().unwrap_or_default();
            for state in DiseaseState::VALUES {
                row.push(counts.get(*state).to_string());
            }
        }
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes one row per (step, state): `step,state,mean,variance,median,q1,q3`.
pub fn write_summary_csv<W: Write>(writer: W, summary: &ModeSummary) -> Result<(), SimError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["step", "state", "mean", "variance", "median", "q1", "q3"])?;
    for step in &summary.steps {
        for state in DiseaseState::VALUES {
            let i = state.index();
            csv_writer.write_record(&[
                step.step.to_string(),
                state.label().to_string(),
                step.mean[i].to_string(),
                step.variance[i].to_string(),
                step.median[i].to_string(),
                step.q1[i].to_string(),
                step.q3[i].to_string(),
            ])?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use DiseaseState::*;

    fn counts(s: usize, u: usize, dead: usize) -> StateCounts {
        let mut states = vec![Susceptible; s];
        states.extend(vec![InfectedUndiagnosed; u]);
        states.extend(vec![Dead; dead]);
        StateCounts::from_states(&states)
    }

    fn record(replicate: usize, steps: Vec<StateCounts>) -> TimeSeriesRecord {
        TimeSeriesRecord { replicate, seed: replicate as u64, initial: counts(9, 1, 0), steps }
    }

    #[test]
    fn state_counts_basics() {
        let c = counts(6, 3, 1);
        assert_eq!(c.total(), 10);
        assert_eq!(c[Susceptible], 6);
        assert_eq!(c.ever_infected(), 4);
        assert_eq!(c.infected_alive(), 3);
    }

    #[test]
    fn record_indexing() {
        let r = record(0, vec![counts(8, 2, 0), counts(7, 3, 0)]);
        assert_eq!(r.len(), 2);
        assert_eq!(r.counts_at(0), Some(&counts(9, 1, 0)));
        assert_eq!(r.counts_at(2), Some(&counts(7, 3, 0)));
        assert_eq!(r.counts_at(3), None);
        assert_eq!(r.ever_infected(), vec![2, 3]);
    }

    #[test]
    fn recorder_collects_steps() {
        let mut context = Context::new();
        context.init_population(4);
        context.record_initial_counts();
        context.record_step_counts();
        context.record_step_counts();
        assert_eq!(context.recorded_steps(), 2);

        let taken = context.take_record(3, 45);
        assert_eq!(taken.replicate, 3);
        assert_eq!(taken.seed, 45);
        assert_eq!(taken.len(), 2);
        assert_eq!(taken.initial.get(Susceptible), 4);
        assert_eq!(context.recorded_steps(), 0);
    }

    #[test]
    fn quantiles_interpolate() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.5), 2.5);
        assert_eq!(quantile(&values, 0.25), 1.75);
        assert_eq!(quantile(&values, 0.75), 3.25);
        assert_eq!(quantile(&[5.0], 0.25), 5.0);
        assert_eq!(quantile(&[], 0.5), 0.0);
    }

    #[test]
    fn summary_statistics() {
        let records = vec![
            record(0, vec![counts(8, 2, 0)]),
            record(1, vec![counts(6, 4, 0)]),
        ];
        let summary = ModeSummary::from_records("baseline", &records);
        assert_eq!(summary.replicates, 2);
        assert_eq!(summary.steps.len(), 2);

        let step1 = &summary.steps[1];
        let s = Susceptible.index();
        assert_eq!(step1.mean[s], 7.0);
        assert_eq!(step1.variance[s], 2.0);
        assert_eq!(step1.median[s], 7.0);
        assert_eq!(summary.steps[0].variance[s], 0.0);
    }

    #[test]
    fn empty_summary() {
        let summary = ModeSummary::from_records("baseline", &[]);
        assert!(summary.steps.is_empty());
    }

    #[test]
    fn raw_csv_layout() {
        let records = vec![
            record(0, vec![counts(8, 2, 0), counts(7, 2, 1)]),
            record(1, vec![counts(9, 1, 0), counts(9, 1, 0)]),
        ];
        let mut buffer = Vec::new();
        write_raw_csv(&mut buffer, "targeted_m_homo", 0.5, &records).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("step,mode,prep_coverage,susceptible_1,infected_"));
        assert!(lines[0].ends_with("dead_2"));
        assert_eq!(lines[0].split(',').count(), 3 + 2 * DiseaseState::COUNT);
        assert_eq!(lines[1], "0,targeted_m_homo,0.5,9,1,0,0,0,9,1,0,0,0");
        assert_eq!(lines[3], "2,targeted_m_homo,0.5,7,2,0,0,1,9,1,0,0,0");
    }

    #[test]
    fn summary_csv_layout() {
        let summary = ModeSummary::from_records("baseline", &[record(0, vec![counts(8, 2, 0)])]);
        let mut buffer = Vec::new();
        write_summary_csv(&mut buffer, &summary).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "step,state,mean,variance,median,q1,q3");
        assert_eq!(lines.len(), 1 + 2 * DiseaseState::COUNT);
        assert_eq!(lines[1], "0,susceptible,9,0,9,9,9");
    }
}
