/*!

Run configuration, read from a JSON file. Every field has a default, so `{}` is a valid (if
uninteresting) configuration.

```json
{
  "seed": 42,
  "steps_per_run": 520,
  "replicates_per_mode": 50,
  "modes": ["baseline", "targeted_m_homo"],
  "network": { "type": "synthetic", "num_nodes": 1000, "mean_degree": 3.0, "network_seed": 67 }
}
```

*/

use crate::{
    error::SimError,
    network::NetworkSpec,
    parameters::{PairEntry, PairParameters, ParameterTable},
    survival::{SurvivalCurve, DEFAULT_OBSERVATIONS},
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Where the contact network comes from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetworkSource {
    Synthetic(NetworkSpec),
    Files { nodes: PathBuf, edges: PathBuf },
}

impl Default for NetworkSource {
    fn default() -> Self {
        NetworkSource::Synthetic(NetworkSpec::default())
    }
}

/// Either raw cohort observations to fit, or already-fitted constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SurvivalSource {
    Observations { observations: Vec<(f64, f64)> },
    Fitted { c: f64, k: f64 },
}

impl Default for SurvivalSource {
    fn default() -> Self {
        SurvivalSource::Observations {
            observations: DEFAULT_OBSERVATIONS.to_vec(),
        }
    }
}

impl SurvivalSource {
    pub fn curve(&self) -> Result<SurvivalCurve, SimError> {
        match self {
            SurvivalSource::Observations { observations } => SurvivalCurve::fit(observations),
            SurvivalSource::Fitted { c, k } => SurvivalCurve::new(*c, *k),
        }
    }
}

/// Settings that targeted modes apply to their selected subgroup.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterventionConfig {
    /// Condom usage for every pair touching a targeted category.
    pub condom_usage: f64,
    /// Fraction of selected people who receive PrEP.
    pub prep_coverage: f64,
    /// Relative reduction in acquisition probability while on PrEP.
    pub prep_efficacy: f64,
}

impl Default for InterventionConfig {
    fn default() -> Self {
        InterventionConfig {
            condom_usage: 0.8,
            prep_coverage: 0.1,
            prep_efficacy: 0.86,
        }
    }
}

impl InterventionConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        check_probability("intervention.condom_usage", self.condom_usage)?;
        check_probability("intervention.prep_coverage", self.prep_coverage)?;
        check_probability("intervention.prep_efficacy", self.prep_efficacy)
    }

    /// The same settings with a different PrEP coverage.
    #[must_use]
    pub fn with_prep_coverage(&self, prep_coverage: f64) -> Self {
        InterventionConfig {
            prep_coverage,
            ..*self
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Replicate `r` of every mode is seeded with `seed + r`.
    pub seed: u64,
    pub steps_per_run: usize,
    /// Steps per year of survival-curve time. The default treats a step as one week.
    pub steps_per_year: f64,
    pub replicates_per_mode: usize,
    /// Contacts per partnership per step; multiplies the per-contact probability.
    pub contact_frequency: f64,
    pub diagnosis_probability: f64,
    pub art_uptake_proportion: f64,
    /// Scales transmission from partners on ART.
    pub art_transmission_multiplier: f64,
    pub initial_infected: usize,
    /// When set, overrides `initial_infected` with `round(proportion · population)`.
    pub initial_outbreak_proportion: Option<f64>,
    pub modes: Vec<String>,
    pub survival: SurvivalSource,
    /// Defaults to a per-gender table when empty.
    pub pair_parameters: Vec<PairEntry>,
    pub intervention: InterventionConfig,
    /// PrEP coverages to sweep; every mode runs once per value. Empty means only
    /// `intervention.prep_coverage`.
    pub prep_values: Vec<f64>,
    pub network: NetworkSource,
    pub output_dir: PathBuf,
    /// Worker threads for replicates; rayon's global pool when unset.
    pub threads: Option<usize>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            seed: 42,
            steps_per_run: 520,
            steps_per_year: 52.0,
            replicates_per_mode: 50,
            contact_frequency: 1.0,
            diagnosis_probability: 0.01,
            art_uptake_proportion: 0.7,
            art_transmission_multiplier: 1.0,
            initial_infected: 5,
            initial_outbreak_proportion: None,
            modes: vec!["baseline".to_string()],
            survival: SurvivalSource::default(),
            pair_parameters: Vec::new(),
            intervention: InterventionConfig::default(),
            prep_values: Vec::new(),
            network: NetworkSource::default(),
            output_dir: PathBuf::from("sim_results"),
            threads: None,
        }
    }
}

fn check_probability(name: &str, value: f64) -> Result<(), SimError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::config(format!("{name} must be a probability, got {value}")))
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SimError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        check_probability("diagnosis_probability", self.diagnosis_probability)?;
        check_probability("art_uptake_proportion", self.art_uptake_proportion)?;
        check_probability("art_transmission_multiplier", self.art_transmission_multiplier)?;
        self.intervention.validate()?;
        for prep_coverage in &self.prep_values {
            check_probability("prep_values", *prep_coverage)?;
        }
        if let Some(proportion) = self.initial_outbreak_proportion {
            check_probability("initial_outbreak_proportion", proportion)?;
        }
        if self.steps_per_run == 0 {
            return Err(SimError::config("steps_per_run must be at least 1"));
        }
        if self.replicates_per_mode == 0 {
            return Err(SimError::config("replicates_per_mode must be at least 1"));
        }
        if !self.steps_per_year.is_finite() || self.steps_per_year <= 0.0 {
            return Err(SimError::config(format!(
                "steps_per_year must be positive, got {}",
                self.steps_per_year
            )));
        }
        if !self.contact_frequency.is_finite() || self.contact_frequency < 0.0 {
            return Err(SimError::config(format!(
                "contact_frequency must be non-negative, got {}",
                self.contact_frequency
            )));
        }
        if self.modes.is_empty() {
            return Err(SimError::config("at least one mode must be configured"));
        }
        if self.threads == Some(0) {
            return Err(SimError::config("threads must be at least 1"));
        }
        Ok(())
    }

    /// The PrEP coverages each mode runs at, in configured order.
    #[must_use]
    pub fn prep_levels(&self) -> Vec<f64> {
        if self.prep_values.is_empty() {
            vec![self.intervention.prep_coverage]
        } else {
            self.prep_values.clone()
        }
    }

    /// The configured table, or the per-gender defaults when none is configured.
    pub fn parameter_table(&self) -> Result<ParameterTable, SimError> {
        if self.pair_parameters.is_empty() {
            default_parameter_table()
        } else {
            ParameterTable::new(self.pair_parameters.iter().copied())
        }
    }
}

/// Per-contact transmission defaults: receptive/insertive anal sex between men dominates,
/// vaginal sex is an order of magnitude lower, sex between women lower still.
pub fn default_parameter_table() -> Result<ParameterTable, SimError> {
    ParameterTable::by_gender(
        PairParameters {
            condom_usage: 0.3,
            condom_efficiency: 0.8,
            base_transmission_probability: 0.011,
        },
        PairParameters {
            condom_usage: 0.25,
            condom_efficiency: 0.8,
            base_transmission_probability: 0.0008,
        },
        PairParameters {
            condom_usage: 0.05,
            condom_efficiency: 0.8,
            base_transmission_probability: 0.0001,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::people::Category;

    #[test]
    fn empty_object_uses_defaults() {
        let config = SimulationConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.parameter_table().unwrap().len(), 36);
        let curve = config.survival.curve().unwrap();
        assert!((curve.k() - 0.29).abs() < 0.02);
    }

    #[test]
    fn reads_full_config() {
        let json = r#"{
            "seed": 7,
            "steps_per_run": 50,
            "replicates_per_mode": 10,
            "initial_infected": 5,
            "modes": ["baseline", "targeted_m_homo"],
            "survival": {"c": 90.0, "k": 0.25},
            "pair_parameters": [
                {"a": "m_homo", "b": "m_homo", "condom_usage": 0.3,
                 "condom_efficiency": 0.8, "base_transmission_probability": 0.02}
            ],
            "intervention": {"prep_coverage": 0.5},
            "network": {"type": "files", "nodes": "n.csv", "edges": "e.csv"},
            "threads": 2
        }"#;
        let config = SimulationConfig::from_json_str(json).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.modes.len(), 2);
        assert_eq!(config.survival, SurvivalSource::Fitted { c: 90.0, k: 0.25 });
        assert_eq!(config.intervention.prep_coverage, 0.5);
        assert_eq!(config.intervention.condom_usage, 0.8);
        assert!(matches!(config.network, NetworkSource::Files { .. }));

        let table = config.parameter_table().unwrap();
        assert!(table.lookup(Category::M_HOMO, Category::M_HOMO).is_some());
        assert!(table.lookup(Category::F_HOMO, Category::F_HOMO).is_none());
    }

    #[test]
    fn synthetic_network_fields_default() {
        let json = r#"{"network": {"type": "synthetic", "num_nodes": 100}}"#;
        let config = SimulationConfig::from_json_str(json).unwrap();
        let NetworkSource::Synthetic(spec) = config.network else {
            panic!("expected a synthetic network");
        };
        assert_eq!(spec.num_nodes, 100);
        assert_eq!(spec.network_seed, NetworkSpec::default().network_seed);
    }

    #[test]
    fn rejects_invalid_values() {
        for json in [
            r#"{"diagnosis_probability": 1.5}"#,
            r#"{"steps_per_run": 0}"#,
            r#"{"replicates_per_mode": 0}"#,
            r#"{"contact_frequency": -1.0}"#,
            r#"{"modes": []}"#,
            r#"{"intervention": {"prep_efficacy": 2.0}}"#,
            r#"{"threads": 0}"#,
            r#"{"prep_values": [0.1, 1.2]}"#,
        ] {
            let error = SimulationConfig::from_json_str(json).unwrap_err();
            assert!(error.is_configuration(), "{json}: {error}");
        }
    }

    #[test]
    fn prep_levels_default_to_configured_coverage() {
        let config = SimulationConfig::from_json_str(r#"{"intervention": {"prep_coverage": 0.3}}"#)
            .unwrap();
        assert_eq!(config.prep_levels(), vec![0.3]);

        let sweep = SimulationConfig::from_json_str(r#"{"prep_values": [0.1, 0.5, 1.0]}"#).unwrap();
        assert_eq!(sweep.prep_levels(), vec![0.1, 0.5, 1.0]);
    }

    #[test]
    fn intervention_settings_are_checked_on_their_own() {
        assert!(InterventionConfig::default().validate().is_ok());
        let too_much = InterventionConfig::default().with_prep_coverage(1.5);
        assert!(too_much.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn unknown_fields_are_json_errors() {
        let error = SimulationConfig::from_json_str(r#"{"stepz": 3}"#).unwrap_err();
        assert!(matches!(error, SimError::Json(_)));
    }
}
