/*!

Per-category-pair transmission parameters.

The table is keyed by an ordered `(Category, Category)` pair but is always symmetric: an entry
given in one orientation is mirrored, and an entry given in both orientations with different
values is rejected when the table is built.

*/

use crate::{
    error::SimError,
    people::{Category, Gender},
    property::Property,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairParameters {
    pub condom_usage: f64,
    pub condom_efficiency: f64,
    pub base_transmission_probability: f64,
}

impl PairParameters {
    /// Per-contact probability after condom protection: `base · (1 − usage · efficiency)`.
    #[must_use]
    #[inline]
    pub fn effective_probability(&self) -> f64 {
        self.base_transmission_probability * (1.0 - self.condom_usage * self.condom_efficiency)
    }

    fn validate(&self, a: Category, b: Category) -> Result<(), SimError> {
        for (name, value) in [
            ("condom_usage", self.condom_usage),
            ("condom_efficiency", self.condom_efficiency),
            ("base_transmission_probability", self.base_transmission_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimError::config(format!(
                    "{name} for ({a}, {b}) must be a probability, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// One row of the `pair_parameters` configuration list.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairEntry {
    pub a: Category,
    pub b: Category,
    #[serde(flatten)]
    pub parameters: PairParameters,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterTable {
    entries: FxHashMap<(Category, Category), PairParameters>,
}

impl ParameterTable {
    pub fn new(entries: impl IntoIterator<Item = PairEntry>) -> Result<Self, SimError> {
        let mut explicit: FxHashMap<(Category, Category), PairParameters> = FxHashMap::default();
        for PairEntry { a, b, parameters } in entries {
            parameters.validate(a, b)?;
            if explicit.insert((a, b), parameters).is_some_and(|previous| previous != parameters) {
                return Err(SimError::config(format!(
                    "conflicting duplicate entries for ({a}, {b})"
                )));
            }
        }

        let mut table = explicit.clone();
        for (&(a, b), parameters) in &explicit {
            match explicit.get(&(b, a)) {
                Some(mirror) if mirror != parameters => {
                    return Err(SimError::config(format!(
                        "parameter table is not symmetric: ({a}, {b}) differs from ({b}, {a})"
                    )));
                }
                Some(_) => {}
                None => {
                    table.insert((b, a), *parameters);
                }
            }
        }

        Ok(ParameterTable { entries: table })
    }

    /// A complete table where parameters depend only on the genders of the two partners.
    pub fn by_gender(
        male_male: PairParameters,
        male_female: PairParameters,
        female_female: PairParameters,
    ) -> Result<Self, SimError> {
        let mut entries = Vec::with_capacity(Category::COUNT * Category::COUNT);
        for &a in Category::VALUES {
            for &b in Category::VALUES {
                let parameters = match (a.gender, b.gender) {
                    (Gender::Male, Gender::Male) => male_male,
                    (Gender::Female, Gender::Female) => female_female,
                    _ => male_female,
                };
                entries.push(PairEntry { a, b, parameters });
            }
        }
        Self::new(entries)
    }

    #[must_use]
    pub fn lookup(&self, a: Category, b: Category) -> Option<&PairParameters> {
        self.entries.get(&(a, b))
    }

    #[must_use]
    pub fn contains_pair(&self, a: Category, b: Category) -> bool {
        self.entries.contains_key(&(a, b))
    }

    /// Every category that appears in some key.
    #[must_use]
    pub fn categories(&self) -> FxHashSet<Category> {
        self.entries.keys().flat_map(|&(a, b)| [a, b]).collect()
    }

    /// Entries sorted by key.
    #[must_use]
    pub fn entries(&self) -> Vec<PairEntry> {
        let mut entries: Vec<PairEntry> = self
            .entries
            .iter()
            .map(|(&(a, b), &parameters)| PairEntry { a, b, parameters })
            .collect();
        entries.sort_by_key(|entry| (entry.a, entry.b));
        entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A copy where every pair with at least one side in `selected` uses `condom_usage`.
    /// All other entries are left untouched, and the result stays symmetric.
    pub fn with_condom_usage(
        &self,
        selected: impl Fn(Category) -> bool,
        condom_usage: f64,
    ) -> Result<Self, SimError> {
        if !(0.0..=1.0).contains(&condom_usage) {
            return Err(SimError::config(format!(
                "override condom_usage must be a probability, got {condom_usage}"
            )));
        }
        let mut table = self.clone();
        for (&(a, b), parameters) in &mut table.entries {
            if selected(a) || selected(b) {
                parameters.condom_usage = condom_usage;
            }
        }
        Ok(table)
    }

    /// Dense per-step transmission probabilities indexed by
    /// `[susceptible category][infectious category]`. Missing pairs transmit with probability 0.
    #[must_use]
    pub fn transmission_matrix(&self, contact_frequency: f64) -> TransmissionMatrix {
        let mut probabilities = [[0.0; Category::COUNT]; Category::COUNT];
        for (&(a, b), parameters) in &self.entries {
            probabilities[a.index()][b.index()] =
                (parameters.effective_probability() * contact_frequency).clamp(0.0, 1.0);
        }
        TransmissionMatrix { probabilities }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TransmissionMatrix {
    probabilities: [[f64; Category::COUNT]; Category::COUNT],
}

impl TransmissionMatrix {
    #[must_use]
    #[inline]
    pub fn probability(&self, susceptible: Category, infectious: Category) -> f64 {
        self.probabilities[susceptible.index()][infectious.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(usage: f64, efficiency: f64, base: f64) -> PairParameters {
        PairParameters {
            condom_usage: usage,
            condom_efficiency: efficiency,
            base_transmission_probability: base,
        }
    }

    fn default_table() -> ParameterTable {
        ParameterTable::by_gender(
            params(0.3, 0.8, 0.011),
            params(0.4, 0.8, 0.0008),
            params(0.1, 0.8, 0.0001),
        )
            .unwrap()
    }

    #[test]
    fn lookup_is_symmetric() {
        let table = default_table();
        assert_eq!(table.len(), Category::COUNT * Category::COUNT);
        for &a in Category::VALUES {
            for &b in Category::VALUES {
                assert_eq!(table.lookup(a, b), table.lookup(b, a));
                assert!(table.lookup(a, b).is_some());
            }
        }
    }

    #[test]
    fn one_sided_entries_are_mirrored() {
        let table = ParameterTable::new([PairEntry {
            a: Category::M_HOMO,
            b: Category::M_BI,
            parameters: params(0.5, 0.9, 0.01),
        }])
        .unwrap();
        assert_eq!(table.lookup(Category::M_BI, Category::M_HOMO), Some(&params(0.5, 0.9, 0.01)));
        assert_eq!(table.categories().len(), 2);
    }

    #[test]
    fn asymmetric_entries_are_rejected() {
        let result = ParameterTable::new([
            PairEntry {
                a: Category::M_HETERO,
                b: Category::F_HETERO,
                parameters: params(0.5, 0.9, 0.01),
            },
            PairEntry {
                a: Category::F_HETERO,
                b: Category::M_HETERO,
                parameters: params(0.6, 0.9, 0.01),
            },
        ]);
        assert!(result.unwrap_err().is_configuration());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let result = ParameterTable::new([PairEntry {
            a: Category::F_BI,
            b: Category::F_BI,
            parameters: params(1.2, 0.9, 0.01),
        }]);
        assert!(result.is_err());
    }

    #[test]
    fn condoms_only_reduce_transmission() {
        let p = params(0.5, 0.8, 0.01);
        assert!((p.effective_probability() - 0.006).abs() < 1e-12);
        assert!(params(1.0, 1.0, 0.01).effective_probability() == 0.0);
        assert!(params(0.0, 0.9, 0.01).effective_probability() == 0.01);
    }

    #[test]
    fn condom_override_touches_only_selected_pairs() {
        let table = default_table();
        let targeted = table
            .with_condom_usage(|c| c == Category::M_HOMO, 0.95)
            .unwrap();

        for &a in Category::VALUES {
            for &b in Category::VALUES {
                let before = table.lookup(a, b).unwrap();
                let after = targeted.lookup(a, b).unwrap();
                if a == Category::M_HOMO || b == Category::M_HOMO {
                    assert_eq!(after.condom_usage, 0.95);
                    assert_eq!(after.condom_efficiency, before.condom_efficiency);
                } else {
                    assert_eq!(after, before);
                }
                assert_eq!(targeted.lookup(a, b), targeted.lookup(b, a));
            }
        }
        assert!(table.with_condom_usage(|_| true, -0.1).is_err());
    }

    #[test]
    fn matrix_scales_by_contact_frequency() {
        let table = default_table();
        let matrix = table.transmission_matrix(2.0);
        let expected = 0.011 * (1.0 - 0.3 * 0.8) * 2.0;
        assert!((matrix.probability(Category::M_HOMO, Category::M_BI) - expected).abs() < 1e-12);

        let saturated = table.transmission_matrix(1.0e6);
        assert_eq!(saturated.probability(Category::M_HOMO, Category::M_HOMO), 1.0);
    }

    #[test]
    fn pair_entry_reads_flat_json() {
        let entry: PairEntry = serde_json::from_str(
            r#"{"a": "m_homo", "b": "f_bi", "condom_usage": 0.2, "condom_efficiency": 0.8,
                "base_transmission_probability": 0.001}"#,
        )
        .unwrap();
        assert_eq!(entry.a, Category::M_HOMO);
        assert_eq!(entry.parameters, params(0.2, 0.8, 0.001));
    }
}
