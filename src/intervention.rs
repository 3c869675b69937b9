/*!

Intervention modes. A mode picks a subgroup of the population and changes parameters for it
once, at initialization: condom usage on every partnership touching the subgroup, and PrEP for a
fraction of its members. Modes never alter the transition rules themselves.

| mode                     | selects                        | condom override | PrEP |
|--------------------------|--------------------------------|-----------------|------|
| `baseline`               | nobody                         | no              | no   |
| `standard`               | everyone                       | no              | yes  |
| `targeted_{m,f}_{orient}`| one category                   | yes             | yes  |
| `targeted_{orient}sexual`| both genders of an orientation | yes             | yes  |
| `targeted_{male,female}` | all orientations of a gender   | yes             | yes  |

*/

use crate::{
    config::InterventionConfig,
    error::SimError,
    parameters::ParameterTable,
    people::{Category, Gender, Orientation},
    property::Property,
};
use log::debug;

pub const MODE_NAMES: [&str; 13] = [
    "baseline",
    "standard",
    "targeted_m_homo",
    "targeted_m_hetero",
    "targeted_m_bi",
    "targeted_f_homo",
    "targeted_f_hetero",
    "targeted_f_bi",
    "targeted_homosexual",
    "targeted_heterosexual",
    "targeted_bisexual",
    "targeted_male",
    "targeted_female",
];

/// Which individuals a mode acts on, decided by category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    Nobody,
    Everyone,
    Categories(Vec<Category>),
}

impl Selector {
    #[must_use]
    pub fn selects(&self, category: Category) -> bool {
        match self {
            Selector::Nobody => false,
            Selector::Everyone => true,
            Selector::Categories(categories) => categories.contains(&category),
        }
    }

    fn matching(predicate: impl Fn(Category) -> bool) -> Self {
        Selector::Categories(Category::VALUES.iter().copied().filter(|c| predicate(*c)).collect())
    }

    fn orientation(orientation: Orientation) -> Self {
        Selector::matching(|c| c.orientation == orientation)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Intervention {
    name: String,
    selector: Selector,
    condom_usage: Option<f64>,
    prep_coverage: f64,
    prep_efficacy: f64,
}

impl Intervention {
    /// Resolves a mode name. Unknown names and out-of-range settings are configuration errors.
    pub fn from_name(name: &str, config: &InterventionConfig) -> Result<Self, SimError> {
        config.validate()?;
        let (selector, targeted) = match name {
            "baseline" => (Selector::Nobody, false),
            "standard" => (Selector::Everyone, false),
            "targeted_male" => (Selector::matching(|c| c.gender == Gender::Male), true),
            "targeted_female" => (Selector::matching(|c| c.gender == Gender::Female), true),
            "random" => {
                return Err(SimError::config(
                    "mode `random` is not available; `standard` offers PrEP to everyone \
                     regardless of category",
                ));
            }
            "targeted_homosexual" => (Selector::orientation(Orientation::Homosexual), true),
            "targeted_heterosexual" => (Selector::orientation(Orientation::Heterosexual), true),
            "targeted_bisexual" => (Selector::orientation(Orientation::Bisexual), true),
            other => {
                let category = other
                    .strip_prefix("targeted_")
                    .and_then(Category::from_label)
                    .ok_or_else(|| {
                        SimError::config(format!(
                            "unknown mode `{name}`; expected one of {}",
                            MODE_NAMES.join(", ")
                        ))
                    })?;
                (Selector::Categories(vec![category]), true)
            }
        };

        let intervention = Intervention {
            name: name.to_string(),
            selector,
            condom_usage: targeted.then_some(config.condom_usage),
            prep_coverage: if name == "baseline" { 0.0 } else { config.prep_coverage },
            prep_efficacy: config.prep_efficacy,
        };
        debug!("resolved mode {name}: {:?}", intervention.selector);
        Ok(intervention)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    #[must_use]
    pub fn selects(&self, category: Category) -> bool {
        self.selector.selects(category)
    }

    #[must_use]
    pub fn condom_usage(&self) -> Option<f64> {
        self.condom_usage
    }

    /// Probability that a selected person is on PrEP.
    #[must_use]
    pub fn prep_coverage(&self) -> f64 {
        self.prep_coverage
    }

    #[must_use]
    pub fn prep_efficacy(&self) -> f64 {
        self.prep_efficacy
    }

    /// The parameter table this mode runs with.
    pub fn apply(&self, table: &ParameterTable) -> Result<ParameterTable, SimError> {
        match self.condom_usage {
            Some(condom_usage) => table.with_condom_usage(|c| self.selects(c), condom_usage),
            None => Ok(table.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_parameter_table;

    fn resolve(name: &str) -> Result<Intervention, SimError> {
        Intervention::from_name(name, &InterventionConfig::default())
    }

    #[test]
    fn every_listed_mode_resolves() {
        for name in MODE_NAMES {
            let intervention = resolve(name).unwrap();
            assert_eq!(intervention.name(), name);
        }
    }

    #[test]
    fn unknown_mode_is_a_configuration_error() {
        for name in ["targeted_m_pan", "everyone", "targeted_", ""] {
            assert!(resolve(name).unwrap_err().is_configuration(), "{name}");
        }
    }

    #[test]
    fn random_mode_points_to_standard() {
        let error = resolve("random").unwrap_err();
        assert!(error.is_configuration());
        assert!(error.to_string().contains("`standard`"));
    }

    #[test]
    fn out_of_range_settings_are_rejected() {
        for config in [
            InterventionConfig { prep_coverage: 1.5, ..InterventionConfig::default() },
            InterventionConfig { condom_usage: -0.1, ..InterventionConfig::default() },
            InterventionConfig { prep_efficacy: f64::NAN, ..InterventionConfig::default() },
        ] {
            let error = Intervention::from_name("standard", &config).unwrap_err();
            assert!(error.is_configuration(), "{config:?}");
        }
    }

    #[test]
    fn baseline_changes_nothing() {
        let baseline = resolve("baseline").unwrap();
        let table = default_parameter_table().unwrap();
        assert_eq!(baseline.apply(&table).unwrap(), table);
        assert_eq!(baseline.prep_coverage(), 0.0);
        assert!(Category::VALUES.iter().all(|c| !baseline.selects(*c)));
    }

    #[test]
    fn standard_gives_prep_without_condom_override() {
        let standard = resolve("standard").unwrap();
        let table = default_parameter_table().unwrap();
        assert_eq!(standard.apply(&table).unwrap(), table);
        assert!(standard.prep_coverage() > 0.0);
        assert!(Category::VALUES.iter().all(|c| standard.selects(*c)));
    }

    #[test]
    fn targeted_m_homo_changes_only_its_pairs() {
        let config = InterventionConfig { condom_usage: 0.95, ..InterventionConfig::default() };
        let targeted = Intervention::from_name("targeted_m_homo", &config).unwrap();
        let table = default_parameter_table().unwrap();
        let applied = targeted.apply(&table).unwrap();

        assert!(targeted.selects(Category::M_HOMO));
        assert!(!targeted.selects(Category::M_BI));
        for &a in Category::VALUES {
            for &b in Category::VALUES {
                let before = table.lookup(a, b).unwrap();
                let after = applied.lookup(a, b).unwrap();
                if a == Category::M_HOMO || b == Category::M_HOMO {
                    assert_eq!(after.condom_usage, 0.95);
                    assert_eq!(
                        after.base_transmission_probability,
                        before.base_transmission_probability
                    );
                } else {
                    assert_eq!(after, before);
                }
            }
        }
    }

    #[test]
    fn group_modes_select_expected_categories() {
        let female = resolve("targeted_female").unwrap();
        assert_eq!(
            female.selector(),
            &Selector::Categories(vec![Category::F_HETERO, Category::F_HOMO, Category::F_BI])
        );
        let bisexual = resolve("targeted_bisexual").unwrap();
        assert!(bisexual.selects(Category::M_BI) && bisexual.selects(Category::F_BI));
        assert!(!bisexual.selects(Category::F_HOMO));
    }
}
