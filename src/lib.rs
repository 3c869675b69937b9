/*!

A stochastic simulator of HIV spread over a static sexual contact network.

Each individual belongs to a category (gender and orientation) and moves through
`Susceptible -> InfectedUndiagnosed -> Diagnosed (ART or no ART) -> Dead` in discrete steps.
Transmission probabilities come from a per-category-pair parameter table, and post-diagnosis
mortality from a fitted exponential survival curve. An intervention mode can raise condom usage
and hand out PrEP to a targeted subgroup. Every mode runs many independently seeded replicates,
whose per-step counts are summarized and written as CSV.

*/

pub mod config;
pub mod context;
pub mod epidemic;
pub mod error;
mod hashing;
pub mod intervention;
pub mod logging;
pub mod network;
pub mod parameters;
pub mod people;
pub mod property;
pub mod random;
pub mod report;
pub mod runner;
pub mod survival;
mod trait_map;

// All modules import `crate::TypeId` in case we want to change the underlying type of `TypeId`.
pub(crate) use std::any::TypeId;

// Re-exported for `define_rng!`.
pub use rand;

pub use config::SimulationConfig;
pub use error::SimError;
pub use intervention::{Intervention, MODE_NAMES};
pub use network::ContactNetwork;
pub use parameters::ParameterTable;
pub use people::{Category, DiseaseState};
pub use report::{ModeSummary, StateCounts, TimeSeriesRecord};
pub use runner::{run_all, run_mode, run_mode_at, ModeRun, SimulationInputs};
pub use survival::SurvivalCurve;

#[inline(always)]
pub fn type_of<T: 'static>() -> TypeId {
    TypeId::of::<T>()
}

/// An individual, identified by its node index in the contact network.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct PersonId(pub(crate) usize);

impl PersonId {
    #[must_use]
    pub fn new(index: usize) -> Self {
        PersonId(index)
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}
