/*!

The epidemic state engine. A `Replicate` advances one population over the shared contact network
in discrete, synchronous steps.

Every step reads only the snapshot produced by the previous step and writes the next one, so a
person infected (or diagnosed, or killed) in step `t` only influences their partners from step
`t + 1` on. Each kind of draw comes from its own named random stream, and people and partners are
always visited in id order, so a replicate is a pure function of its inputs and seed.

*/

use crate::{
    config::SimulationConfig,
    context::Context,
    define_rng,
    error::SimError,
    intervention::Intervention,
    network::ContactNetwork,
    parameters::{ParameterTable, TransmissionMatrix},
    people::{ContextPeopleExt, DiseaseState, PeopleData},
    random::ContextRandomExt,
    report::{ContextRecorderExt, TimeSeriesRecord},
    survival::SurvivalCurve,
    PersonId,
};
use log::{debug, trace};
use rand::seq::index;

define_rng!(SeedingRng);
define_rng!(PrepRng);
define_rng!(TransmissionRng);
define_rng!(DiagnosisRng);
define_rng!(MortalityRng);

/// The scalar rates of the engine, shared by every mode of a run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EpidemicParameters {
    pub steps_per_run: usize,
    pub steps_per_year: f64,
    pub contact_frequency: f64,
    pub diagnosis_probability: f64,
    pub art_uptake_proportion: f64,
    pub art_transmission_multiplier: f64,
    pub initial_infected: usize,
    pub initial_outbreak_proportion: Option<f64>,
}

impl EpidemicParameters {
    pub fn from_config(config: &SimulationConfig) -> Self {
        EpidemicParameters {
            steps_per_run: config.steps_per_run,
            steps_per_year: config.steps_per_year,
            contact_frequency: config.contact_frequency,
            diagnosis_probability: config.diagnosis_probability,
            art_uptake_proportion: config.art_uptake_proportion,
            art_transmission_multiplier: config.art_transmission_multiplier,
            initial_infected: config.initial_infected,
            initial_outbreak_proportion: config.initial_outbreak_proportion,
        }
    }

    /// How many people to seed in a population of `population`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn seed_count(&self, population: usize) -> Result<usize, SimError> {
        let count = match self.initial_outbreak_proportion {
            Some(proportion) => (proportion * population as f64).round() as usize,
            None => self.initial_infected,
        };
        if count > population {
            return Err(SimError::config(format!(
                "cannot seed {count} infections in a population of {population}"
            )));
        }
        Ok(count)
    }
}

impl Default for EpidemicParameters {
    fn default() -> Self {
        EpidemicParameters::from_config(&SimulationConfig::default())
    }
}

/// Everything a replicate of one mode needs besides the network. Built once per mode and shared
/// by all of its replicates.
#[derive(Clone, Debug)]
pub struct ModeSetup {
    intervention: Intervention,
    matrix: TransmissionMatrix,
    survival: SurvivalCurve,
    parameters: EpidemicParameters,
}

impl ModeSetup {
    pub fn new(
        intervention: Intervention,
        table: &ParameterTable,
        survival: SurvivalCurve,
        parameters: EpidemicParameters,
    ) -> Result<Self, SimError> {
        let matrix = intervention
            .apply(table)?
            .transmission_matrix(parameters.contact_frequency);
        Ok(ModeSetup {
            intervention,
            matrix,
            survival,
            parameters,
        })
    }

    #[must_use]
    pub fn intervention(&self) -> &Intervention {
        &self.intervention
    }

    #[must_use]
    pub fn matrix(&self) -> &TransmissionMatrix {
        &self.matrix
    }

    #[must_use]
    pub fn parameters(&self) -> &EpidemicParameters {
        &self.parameters
    }
}

pub struct Replicate<'a> {
    context: Context,
    network: &'a ContactNetwork,
    setup: &'a ModeSetup,
    replicate: usize,
    seed: u64,
    steps_taken: usize,
}

impl<'a> Replicate<'a> {
    /// Creates the population, seeds the initial infections, assigns PrEP, and records the
    /// initial counts.
    pub fn new(
        network: &'a ContactNetwork,
        setup: &'a ModeSetup,
        replicate: usize,
        seed: u64,
    ) -> Result<Self, SimError> {
        let population = network.population();
        let seeds = setup.parameters.seed_count(population)?;

        let mut context = Context::new();
        context.init_random(seed);
        context.init_population(population);

        let mut seeded =
            context.sample::<SeedingRng, _>(|rng| index::sample(rng, population, seeds).into_vec());
        seeded.sort_unstable();
        for idx in seeded {
            context.seed_infection(PersonId(idx))?;
        }

        let coverage = setup.intervention.prep_coverage();
        let mut on_prep = 0;
        if coverage > 0.0 {
            for person in network.people() {
                if setup.intervention.selects(network.category(person))
                    && context.sample_bool::<PrepRng>(coverage)
                {
                    context.set_on_prep(person, true);
                    on_prep += 1;
                }
            }
        }

        context.record_initial_counts();
        debug!(
            "replicate {replicate} of {} (seed {seed}): seeded {seeds}, {on_prep} on PrEP",
            setup.intervention.name()
        );

        Ok(Replicate {
            context,
            network,
            setup,
            replicate,
            seed,
            steps_taken: 0,
        })
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    #[must_use]
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// Advances every person by one step and records the resulting counts.
    pub fn step(&mut self) {
        let network = self.network;
        let setup = self.setup;
        self.context.with_data_container::<PeopleData, _>(|people, context| {
            for person in network.people() {
                let (state, steps_since_diagnosis) =
                    next_state(people, context, network, setup, person);
                debug_assert!(people.state(person).can_transition_to(state));
                people.set_next(person, state, steps_since_diagnosis);
            }
            people.swap_buffers();
        });
        self.context.record_step_counts();
        self.steps_taken += 1;
        trace!("replicate {} finished step {}", self.replicate, self.steps_taken);
    }

    /// Runs the remaining steps and returns the record.
    pub fn run(mut self) -> TimeSeriesRecord {
        while self.steps_taken < self.setup.parameters.steps_per_run {
            self.step();
        }
        self.context.take_record(self.replicate, self.seed)
    }
}

/// The state (and steps-since-diagnosis counter) of `person` after this step.
fn next_state(
    people: &PeopleData,
    context: &mut Context,
    network: &ContactNetwork,
    setup: &ModeSetup,
    person: PersonId,
) -> (DiseaseState, u32) {
    let parameters = &setup.parameters;
    let state = people.state(person);
    let counter = people.steps_since_diagnosis(person);

    match state {
        DiseaseState::Susceptible => {
            if is_infected_this_step(people, context, network, setup, person) {
                (DiseaseState::InfectedUndiagnosed, 0)
            } else {
                (DiseaseState::Susceptible, 0)
            }
        }
        DiseaseState::InfectedUndiagnosed => {
            if !context.sample_bool::<DiagnosisRng>(parameters.diagnosis_probability) {
                return (state, 0);
            }
            if context.sample_bool::<DiagnosisRng>(parameters.art_uptake_proportion) {
                (DiseaseState::DiagnosedArt, 0)
            } else {
                (DiseaseState::DiagnosedNoArt, 0)
            }
        }
        DiseaseState::DiagnosedNoArt | DiseaseState::DiagnosedArt => {
            let years = f64::from(counter) / parameters.steps_per_year;
            let p = setup
                .survival
                .death_probability(years, 1.0 / parameters.steps_per_year);
            let next = if context.sample_bool::<MortalityRng>(p) {
                DiseaseState::Dead
            } else {
                state
            };
            (next, counter.saturating_add(1))
        }
        DiseaseState::Dead => (DiseaseState::Dead, counter),
    }
}

/// One Bernoulli trial per living infectious partner; stops at the first success.
fn is_infected_this_step(
    people: &PeopleData,
    context: &mut Context,
    network: &ContactNetwork,
    setup: &ModeSetup,
    person: PersonId,
) -> bool {
    let category = network.category(person);
    let protection = if people.on_prep[person.0] {
        1.0 - setup.intervention.prep_efficacy()
    } else {
        1.0
    };

    for partner in network.active_partners(person, &people.current.states) {
        let partner_state = people.state(partner);
        if !partner_state.is_infectious() {
            continue;
        }
        let mut p = setup.matrix.probability(category, network.category(partner)) * protection;
        if partner_state == DiseaseState::DiagnosedArt {
            p *= setup.parameters.art_transmission_multiplier;
        }
        if p > 0.0 && context.sample_bool::<TransmissionRng>(p.min(1.0)) {
            return true;
        }
    }
    false
}
