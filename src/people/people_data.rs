use crate::{
    context::DataPlugin,
    people::DiseaseState,
    report::StateCounts,
    PersonId,
};

/// One full copy of the mutable per-person columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Snapshot {
    pub(crate) states: Vec<DiseaseState>,
    /// Steps elapsed since diagnosis. Only meaningful for diagnosed (and dead) people.
    pub(crate) steps_since_diagnosis: Vec<u32>,
}

impl Snapshot {
    fn with_population(size: usize) -> Self {
        Snapshot {
            states: vec![DiseaseState::Susceptible; size],
            steps_since_diagnosis: vec![0; size],
        }
    }
}

/// Stores all per-replicate data associated to people.
///
/// Disease state is double-buffered: a step reads only `current` and writes only `next`, then
/// the two are swapped. Within a step the outcome for one person therefore never depends on the
/// order in which the others were updated.
#[derive(Debug, Default)]
pub(crate) struct PeopleData {
    pub(crate) current_population: usize,
    pub(crate) current: Snapshot,
    pub(crate) next: Snapshot,
    /// Fixed at initialization by the intervention.
    pub(crate) on_prep: Vec<bool>,
}

impl DataPlugin for PeopleData {
    const new: &'static dyn Fn() -> Self = &PeopleData::default;
}

impl PeopleData {
    pub fn create_population(&mut self, size: usize) {
        self.current_population = size;
        self.current = Snapshot::with_population(size);
        self.next = Snapshot::with_population(size);
        self.on_prep = vec![false; size];
    }

    #[inline]
    pub fn state(&self, person_id: PersonId) -> DiseaseState {
        self.current.states[person_id.0]
    }

    #[inline]
    pub fn steps_since_diagnosis(&self, person_id: PersonId) -> u32 {
        self.current.steps_since_diagnosis[person_id.0]
    }

    /// Overwrites the current state directly. Only used while seeding, before any step.
    pub fn set_initial_state(&mut self, person_id: PersonId, state: DiseaseState) {
        self.current.states[person_id.0] = state;
        self.current.steps_since_diagnosis[person_id.0] = 0;
    }

    /// Writes the outcome for `person_id` into the next snapshot.
    #[inline]
    pub fn set_next(
        &mut self,
        person_id: PersonId,
        state: DiseaseState,
        steps_since_diagnosis: u32,
    ) {
        self.next.states[person_id.0] = state;
        self.next.steps_since_diagnosis[person_id.0] = steps_since_diagnosis;
    }

    /// Makes the next snapshot current.
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    pub fn counts(&self) -> StateCounts {
        StateCounts::from_states(&self.current.states)
    }
}
