use crate::{
    context::Context,
    error::SimError,
    people::{DiseaseState, PeopleData},
    report::StateCounts,
    PersonId,
};
use log::trace;

/// The public API to the people of a replicate.
pub trait ContextPeopleExt {
    /// Creates `size` susceptible people with ids `0..size`.
    fn init_population(&mut self, size: usize);

    fn get_current_population(&self) -> usize;

    fn get_disease_state(&self, person_id: PersonId) -> DiseaseState;

    /// Steps since diagnosis, or `None` if the person was never diagnosed.
    fn get_steps_since_diagnosis(&self, person_id: PersonId) -> Option<u32>;

    /// Marks a susceptible person as infected (undiagnosed) before the first step.
    fn seed_infection(&mut self, person_id: PersonId) -> Result<(), SimError>;

    fn set_on_prep(&mut self, person_id: PersonId, on_prep: bool);

    fn is_on_prep(&self, person_id: PersonId) -> bool;

    fn count_by_state(&self) -> StateCounts;

    /// All people currently in `state`, in id order.
    fn query_people_in_state(&self, state: DiseaseState) -> Vec<PersonId>;
}

fn people_data(context: &Context) -> Option<&PeopleData> {
    context.get_data_container::<PeopleData>()
}

impl ContextPeopleExt for Context {
    fn init_population(&mut self, size: usize) {
        trace!("initializing population of {size}");
        self.get_data_container_mut::<PeopleData>()
            .create_population(size);
    }

    fn get_current_population(&self) -> usize {
        match people_data(self) {
            None => 0,
            Some(people_data) => people_data.current_population,
        }
    }

    fn get_disease_state(&self, person_id: PersonId) -> DiseaseState {
        people_data(self).map_or(DiseaseState::Susceptible, |people| people.state(person_id))
    }

    fn get_steps_since_diagnosis(&self, person_id: PersonId) -> Option<u32> {
        let people = people_data(self)?;
        match people.state(person_id) {
            DiseaseState::DiagnosedNoArt | DiseaseState::DiagnosedArt | DiseaseState::Dead => {
                Some(people.steps_since_diagnosis(person_id))
            }
            _ => None,
        }
    }

    fn seed_infection(&mut self, person_id: PersonId) -> Result<(), SimError> {
        let people = self.get_data_container_mut::<PeopleData>();
        if person_id.0 >= people.current_population {
            return Err(SimError::config(format!("cannot seed unknown person {}", person_id.0)));
        }
        if people.state(person_id) != DiseaseState::Susceptible {
            return Err(SimError::config(format!("person {} is already infected", person_id.0)));
        }
        people.set_initial_state(person_id, DiseaseState::InfectedUndiagnosed);
        Ok(())
    }

    fn set_on_prep(&mut self, person_id: PersonId, on_prep: bool) {
        self.get_data_container_mut::<PeopleData>()
            .on_prep[person_id.0] = on_prep;
    }

    fn is_on_prep(&self, person_id: PersonId) -> bool {
        people_data(self).is_some_and(|people| people.on_prep[person_id.0])
    }

    fn count_by_state(&self) -> StateCounts {
        people_data(self).map(PeopleData::counts).unwrap_or_default()
    }

    fn query_people_in_state(&self, state: DiseaseState) -> Vec<PersonId> {
        let Some(people) = people_data(self) else {
            return Vec::new();
        };
        people
            .current
            .states
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == state)
            .map(|(idx, _)| PersonId(idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_and_query() {
        let mut context = Context::new();
        context.init_population(5);
        assert_eq!(context.get_current_population(), 5);

        context.seed_infection(PersonId(3)).unwrap();
        assert_eq!(context.get_disease_state(PersonId(3)), DiseaseState::InfectedUndiagnosed);
        assert_eq!(
            context.query_people_in_state(DiseaseState::InfectedUndiagnosed),
            vec![PersonId(3)]
        );
        assert_eq!(context.get_steps_since_diagnosis(PersonId(3)), None);

        assert!(context.seed_infection(PersonId(3)).unwrap_err().is_configuration());
        assert!(context.seed_infection(PersonId(9)).is_err());

        let counts = context.count_by_state();
        assert_eq!(counts.get(DiseaseState::Susceptible), 4);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn prep_flags() {
        let mut context = Context::new();
        context.init_population(2);
        context.set_on_prep(PersonId(0), true);
        assert!(context.is_on_prep(PersonId(0)));
        assert!(!context.is_on_prep(PersonId(1)));
    }

    #[test]
    fn empty_context() {
        let context = Context::new();
        assert_eq!(context.get_current_population(), 0);
        assert_eq!(context.count_by_state().total(), 0);
    }
}
