/*!

The static contact network: one node per individual, undirected partnership edges.

Adjacency is stored in compressed form with each partner list sorted by id, so iterating a
person's partners always visits them in the same order. The network is validated once when it is
built and is read-only afterwards; replicates share it by reference.

*/

mod generator;
mod loader;

pub use generator::{generate_network, NetworkSpec};
pub use loader::{load_network, read_network};

use crate::{
    error::SimError,
    parameters::ParameterTable,
    people::{Category, DiseaseState},
    PersonId,
};
use log::debug;
use rustc_hash::FxHashSet;

#[derive(Clone, Debug, PartialEq)]
pub struct ContactNetwork {
    categories: Vec<Category>,
    /// `partners[offsets[i]..offsets[i + 1]]` are the partners of person `i`.
    offsets: Vec<usize>,
    partners: Vec<PersonId>,
}

impl ContactNetwork {
    /// Builds and validates a network. Fails if an edge references an unknown person, joins a
    /// person to themself, or repeats another edge, or if a category (or an edge's category
    /// pair) has no entry in `table`.
    pub fn new(
        categories: Vec<Category>,
        edges: &[(PersonId, PersonId)],
        table: &ParameterTable,
    ) -> Result<Self, SimError> {
        let population = categories.len();

        let known = table.categories();
        if let Some((idx, category)) = categories
            .iter()
            .enumerate()
            .find(|(_, category)| !known.contains(*category))
        {
            return Err(SimError::config(format!(
                "person {idx} has category {category} which has no transmission parameters"
            )));
        }

        let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();
        seen.reserve(edges.len());
        let mut degrees = vec![0usize; population];
        for &(PersonId(a), PersonId(b)) in edges {
            if a >= population || b >= population {
                return Err(SimError::config(format!(
                    "edge ({a}, {b}) references a person outside 0..{population}"
                )));
            }
            if a == b {
                return Err(SimError::config(format!("edge ({a}, {b}) is a self-loop")));
            }
            if !seen.insert((a.min(b), a.max(b))) {
                return Err(SimError::config(format!("edge ({a}, {b}) is a duplicate")));
            }
            if !table.contains_pair(categories[a], categories[b]) {
                return Err(SimError::config(format!(
                    "edge ({a}, {b}) joins {} and {} which have no transmission parameters",
                    categories[a], categories[b]
                )));
            }
            degrees[a] += 1;
            degrees[b] += 1;
        }

        let mut offsets = Vec::with_capacity(population + 1);
        offsets.push(0);
        for degree in &degrees {
            offsets.push(offsets[offsets.len() - 1] + degree);
        }

        let mut cursor = offsets[..population].to_vec();
        let mut partners = vec![PersonId(0); edges.len() * 2];
        for &(a, b) in edges {
            partners[cursor[a.0]] = b;
            cursor[a.0] += 1;
            partners[cursor[b.0]] = a;
            cursor[b.0] += 1;
        }
        for i in 0..population {
            partners[offsets[i]..offsets[i + 1]].sort_unstable();
        }

        debug!("built contact network with {population} people and {} edges", edges.len());
        Ok(ContactNetwork { categories, offsets, partners })
    }

    #[must_use]
    pub fn population(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.partners.len() / 2
    }

    #[must_use]
    #[inline]
    pub fn category(&self, person_id: PersonId) -> Category {
        self.categories[person_id.0]
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// All partners of `person_id`, sorted by id.
    #[must_use]
    #[inline]
    pub fn partners(&self, person_id: PersonId) -> &[PersonId] {
        &self.partners[self.offsets[person_id.0]..self.offsets[person_id.0 + 1]]
    }

    /// Partners that are not dead according to `states`.
    pub fn active_partners<'a>(
        &'a self,
        person_id: PersonId,
        states: &'a [DiseaseState],
    ) -> impl Iterator<Item = PersonId> + 'a {
        self.partners(person_id)
            .iter()
            .copied()
            .filter(move |partner| states[partner.0].is_alive())
    }

    #[must_use]
    pub fn degree(&self, person_id: PersonId) -> usize {
        self.offsets[person_id.0 + 1] - self.offsets[person_id.0]
    }

    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean_degree(&self) -> f64 {
        if self.categories.is_empty() {
            0.0
        } else {
            self.partners.len() as f64 / self.categories.len() as f64
        }
    }

    pub fn people(&self) -> impl Iterator<Item = PersonId> + use<> {
        (0..self.population()).map(PersonId)
    }

    /// Each undirected edge once, as `(lower id, higher id)`.
    pub fn edges(&self) -> impl Iterator<Item = (PersonId, PersonId)> + '_ {
        self.people().flat_map(move |person| {
            self.partners(person)
                .iter()
                .copied()
                .filter(move |partner| person < *partner)
                .map(move |partner| (person, partner))
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::parameters::PairParameters;

    pub(crate) fn test_table() -> ParameterTable {
        let p = PairParameters {
            condom_usage: 0.3,
            condom_efficiency: 0.8,
            base_transmission_probability: 0.05,
        };
        ParameterTable::by_gender(p, p, p).unwrap()
    }

    fn ids(pairs: &[(usize, usize)]) -> Vec<(PersonId, PersonId)> {
        pairs.iter().map(|&(a, b)| (PersonId(a), PersonId(b))).collect()
    }

    #[test]
    fn adjacency_is_sorted_and_symmetric() {
        let categories = vec![Category::M_HOMO; 4];
        let edges = ids(&[(0, 3), (2, 0), (1, 0)]);
        let network = ContactNetwork::new(categories, &edges, &test_table()).unwrap();

        assert_eq!(network.population(), 4);
        assert_eq!(network.edge_count(), 3);
        assert_eq!(network.partners(PersonId(0)), &[PersonId(1), PersonId(2), PersonId(3)]);
        assert_eq!(network.partners(PersonId(3)), &[PersonId(0)]);
        assert_eq!(network.degree(PersonId(1)), 1);
        assert!((network.mean_degree() - 1.5).abs() < 1e-12);
        assert_eq!(network.edges().count(), 3);
    }

    #[test]
    fn active_partners_skip_the_dead() {
        let categories = vec![Category::F_HETERO, Category::M_HETERO, Category::M_BI];
        let edges = ids(&[(0, 1), (0, 2)]);
        let network = ContactNetwork::new(categories, &edges, &test_table()).unwrap();
        let states = [DiseaseState::Susceptible, DiseaseState::Dead, DiseaseState::DiagnosedArt];
        let active: Vec<PersonId> = network.active_partners(PersonId(0), &states).collect();
        assert_eq!(active, vec![PersonId(2)]);
    }

    #[test]
    fn rejects_malformed_edges() {
        let table = test_table();
        let categories = vec![Category::M_HOMO; 3];
        for bad in [&[(0, 0)][..], &[(0, 1), (1, 0)][..], &[(0, 7)][..]] {
            let result = ContactNetwork::new(categories.clone(), &ids(bad), &table);
            assert!(result.unwrap_err().is_configuration(), "{bad:?}");
        }
    }

    #[test]
    fn rejects_categories_outside_the_table() {
        let table = ParameterTable::new([crate::parameters::PairEntry {
            a: Category::M_HOMO,
            b: Category::M_HOMO,
            parameters: PairParameters {
                condom_usage: 0.0,
                condom_efficiency: 0.0,
                base_transmission_probability: 0.1,
            },
        }])
        .unwrap();

        let unknown = ContactNetwork::new(vec![Category::M_HOMO, Category::F_BI], &[], &table);
        assert!(unknown.unwrap_err().is_configuration());

        let ok = ContactNetwork::new(vec![Category::M_HOMO; 2], &ids(&[(0, 1)]), &table);
        assert!(ok.is_ok());
    }
}
