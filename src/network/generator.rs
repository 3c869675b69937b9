use crate::{
    context::Context,
    define_rng,
    error::SimError,
    network::ContactNetwork,
    parameters::ParameterTable,
    people::Category,
    property::Property,
    random::ContextRandomExt,
    PersonId,
};
use log::{info, trace};
use rand_distr::Poisson;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

define_rng!(NetworkRng);

/// Give up filling a person's degree after this many rejected draws per missing partner.
const ATTEMPTS_PER_PARTNER: usize = 20;

/// Parameters of a synthetic network. The same `NetworkSpec` always produces the same network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSpec {
    pub num_nodes: usize,
    pub mean_degree: f64,
    pub network_seed: u64,
    /// Relative frequency of each category; categories not listed never occur.
    pub category_weights: BTreeMap<Category, f64>,
}

impl Default for NetworkSpec {
    fn default() -> Self {
        NetworkSpec {
            num_nodes: 1000,
            mean_degree: 3.0,
            network_seed: 67,
            category_weights: BTreeMap::from([
                (Category::M_HETERO, 0.44),
                (Category::M_HOMO, 0.03),
                (Category::M_BI, 0.02),
                (Category::F_HETERO, 0.46),
                (Category::F_HOMO, 0.02),
                (Category::F_BI, 0.03),
            ]),
        }
    }
}

/// Generates a random network in which partners are always mutually compatible (see
/// `Category::is_compatible_with`) and every edge has transmission parameters in `table`.
///
/// Each person draws a target degree from Poisson(`mean_degree`). People are then visited in id
/// order and matched with random compatible people who still have room, skipping self-loops and
/// repeated pairs. Targets that cannot be met are left short.
pub fn generate_network(
    spec: &NetworkSpec,
    table: &ParameterTable,
) -> Result<ContactNetwork, SimError> {
    if !spec.mean_degree.is_finite() || spec.mean_degree < 0.0 {
        return Err(SimError::config(format!(
            "mean_degree must be a non-negative number, got {}",
            spec.mean_degree
        )));
    }
    #[allow(clippy::cast_precision_loss)]
    if spec.mean_degree > 0.0 && spec.mean_degree >= spec.num_nodes as f64 {
        return Err(SimError::config(format!(
            "mean_degree {} must be below the number of nodes ({})",
            spec.mean_degree, spec.num_nodes
        )));
    }
    if spec.category_weights.values().any(|weight| !weight.is_finite() || *weight < 0.0) {
        return Err(SimError::config("category weights must be non-negative numbers"));
    }

    let mut context = Context::new();
    context.init_random(spec.network_seed);

    let (choices, weights): (Vec<Category>, Vec<f64>) = spec.category_weights
        .iter()
        .map(|(category, weight)| (*category, *weight))
        .unzip();
    let mut categories = Vec::with_capacity(spec.num_nodes);
    for _ in 0..spec.num_nodes {
        categories.push(choices[context.sample_weighted::<NetworkRng, f64>(&weights)?]);
    }
    trace!("assigned categories to {} people", categories.len());

    let targets = degree_targets(&mut context, spec)?;

    // For each category, everyone who could partner with it.
    let mut candidates: Vec<Vec<usize>> = vec![Vec::new(); Category::COUNT];
    for &category in Category::VALUES {
        candidates[category.index()] = categories
            .iter()
            .enumerate()
            .filter(|(_, other)| {
                category.is_compatible_with(**other) && table.contains_pair(category, **other)
            })
            .map(|(idx, _)| idx)
            .collect();
    }

    let mut degrees = vec![0usize; spec.num_nodes];
    let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();
    let mut edges: Vec<(PersonId, PersonId)> = Vec::new();

    for person in 0..spec.num_nodes {
        let pool = &candidates[categories[person].index()];
        if pool.is_empty() {
            continue;
        }
        let missing = targets[person].saturating_sub(degrees[person]);
        let mut attempts = ATTEMPTS_PER_PARTNER.saturating_mul(missing);
        while degrees[person] < targets[person] && attempts > 0 {
            attempts -= 1;
            let partner = pool[context.sample_range::<NetworkRng, _, usize>(0..pool.len())];
            if partner == person || degrees[partner] >= targets[partner] {
                continue;
            }
            if !seen.insert((person.min(partner), person.max(partner))) {
                continue;
            }
            degrees[person] += 1;
            degrees[partner] += 1;
            edges.push((PersonId(person), PersonId(partner)));
        }
    }

    let network = ContactNetwork::new(categories, &edges, table)?;
    info!(
        "generated network (seed {}): {} people, {} edges, mean degree {:.2}",
        spec.network_seed,
        network.population(),
        network.edge_count(),
        network.mean_degree()
    );
    Ok(network)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn degree_targets(context: &mut Context, spec: &NetworkSpec) -> Result<Vec<usize>, SimError> {
    if spec.mean_degree == 0.0 {
        return Ok(vec![0; spec.num_nodes]);
    }
    let poisson = Poisson::new(spec.mean_degree).map_err(|error| {
        SimError::config(format!("invalid mean_degree {}: {error}", spec.mean_degree))
    })?;
    Ok((0..spec.num_nodes)
        .map(|_| context.sample_distr::<NetworkRng, f64>(&poisson) as usize)
        .collect())
}
