/*!

Loads a contact network exported as two CSV files.

`nodes.csv`:
```text
id,gender,orientation
a17,m,homo
b02,female,heterosexual
```

`edges.csv`:
```text
source,target
a17,b02
```

Ids are arbitrary strings; people receive dense `PersonId`s in the order their node rows
appear.

*/

use crate::{
    error::SimError,
    network::ContactNetwork,
    parameters::ParameterTable,
    people::{Category, Gender, Orientation},
    PersonId,
};
use log::info;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::{fs::File, io::Read, path::Path};

#[derive(Debug, Deserialize)]
struct NodeRecord {
    id: String,
    gender: String,
    orientation: String,
}

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    source: String,
    target: String,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Reads a network from node and edge CSV sources.
pub fn read_network<N: Read, E: Read>(
    nodes: N,
    edges: E,
    table: &ParameterTable,
) -> Result<ContactNetwork, SimError> {
    let mut ids: FxHashMap<String, PersonId> = FxHashMap::default();
    let mut categories = Vec::new();

    for (row, record) in csv_reader(nodes).deserialize::<NodeRecord>().enumerate() {
        let record = record?;
        let gender: Gender = record.gender.parse()?;
        let orientation: Orientation = record.orientation.parse()?;
        let person_id = PersonId(categories.len());
        if ids.insert(record.id.clone(), person_id).is_some() {
            return Err(SimError::config(format!(
                "node row {} repeats id `{}`",
                row + 1,
                record.id
            )));
        }
        categories.push(Category::new(gender, orientation));
    }

    let lookup = |id: &str, row: usize| {
        ids.get(id).copied().ok_or_else(|| {
            SimError::config(format!("edge row {row} references unknown node `{id}`"))
        })
    };

    let mut edge_list = Vec::new();
    for (row, record) in csv_reader(edges).deserialize::<EdgeRecord>().enumerate() {
        let record = record?;
        edge_list.push((lookup(&record.source, row + 1)?, lookup(&record.target, row + 1)?));
    }

    ContactNetwork::new(categories, &edge_list, table)
}

/// Reads a network from node and edge CSV files.
pub fn load_network(
    nodes_path: &Path,
    edges_path: &Path,
    table: &ParameterTable,
) -> Result<ContactNetwork, SimError> {
    let network = read_network(File::open(nodes_path)?, File::open(edges_path)?, table)?;
    info!(
        "loaded network from {} and {}: {} people, {} edges",
        nodes_path.display(),
        edges_path.display(),
        network.population(),
        network.edge_count()
    );
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::tests::test_table;
    use std::io::Write;

    const NODES: &str = "id,gender,orientation\nn1,m,homo\nn2,M,bi\nn3,female,heterosexual\n";
    const NO_EDGES: &str = "source,target\n";

    #[test]
    fn reads_nodes_and_edges() {
        let edges = "source,target\nn1,n2\n n2 , n3 \n";
        let network = read_network(NODES.as_bytes(), edges.as_bytes(), &test_table()).unwrap();

        assert_eq!(network.population(), 3);
        assert_eq!(network.edge_count(), 2);
        assert_eq!(network.category(PersonId(0)), Category::M_HOMO);
        assert_eq!(network.category(PersonId(1)), Category::M_BI);
        assert_eq!(network.category(PersonId(2)), Category::F_HETERO);
        assert_eq!(network.partners(PersonId(1)), &[PersonId(0), PersonId(2)]);
    }

    #[test]
    fn unknown_edge_endpoint_is_a_configuration_error() {
        let edges = "source,target\nn1,n9\n";
        let error = read_network(NODES.as_bytes(), edges.as_bytes(), &test_table()).unwrap_err();
        assert!(error.is_configuration());
        assert!(error.to_string().contains("n9"));
    }

    #[test]
    fn unknown_category_is_a_configuration_error() {
        let nodes = "id,gender,orientation\nn1,m,pan\n";
        let error = read_network(nodes.as_bytes(), NO_EDGES.as_bytes(), &test_table()).unwrap_err();
        assert!(error.is_configuration());
    }

    #[test]
    fn repeated_ids_are_rejected() {
        let nodes = "id,gender,orientation\nn1,m,homo\nn1,f,bi\n";
        let error = read_network(nodes.as_bytes(), NO_EDGES.as_bytes(), &test_table()).unwrap_err();
        assert!(error.is_configuration());
    }

    #[test]
    fn missing_column_is_a_csv_error() {
        let nodes = "id,gender\nn1,m\n";
        let error = read_network(nodes.as_bytes(), NO_EDGES.as_bytes(), &test_table()).unwrap_err();
        assert!(matches!(error, SimError::Csv(_)));
    }

    #[test]
    fn loads_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let nodes_path = dir.path().join("nodes.csv");
        let edges_path = dir.path().join("edges.csv");
        File::create(&nodes_path).unwrap().write_all(NODES.as_bytes()).unwrap();
        File::create(&edges_path).unwrap().write_all(b"source,target\nn3,n2\n").unwrap();

        let network = load_network(&nodes_path, &edges_path, &test_table()).unwrap();
        assert_eq!(network.edge_count(), 1);

        let missing = load_network(&dir.path().join("absent.csv"), &edges_path, &test_table());
        assert!(matches!(missing, Err(SimError::Io(_))));
    }
}
