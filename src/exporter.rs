//! Depth-first serialisation of the persisted hierarchy into flat CSV.
//!
//! One export run produces three listings: vessel details, the species
//! reference (species list stacked with individual species), and the
//! combined hierarchy walked root-first down to the leaf measurements.
//! Each output row carries the record-type discriminator column and
//! every declared column after it; the identifier columns in front are
//! used for grouping the traversal and then dropped. Nulls become empty
//! fields, rows end with a newline, quoting is minimal.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde_json::Value;
use tracing::info;

use crate::error::ReportError;
use crate::records::Level;
use crate::store::{RecordStore, Row};

/// Locations of the three files one export run writes.
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub vessel_details: PathBuf,
    pub species_listing: PathBuf,
    pub hierarchy: PathBuf,
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// The output fields of one row: the discriminator column and everything
/// after it in the level's declared order.
fn projected_fields(level: Level, row: &Row) -> Result<Vec<String>, ReportError> {
    let columns = level.columns();
    let start = columns
        .iter()
        .position(|c| *c == level.record_type_column())
        .ok_or_else(|| {
            ReportError::General(format!(
                "level {} declares no record-type column",
                level.table()
            ))
        })?;
    Ok(columns[start..]
        .iter()
        .map(|c| field_text(row.get(*c)))
        .collect())
}

fn write_rows<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    level: Level,
    rows: &[Row],
) -> Result<(), ReportError> {
    for row in rows {
        writer.write_record(projected_fields(level, row)?)?;
    }
    Ok(())
}

fn open_writer(path: &Path) -> Result<csv::Writer<std::fs::File>, ReportError> {
    Ok(csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?)
}

/// Pull the persisted hierarchy back out of the store and write the
/// three listings under `dir`, named `{base}_HVD.csv`, `{base}_HSL.csv`
/// and `{base}_H2.csv`.
pub fn export(
    store: &dyn RecordStore,
    dir: &Path,
    base: &str,
) -> Result<ExportPaths, ReportError> {
    let paths = ExportPaths {
        vessel_details: dir.join(format!("{base}_HVD.csv")),
        species_listing: dir.join(format!("{base}_HSL.csv")),
        hierarchy: dir.join(format!("{base}_H2.csv")),
    };

    // Vessel details.
    let mut hvd = open_writer(&paths.vessel_details)?;
    write_rows(&mut hvd, Level::VesselDetails, &store.select(Level::VesselDetails)?)?;
    hvd.flush()?;

    // Species reference: list rows first, then the individual species.
    let mut hsl = open_writer(&paths.species_listing)?;
    write_rows(&mut hsl, Level::SpeciesList, &store.select(Level::SpeciesList)?)?;
    write_rows(
        &mut hsl,
        Level::IndividualSpecies,
        &store.select(Level::IndividualSpecies)?,
    )?;
    hsl.flush()?;

    // The combined hierarchy, depth-first.
    let tables: Vec<Vec<Row>> = Level::HIERARCHY
        .iter()
        .map(|l| store.select(*l))
        .collect::<Result<_, _>>()?;

    // Graph over (level index, row index); edges parent → child through
    // the child's parent-reference column.
    let mut graph: DiGraph<(usize, usize), ()> = DiGraph::new();
    let mut by_id: HashMap<(usize, i64), NodeIndex> = HashMap::new();
    let mut level_nodes: Vec<Vec<NodeIndex>> = Vec::with_capacity(tables.len());
    for (li, rows) in tables.iter().enumerate() {
        let mut nodes = Vec::with_capacity(rows.len());
        for (ri, row) in rows.iter().enumerate() {
            let node = graph.add_node((li, ri));
            if let Some(id) = row.get(Level::HIERARCHY[li].id_column()).and_then(Value::as_i64) {
                by_id.insert((li, id), node);
            }
            nodes.push(node);
        }
        level_nodes.push(nodes);
    }
    for li in 1..tables.len() {
        let Some(parent_column) = Level::HIERARCHY[li].parent_id_column() else {
            continue;
        };
        for (ri, row) in tables[li].iter().enumerate() {
            if let Some(parent_id) = row.get(parent_column).and_then(Value::as_i64) {
                if let Some(&parent) = by_id.get(&(li - 1, parent_id)) {
                    graph.add_edge(parent, level_nodes[li][ri], ());
                }
            }
        }
    }

    let mut h2 = open_writer(&paths.hierarchy)?;
    let mut visited: HashSet<NodeIndex> = HashSet::new();
    for &root in level_nodes.first().map(Vec::as_slice).unwrap_or(&[]) {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            let (li, ri) = graph[node];
            let level = Level::HIERARCHY[li];
            h2.write_record(projected_fields(level, &tables[li][ri])?)?;
            // neighbors_directed yields the most recently added edge
            // first, so pushing in that order pops children back in
            // natural row order.
            for child in graph.neighbors_directed(node, Direction::Outgoing) {
                if !visited.contains(&child) {
                    stack.push(child);
                }
            }
        }
    }
    h2.flush()?;

    info!(
        hierarchy_rows = visited.len(),
        base, "export written"
    );

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// One root, two second-level children, one grandchild under the
    /// first child only.
    fn seeded_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        let de = store
            .insert(
                Level::Design,
                &row(&[("DErecordType", json!("DE")), ("DEstratumName", json!("root"))]),
            )
            .unwrap();
        let sd1 = store
            .insert(
                Level::SamplingDetails,
                &row(&[
                    ("DEid", json!(de)),
                    ("SDrecordType", json!("SD")),
                    ("SDcountry", json!("child1")),
                ]),
            )
            .unwrap();
        store
            .insert(
                Level::FishingTrip,
                &row(&[
                    ("SDid", json!(sd1)),
                    ("FTrecordType", json!("FT")),
                    ("FTunitName", json!("grandchild")),
                ]),
            )
            .unwrap();
        store
            .insert(
                Level::SamplingDetails,
                &row(&[
                    ("DEid", json!(de)),
                    ("SDrecordType", json!("SD")),
                    ("SDcountry", json!("child2")),
                ]),
            )
            .unwrap();
        store
    }

    #[test]
    fn hierarchy_is_written_depth_first() {
        let store = seeded_store();
        let dir = tempfile::tempdir().unwrap();
        let paths = export(&store, dir.path(), "run").unwrap();

        let text = std::fs::read_to_string(&paths.hierarchy).unwrap();
        let markers: Vec<&str> = text
            .lines()
            .map(|l| l.split(',').nth(1).unwrap())
            .collect();
        assert_eq!(markers, vec!["", "child1", "", "child2"]);
        let kinds: Vec<&str> = text.lines().map(|l| l.split(',').next().unwrap()).collect();
        assert_eq!(kinds, vec!["DE", "SD", "FT", "SD"]);
    }

    #[test]
    fn identifier_columns_are_dropped_and_nulls_are_empty() {
        let store = seeded_store();
        let dir = tempfile::tempdir().unwrap();
        let paths = export(&store, dir.path(), "run").unwrap();

        let text = std::fs::read_to_string(&paths.hierarchy).unwrap();
        let first = text.lines().next().unwrap();
        // DE row: discriminator first, no numeric id anywhere before it.
        assert!(first.starts_with("DE,"));
        let fields: Vec<&str> = first.split(',').collect();
        assert_eq!(fields.len(), Level::Design.columns().len() - 1);
        // Unset payload columns render as empty fields.
        assert!(fields[1].is_empty());
    }

    #[test]
    fn species_listing_stacks_list_then_individuals() {
        let mut store = seeded_store();
        store
            .insert(
                Level::SpeciesList,
                &row(&[("SLrecordType", json!("SL")), ("SLcountry", json!("IS"))]),
            )
            .unwrap();
        store
            .insert(
                Level::IndividualSpecies,
                &row(&[("ISrecordType", json!("IS")), ("IScommercialTaxon", json!(127023))]),
            )
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let paths = export(&store, dir.path(), "run").unwrap();
        let text = std::fs::read_to_string(&paths.species_listing).unwrap();
        let kinds: Vec<&str> = text.lines().map(|l| l.split(',').next().unwrap()).collect();
        assert_eq!(kinds, vec!["SL", "IS"]);
        assert!(text.contains("127023"));
    }

    #[test]
    fn all_three_files_are_written() {
        let store = seeded_store();
        let dir = tempfile::tempdir().unwrap();
        let paths = export(&store, dir.path(), "run").unwrap();
        assert!(paths.vessel_details.exists());
        assert!(paths.species_listing.exists());
        assert!(paths.hierarchy.exists());
    }
}
