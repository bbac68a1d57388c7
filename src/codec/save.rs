use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geo::Point;
use log::info;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use crate::codec::error::CodecError;
use crate::route::entity::Edge;
use crate::route::graph::Graph;

#[derive(Serialize)]
struct PositionRecord {
    longitude: f64,
    latitude: f64,
}

impl From<Point<f64>> for PositionRecord {
    fn from(value: Point<f64>) -> Self {
        PositionRecord {
            longitude: value.x(),
            latitude: value.y(),
        }
    }
}

#[derive(Serialize)]
struct EdgeRecord {
    id: String,
    source: String,
    target: String,
    speed: f64,
    length: f64,
    polyline: Vec<PositionRecord>,
}

impl From<&Edge> for EdgeRecord {
    fn from(edge: &Edge) -> Self {
        EdgeRecord {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            speed: edge.speed,
            length: edge.length,
            polyline: edge
                .geometry
                .0
                .iter()
                .map(|coord| PositionRecord::from(Point::from(*coord)))
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct NodeRecord {
    id: String,
    position: PositionRecord,
    in_edges: Vec<String>,
    out_edges: Vec<String>,
}

#[derive(Serialize)]
struct GraphRecord {
    nodes: BTreeMap<String, NodeRecord>,
    edges: BTreeMap<String, EdgeRecord>,
}

/// Serializes a matched edge sequence as pretty-printed JSON, in travel
/// order.
pub fn save_edges(edges: &[&Edge], path: impl AsRef<Path>) -> crate::Result<()> {
    let records = edges
        .iter()
        .map(|edge| EdgeRecord::from(*edge))
        .collect::<Vec<_>>();

    write_json(&records, path.as_ref())?;
    info!("Saved {} matched edges to {:?}", records.len(), path.as_ref());
    Ok(())
}

/// Serializes the full graph (nodes with sorted adjacency, edges with
/// geometry) as pretty-printed JSON. Key order is deterministic, so the
/// same graph always serializes byte-identically.
pub fn save_graph(graph: &Graph, path: impl AsRef<Path>) -> crate::Result<()> {
    let mut record = GraphRecord {
        nodes: BTreeMap::new(),
        edges: BTreeMap::new(),
    };

    for index in graph.graph.node_indices() {
        let node = &graph.graph[index];

        let mut in_edges = graph
            .graph
            .edges_directed(index, Direction::Incoming)
            .map(|edge| edge.weight().id.clone())
            .collect::<Vec<_>>();
        let mut out_edges = graph
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| edge.weight().id.clone())
            .collect::<Vec<_>>();
        in_edges.sort_unstable();
        out_edges.sort_unstable();

        record.nodes.insert(
            node.id.clone(),
            NodeRecord {
                id: node.id.clone(),
                position: node.position.into(),
                in_edges,
                out_edges,
            },
        );
    }

    for edge in graph.edges() {
        record.edges.insert(edge.id.clone(), edge.into());
    }

    write_json(&record, path.as_ref())?;
    info!("Saved graph snapshot to {:?}", path.as_ref());
    Ok(())
}

fn write_json(value: &impl Serialize, path: &Path) -> Result<(), CodecError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}
