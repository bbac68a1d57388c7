use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use geo::{LineString, Point};
use log::info;
use wkt::TryFromWkt;

use crate::codec::error::CodecError;
use crate::route::graph::Graph;

/// Column layout of the road-network description.
const ID: usize = 0;
const SOURCE: usize = 1;
const TARGET: usize = 2;
const TWO_WAY: usize = 3;
const SPEED: usize = 4;
const GEOMETRY: usize = 6;

/// Reads a tab-delimited road-network description and builds the
/// preprocessed [`Graph`].
pub fn read_road_network(path: impl AsRef<Path>) -> crate::Result<Graph> {
    build_road_network(File::open(path).map_err(CodecError::Io)?)
}

/// Builds the graph from a tab-delimited reader: one edge per row, with a
/// WKT `LINESTRING` geometry column and a flag synthesising the reverse
/// edge (own identifier, reversed polyline) for two-way roads. The header
/// row is skipped; any malformed row aborts the build.
pub fn build_road_network(input: impl Read) -> crate::Result<Graph> {
    let mut rows = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(input);

    let mut graph = Graph::new();
    for (row_index, row) in rows.records().enumerate() {
        let row = row.map_err(CodecError::Csv)?;
        // Header plus one-based numbering.
        let line = row_index + 2;

        let id = field(&row, line, ID, "id")?;
        let source = field(&row, line, SOURCE, "source")?;
        let target = field(&row, line, TARGET, "target")?;
        let speed = parse_number(field(&row, line, SPEED, "speed")?, line)?;
        let geometry = parse_geometry(field(&row, line, GEOMETRY, "geometry")?, line)?;

        ensure_node(&mut graph, source, Point::from(geometry.0[0]))?;
        ensure_node(&mut graph, target, Point::from(geometry.0[geometry.0.len() - 1]))?;
        graph.add_edge(id, source, target, speed, geometry.clone())?;

        if field(&row, line, TWO_WAY, "two_way")? == "1" {
            let reversed = LineString::new(geometry.0.iter().rev().copied().collect());
            graph.add_edge(&format!("{id}_reverse"), target, source, speed, reversed)?;
        }
    }

    graph.preprocess();
    info!(
        "Road network built: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    Ok(graph)
}

fn ensure_node(graph: &mut Graph, id: &str, position: Point<f64>) -> crate::Result<()> {
    if !graph.contains_node(id) {
        graph.add_node(id, position)?;
    }
    Ok(())
}

fn field<'r>(
    row: &'r StringRecord,
    line: usize,
    index: usize,
    name: &'static str,
) -> Result<&'r str, CodecError> {
    row.get(index)
        .ok_or(CodecError::MissingField { line, field: name })
}

fn parse_number(value: &str, line: usize) -> Result<f64, CodecError> {
    value.trim().parse().map_err(|_| CodecError::InvalidNumber {
        line,
        value: value.to_string(),
    })
}

fn parse_geometry(value: &str, line: usize) -> Result<LineString<f64>, CodecError> {
    let geometry: LineString<f64> =
        LineString::try_from_wkt_str(value).map_err(|err| CodecError::InvalidGeometry {
            line,
            reason: format!("{err:?}"),
        })?;

    if geometry.0.len() < 2 {
        return Err(CodecError::InvalidGeometry {
            line,
            reason: "polyline needs at least two vertices".to_string(),
        });
    }

    Ok(geometry)
}
