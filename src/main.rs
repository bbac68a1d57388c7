use log::info;

use roadsnap::route::transition::{remove_nearby_points, Matcher};
use roadsnap::{codec, MatchConfig};

const USAGE: &str = "usage: roadsnap <network.tsv> <trace.tsv> <matched.json> [graph.json]";

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let network_path = args.next().expect(USAGE);
    let trace_path = args.next().expect(USAGE);
    let matched_path = args.next().expect(USAGE);
    let graph_path = args.next();

    let graph = match codec::read_road_network(&network_path) {
        Ok(graph) => graph,
        Err(err) => {
            eprintln!("Failed to build road network: {err}");
            std::process::exit(1);
        }
    };
    info!("Road network ready: {graph:?}");

    let points = match codec::read_gps_trace(&trace_path) {
        Ok(points) => points,
        Err(err) => {
            eprintln!("Failed to parse GPS trace: {err}");
            std::process::exit(1);
        }
    };

    let config = MatchConfig::default();
    let points = remove_nearby_points(&points, config.nearby_threshold());
    info!("Matching {} observations after pre-filtering", points.len());

    let matcher = Matcher::with_config(&graph, config);
    let matched = match matcher.map_match(&points) {
        Ok(matched) => matched,
        Err(err) => {
            eprintln!("Matching failed: {err}");
            std::process::exit(1);
        }
    };
    info!("Matched {} edges", matched.len());

    if let Err(err) = codec::save_edges(&matched, &matched_path) {
        eprintln!("Failed to save matched edges: {err}");
        std::process::exit(1);
    }

    if let Some(graph_path) = graph_path {
        if let Err(err) = codec::save_graph(&graph, &graph_path) {
            eprintln!("Failed to save graph snapshot: {err}");
            std::process::exit(1);
        }
    }
}
