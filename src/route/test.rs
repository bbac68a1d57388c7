use approx::assert_relative_eq;
use geo::{line_string, LineString, Point};

use crate::geo::offset;
use crate::route::dijkstra::{CostMetric, SearchDirection};
use crate::route::error::RouteError;
use crate::route::graph::Graph;

const ORIGIN: Point<f64> = Point(geo::Coord {
    x: 151.20,
    y: -33.90,
});

/// Straight two-vertex polyline between two metric offsets from [`ORIGIN`].
fn segment(from: (f64, f64), to: (f64, f64)) -> LineString<f64> {
    let a = offset(ORIGIN, from.0, from.1);
    let b = offset(ORIGIN, to.0, to.1);
    line_string![(x: a.x(), y: a.y()), (x: b.x(), y: b.y())]
}

/// A four-node chain: n0 -e0-> n1 -e1-> n2 -e2-> n3, 100m per edge.
fn chain() -> Graph {
    let mut graph = Graph::new();
    for (index, node) in ["n0", "n1", "n2", "n3"].iter().enumerate() {
        graph
            .add_node(node, offset(ORIGIN, index as f64 * 100.0, 0.0))
            .unwrap();
    }
    for (index, edge) in ["e0", "e1", "e2"].iter().enumerate() {
        let at = index as f64 * 100.0;
        graph
            .add_edge(
                edge,
                &format!("n{index}"),
                &format!("n{}", index + 1),
                0.0,
                segment((at, 0.0), (at + 100.0, 0.0)),
            )
            .unwrap();
    }
    graph.preprocess();
    graph
}

#[test]
fn duplicate_and_missing_identifiers_are_rejected() {
    let mut graph = Graph::new();
    graph.add_node("a", ORIGIN).unwrap();

    assert_eq!(
        graph.add_node("a", ORIGIN).unwrap_err(),
        RouteError::NodeExists("a".to_string())
    );
    assert_eq!(
        graph
            .add_edge("e", "a", "missing", 50.0, segment((0.0, 0.0), (100.0, 0.0)))
            .unwrap_err(),
        RouteError::NodeNotFound("missing".to_string())
    );

    graph.add_node("b", offset(ORIGIN, 100.0, 0.0)).unwrap();
    graph
        .add_edge("e", "a", "b", 50.0, segment((0.0, 0.0), (100.0, 0.0)))
        .unwrap();
    assert_eq!(
        graph
            .add_edge("e", "a", "b", 50.0, segment((0.0, 0.0), (100.0, 0.0)))
            .unwrap_err(),
        RouteError::EdgeExists("e".to_string())
    );

    assert_eq!(
        graph.node("nope").unwrap_err(),
        RouteError::NodeNotFound("nope".to_string())
    );
    assert_eq!(
        graph.edge("nope").unwrap_err(),
        RouteError::EdgeNotFound("nope".to_string())
    );
}

#[test]
fn edge_length_is_computed_from_the_polyline() {
    let graph = chain();
    let edge = graph.edge("e1").unwrap();

    assert_relative_eq!(edge.length, 100.0, max_relative = 1e-3);
    assert!(edge.length >= 0.0);
}

#[test]
fn parallel_edges_are_distinct() {
    let mut graph = Graph::new();
    graph.add_node("a", ORIGIN).unwrap();
    graph.add_node("b", offset(ORIGIN, 100.0, 0.0)).unwrap();

    // Two roads between the same endpoints, one twice as long.
    graph
        .add_edge("short", "a", "b", 0.0, segment((0.0, 0.0), (100.0, 0.0)))
        .unwrap();
    let detour = {
        let a = ORIGIN;
        let via = offset(ORIGIN, 50.0, 80.0);
        let b = offset(ORIGIN, 100.0, 0.0);
        line_string![(x: a.x(), y: a.y()), (x: via.x(), y: via.y()), (x: b.x(), y: b.y())]
    };
    graph.add_edge("detour", "a", "b", 0.0, detour).unwrap();
    graph.preprocess();

    assert_eq!(graph.edge_count(), 2);

    let path = graph
        .best_path("a", "b", 500.0, SearchDirection::Forward, CostMetric::Distance)
        .unwrap();
    assert_eq!(
        path.iter().map(|edge| edge.id.as_str()).collect::<Vec<_>>(),
        vec!["short"]
    );
}

#[test]
fn budgeted_distance_and_reachability() {
    let graph = chain();

    let total = graph
        .distance("n0", "n3", 1_000.0, SearchDirection::Forward, CostMetric::Distance)
        .unwrap();
    assert_relative_eq!(total, 300.0, max_relative = 1e-3);

    // Self-distance is zero.
    assert_eq!(
        graph
            .distance("n0", "n0", 10.0, SearchDirection::Forward, CostMetric::Distance)
            .unwrap(),
        0.0
    );

    // n3 sits past a 150m budget.
    assert_eq!(
        graph
            .distance("n0", "n3", 150.0, SearchDirection::Forward, CostMetric::Distance)
            .unwrap_err(),
        RouteError::NodeNotReachable {
            source: "n0".to_string(),
            target: "n3".to_string(),
        }
    );

    // Against the edge direction nothing is reachable.
    assert!(graph
        .distance("n3", "n0", 1_000.0, SearchDirection::Forward, CostMetric::Distance)
        .is_err());
}

#[test]
fn reverse_search_mirrors_forward_distances() {
    let graph = chain();

    let forward = graph
        .distance("n0", "n3", 1_000.0, SearchDirection::Forward, CostMetric::Distance)
        .unwrap();
    let reverse = graph
        .distance("n3", "n0", 1_000.0, SearchDirection::Reverse, CostMetric::Distance)
        .unwrap();

    assert_relative_eq!(forward, reverse, max_relative = 1e-12);
}

#[test]
fn cache_extension_matches_a_fresh_query() {
    let cached = chain();
    let fresh = chain();

    // Warm the cache with a budget that settles only part of the chain,
    // then extend. Distances must be indistinguishable from a graph that
    // ran the large budget directly.
    let _ = cached.distance("n0", "n3", 150.0, SearchDirection::Forward, CostMetric::Distance);

    for target in ["n0", "n1", "n2", "n3"] {
        let extended =
            cached.distance("n0", target, 1_000.0, SearchDirection::Forward, CostMetric::Distance);
        let direct =
            fresh.distance("n0", target, 1_000.0, SearchDirection::Forward, CostMetric::Distance);
        assert_eq!(extended, direct, "target {target}");
    }

    // Shrinking the budget afterwards still respects it.
    assert!(cached
        .distance("n0", "n3", 150.0, SearchDirection::Forward, CostMetric::Distance)
        .is_err());
    assert!(cached
        .distance("n0", "n1", 150.0, SearchDirection::Forward, CostMetric::Distance)
        .is_ok());
}

#[test]
fn travel_time_uses_declared_or_fallback_speed() {
    let mut graph = Graph::new();
    graph.add_node("a", ORIGIN).unwrap();
    graph.add_node("b", offset(ORIGIN, 100.0, 0.0)).unwrap();
    graph.add_node("c", offset(ORIGIN, 200.0, 0.0)).unwrap();
    graph
        .add_edge("fast", "a", "b", 25.0, segment((0.0, 0.0), (100.0, 0.0)))
        .unwrap();
    // No declared speed: falls back to the graph average of 50.
    graph
        .add_edge("unknown", "b", "c", 0.0, segment((100.0, 0.0), (200.0, 0.0)))
        .unwrap();
    graph.preprocess();

    let time = graph
        .distance("a", "c", 100.0, SearchDirection::Forward, CostMetric::TravelTime)
        .unwrap();
    assert_relative_eq!(time, 100.0 / 25.0 + 100.0 / 50.0, max_relative = 1e-3);

    let mut slow = Graph::new().with_average_speed(10.0);
    slow.add_node("a", ORIGIN).unwrap();
    slow.add_node("b", offset(ORIGIN, 100.0, 0.0)).unwrap();
    slow.add_edge("unknown", "a", "b", 0.0, segment((0.0, 0.0), (100.0, 0.0)))
        .unwrap();
    let time = slow
        .distance("a", "b", 100.0, SearchDirection::Forward, CostMetric::TravelTime)
        .unwrap();
    assert_relative_eq!(time, 100.0 / 10.0, max_relative = 1e-3);
}

#[test]
fn best_path_walks_the_chain_in_travel_order() {
    let graph = chain();

    let forward = graph
        .best_path("n0", "n3", 1_000.0, SearchDirection::Forward, CostMetric::Distance)
        .unwrap();
    assert_eq!(
        forward.iter().map(|edge| edge.id.as_str()).collect::<Vec<_>>(),
        vec!["e0", "e1", "e2"]
    );

    // A reverse search from the destination emits the same travel order
    // directly.
    let reverse = graph
        .best_path("n3", "n0", 1_000.0, SearchDirection::Reverse, CostMetric::Distance)
        .unwrap();
    assert_eq!(
        reverse.iter().map(|edge| edge.id.as_str()).collect::<Vec<_>>(),
        vec!["e0", "e1", "e2"]
    );
}

#[test]
fn equal_cost_paths_resolve_by_node_identifier() {
    let mut graph = Graph::new();
    let fork = offset(ORIGIN, 100.0, 0.0);
    let join = offset(ORIGIN, 200.0, 0.0);

    graph.add_node("a", ORIGIN).unwrap();
    // Two middle nodes at the same position so both branches have
    // bit-identical costs; only the identifier can break the tie.
    graph.add_node("b", fork).unwrap();
    graph.add_node("c", fork).unwrap();
    graph.add_node("d", join).unwrap();

    let first_leg = segment((0.0, 0.0), (100.0, 0.0));
    let second_leg = segment((100.0, 0.0), (200.0, 0.0));
    graph.add_edge("a-b", "a", "b", 0.0, first_leg.clone()).unwrap();
    graph.add_edge("a-c", "a", "c", 0.0, first_leg).unwrap();
    graph.add_edge("b-d", "b", "d", 0.0, second_leg.clone()).unwrap();
    graph.add_edge("c-d", "c", "d", 0.0, second_leg).unwrap();
    graph.preprocess();

    // "b" sorts before "c", so the b-branch settles first and keeps the
    // parent pointer.
    let path = graph
        .best_path("a", "d", 1_000.0, SearchDirection::Forward, CostMetric::Distance)
        .unwrap();
    assert_eq!(
        path.iter().map(|edge| edge.id.as_str()).collect::<Vec<_>>(),
        vec!["a-b", "b-d"]
    );
}

#[test]
fn nodes_within_filters_to_the_exact_circle() {
    let graph = chain();

    let near = graph.nodes_within(offset(ORIGIN, 10.0, 0.0), 120.0);
    let ids = near.iter().map(|node| node.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["n0", "n1"]);

    // n0 and n2 fall inside the bounding square of this probe but outside
    // the circle; only n1 survives the distance filter.
    let trimmed = graph.nodes_within(offset(ORIGIN, 100.0, 90.0), 120.0);
    let ids = trimmed.iter().map(|node| node.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["n1"]);
}

#[test]
fn edge_index_finds_long_edges_away_from_vertices() {
    let mut graph = Graph::new();
    graph.add_node("a", ORIGIN).unwrap();
    graph.add_node("b", offset(ORIGIN, 2_000.0, 0.0)).unwrap();
    // A single 2km edge with no interior vertices.
    graph
        .add_edge("long", "a", "b", 0.0, segment((0.0, 0.0), (2_000.0, 0.0)))
        .unwrap();
    graph.preprocess();

    // Probe the middle of the edge, far from either endpoint: synthetic
    // samples must make it discoverable.
    let found = graph.edges_in_square(offset(ORIGIN, 1_000.0, 60.0), 100.0);
    assert_eq!(found.len(), 1);
}
