use std::cmp::Ordering;
use std::collections::BinaryHeap;

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHashSet};

/// Traversal orientation of a shortest-path search.
///
/// `Reverse` expands *incoming* edges, running Dijkstra backwards from a
/// target. The matcher uses it so a single cached search per candidate
/// answers "how far from here?" for an entire layer of predecessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchDirection {
    Forward,
    Reverse,
}

impl SearchDirection {
    #[inline]
    pub(crate) fn adjacency(self) -> Direction {
        match self {
            SearchDirection::Forward => Direction::Outgoing,
            SearchDirection::Reverse => Direction::Incoming,
        }
    }
}

/// Edge relaxation cost model: pure arc length, or arc length divided by
/// the edge speed (the graph's fallback average speed when an edge
/// declares none).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CostMetric {
    Distance,
    TravelTime,
}

/// Entry in the search frontier. Expansion order is ascending cumulative
/// cost, ties broken by node identifier (lexicographic) so the expansion
/// sequence never depends on map iteration order.
#[derive(Debug, Clone)]
pub(crate) struct FrontierEntry {
    pub cost: f64,
    pub id: String,
    pub node: NodeIndex,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.id == other.id
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops the maximum; invert so the cheapest entry (and,
        // on equal cost, the lexicographically smallest id) pops first.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Resumable single-source Dijkstra state.
///
/// Tagged with the largest budget for which expansion is known complete. A
/// later query with a bigger budget resumes the retained frontier: settled
/// nodes are never re-expanded, so the work done under the old budget is
/// never repeated.
#[derive(Debug)]
pub(crate) struct SearchState {
    pub source: NodeIndex,
    pub frontier: BinaryHeap<FrontierEntry>,
    pub settled: FxHashSet<NodeIndex>,
    pub distances: FxHashMap<NodeIndex, f64>,
    pub parents: FxHashMap<NodeIndex, (NodeIndex, EdgeIndex)>,
    pub completed_budget: f64,
}

impl SearchState {
    pub fn seeded(source: NodeIndex, source_id: String) -> Self {
        let mut frontier = BinaryHeap::with_capacity(64);
        frontier.push(FrontierEntry {
            cost: 0.0,
            id: source_id,
            node: source,
        });

        let mut distances = FxHashMap::default();
        distances.insert(source, 0.0);

        SearchState {
            source,
            frontier,
            settled: FxHashSet::default(),
            distances,
            parents: FxHashMap::default(),
            completed_budget: f64::NEG_INFINITY,
        }
    }

    /// The settled distance to `target`, if it was reached within `budget`.
    pub fn distance_within(&self, target: NodeIndex, budget: f64) -> Option<f64> {
        if !self.settled.contains(&target) {
            return None;
        }

        self.distances
            .get(&target)
            .copied()
            .filter(|cost| *cost <= budget)
    }
}
