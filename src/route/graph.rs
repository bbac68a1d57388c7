use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};

use geo::{LineString, Point};
use log::{debug, info};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

use crate::geo::{bounding_square, distance, sample_line_string};
use crate::index::RangeTree;
use crate::route::dijkstra::{CostMetric, FrontierEntry, SearchDirection, SearchState};
use crate::route::entity::{Edge, Node};
use crate::route::error::RouteError;

/// Fallback free-flow speed for edges that declare none, used by
/// travel-time costing.
pub const DEFAULT_AVERAGE_SPEED: f64 = 50.0;

/// Maximum spacing of synthetic samples placed along edge polylines when
/// building the edge index, in meters. Keeps long, nearly-straight edges
/// discoverable by box queries anywhere along their length.
pub const INDEX_SAMPLE_SPACING: f64 = 50.0;

type CacheKey = (NodeIndex, SearchDirection, CostMetric);

/// A directed road multigraph with spatial indexes and budgeted,
/// lazily-cached shortest-path queries.
///
/// Built once by ingestion, then read-only: the only mutation after
/// [`Graph::preprocess`] is the internal per-(source, direction, metric)
/// search cache, which is mutex-guarded and safe to share across threads
/// matching independent trajectories.
pub struct Graph {
    pub(crate) graph: DiGraph<Node, Edge>,
    nodes: FxHashMap<String, NodeIndex>,
    edges: FxHashMap<String, EdgeIndex>,

    node_index: Option<RangeTree<NodeIndex>>,
    edge_index: Option<RangeTree<EdgeIndex>>,

    cache: Mutex<FxHashMap<CacheKey, Arc<Mutex<SearchState>>>>,
    average_speed: f64,
}

impl Debug for Graph {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Graph with {} nodes and {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        )
    }
}

impl Default for Graph {
    fn default() -> Self {
        Graph::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            graph: DiGraph::new(),
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            node_index: None,
            edge_index: None,
            cache: Mutex::new(FxHashMap::default()),
            average_speed: DEFAULT_AVERAGE_SPEED,
        }
    }

    /// Overrides the fallback speed used by travel-time costing for edges
    /// without a declared speed.
    pub fn with_average_speed(mut self, speed: f64) -> Self {
        self.average_speed = speed;
        self
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Registers a node. Fails with [`RouteError::NodeExists`] when the
    /// identifier is already taken.
    pub fn add_node(&mut self, id: &str, position: Point<f64>) -> Result<NodeIndex, RouteError> {
        if self.nodes.contains_key(id) {
            return Err(RouteError::NodeExists(id.to_string()));
        }

        let index = self.graph.add_node(Node::new(id, position));
        self.nodes.insert(id.to_string(), index);
        Ok(index)
    }

    /// Registers a directed edge with its road geometry. The edge length is
    /// computed from the polyline here, once.
    pub fn add_edge(
        &mut self,
        id: &str,
        source: &str,
        target: &str,
        speed: f64,
        geometry: LineString<f64>,
    ) -> Result<EdgeIndex, RouteError> {
        if self.edges.contains_key(id) {
            return Err(RouteError::EdgeExists(id.to_string()));
        }
        let source_index = self.node_index_of(source)?;
        let target_index = self.node_index_of(target)?;

        let edge = Edge::new(id, source, target, speed, geometry);
        let index = self.graph.add_edge(source_index, target_index, edge);
        self.edges.insert(id.to_string(), index);
        Ok(index)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Result<&Node, RouteError> {
        self.node_index_of(id).map(|index| &self.graph[index])
    }

    pub fn edge(&self, id: &str) -> Result<&Edge, RouteError> {
        match self.edges.get(id) {
            Some(index) => Ok(&self.graph[*index]),
            None => Err(RouteError::EdgeNotFound(id.to_string())),
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_indices().map(|index| &self.graph[index])
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_indices().map(|index| &self.graph[index])
    }

    #[inline]
    pub(crate) fn node_at(&self, index: NodeIndex) -> &Node {
        &self.graph[index]
    }

    #[inline]
    pub(crate) fn edge_at(&self, index: EdgeIndex) -> &Edge {
        &self.graph[index]
    }

    #[inline]
    pub(crate) fn endpoints(&self, index: EdgeIndex) -> (NodeIndex, NodeIndex) {
        self.graph
            .edge_endpoints(index)
            .expect("edge index issued by this graph")
    }

    fn node_index_of(&self, id: &str) -> Result<NodeIndex, RouteError> {
        match self.nodes.get(id) {
            Some(index) => Ok(*index),
            None => Err(RouteError::NodeNotFound(id.to_string())),
        }
    }

    /// Builds both spatial indexes: nodes by their own position, edges by
    /// polyline samples at most [`INDEX_SAMPLE_SPACING`] meters apart.
    ///
    /// Call once after the last node/edge is registered; the indexes are
    /// immutable and are rebuilt wholesale on a repeated call.
    pub fn preprocess(&mut self) {
        let node_samples = self
            .graph
            .node_indices()
            .map(|index| (self.graph[index].position, index))
            .collect::<Vec<_>>();
        self.node_index = Some(RangeTree::build(node_samples));

        let mut edge_samples = Vec::new();
        for index in self.graph.edge_indices() {
            for sample in sample_line_string(&self.graph[index].geometry, INDEX_SAMPLE_SPACING) {
                edge_samples.push((sample, index));
            }
        }
        let sample_count = edge_samples.len();
        self.edge_index = Some(RangeTree::build(edge_samples));

        info!(
            "Indexed {} nodes and {} edges ({} edge samples)",
            self.graph.node_count(),
            self.graph.edge_count(),
            sample_count
        );
    }

    /// Nodes whose position falls inside the square spanning `half_side`
    /// meters around `center`. Empty before [`Graph::preprocess`].
    pub(crate) fn nodes_in_square(&self, center: Point<f64>, half_side: f64) -> Vec<NodeIndex> {
        match &self.node_index {
            Some(index) => index.query(&bounding_square(center, half_side)),
            None => Vec::new(),
        }
    }

    /// Nodes within `radius` meters of `center`, ordered by identifier
    /// index. Empty before [`Graph::preprocess`].
    pub fn nodes_within(&self, center: Point<f64>, radius: f64) -> Vec<&Node> {
        self.nodes_in_square(center, radius)
            .into_iter()
            .map(|index| &self.graph[index])
            .filter(|node| distance(node.position, center) <= radius)
            .collect()
    }

    /// Edges with at least one index sample inside the square spanning
    /// `half_side` meters around `center`, each exactly once, ordered by
    /// edge index. Empty before [`Graph::preprocess`].
    pub(crate) fn edges_in_square(&self, center: Point<f64>, half_side: f64) -> Vec<EdgeIndex> {
        match &self.edge_index {
            Some(index) => index.query(&bounding_square(center, half_side)),
            None => Vec::new(),
        }
    }

    /// Shortest travel cost from `source` to `target` within `budget`.
    ///
    /// `direction` picks which adjacency is traversed: [`SearchDirection::
    /// Reverse`] expands incoming edges, answering "cost from `target`-side
    /// to the source of the search" without rebuilding per pair. Fails with
    /// [`RouteError::NodeNotReachable`] when the target is not settled
    /// within the budget.
    pub fn distance(
        &self,
        source: &str,
        target: &str,
        budget: f64,
        direction: SearchDirection,
        metric: CostMetric,
    ) -> Result<f64, RouteError> {
        let source_index = self.node_index_of(source)?;
        let target_index = self.node_index_of(target)?;

        self.reach(source_index, target_index, budget, direction, metric)
            .ok_or_else(|| RouteError::NodeNotReachable {
                source: source.to_string(),
                target: target.to_string(),
            })
    }

    /// The edge sequence of the shortest path between `source` and
    /// `target` within `budget`, in travel order.
    pub fn best_path(
        &self,
        source: &str,
        target: &str,
        budget: f64,
        direction: SearchDirection,
        metric: CostMetric,
    ) -> Result<Vec<&Edge>, RouteError> {
        let source_index = self.node_index_of(source)?;
        let target_index = self.node_index_of(target)?;

        let mut path = self
            .reconstruct(source_index, target_index, budget, direction, metric)
            .ok_or_else(|| RouteError::NodeNotReachable {
                source: source.to_string(),
                target: target.to_string(),
            })?;

        // The parent walk yields edges target-side first; forward searches
        // flip into travel order, reverse searches already are.
        if direction == SearchDirection::Forward {
            path.reverse();
        }

        Ok(path.into_iter().map(|index| &self.graph[index]).collect())
    }

    /// Settled cost to `target` from a (cached) search rooted at `source`,
    /// or `None` when not reachable within `budget`.
    pub(crate) fn reach(
        &self,
        source: NodeIndex,
        target: NodeIndex,
        budget: f64,
        direction: SearchDirection,
        metric: CostMetric,
    ) -> Option<f64> {
        self.with_search(source, direction, metric, budget, |state| {
            state.distance_within(target, budget)
        })
    }

    /// Edge indices of the shortest path, walking parent pointers from
    /// `target` back to `source`. For reverse searches this is forward
    /// travel order (target → … → source of the search); forward searches
    /// yield the reversed travel order.
    pub(crate) fn reconstruct(
        &self,
        source: NodeIndex,
        target: NodeIndex,
        budget: f64,
        direction: SearchDirection,
        metric: CostMetric,
    ) -> Option<Vec<EdgeIndex>> {
        self.with_search(source, direction, metric, budget, |state| {
            state.distance_within(target, budget)?;

            let mut path = Vec::new();
            let mut cursor = target;
            while cursor != source {
                let (parent, via) = *state.parents.get(&cursor)?;
                path.push(via);
                cursor = parent;
            }
            Some(path)
        })
    }

    /// Runs `inspect` against the cached search state for `(source,
    /// direction, metric)`, extending it first when `budget` exceeds the
    /// completed budget. Entry-level locking: concurrent queries for the
    /// same source serialize, and the second reuses what the first
    /// computed.
    fn with_search<R>(
        &self,
        source: NodeIndex,
        direction: SearchDirection,
        metric: CostMetric,
        budget: f64,
        inspect: impl FnOnce(&SearchState) -> R,
    ) -> R {
        let entry = {
            let mut registry = self.cache.lock().unwrap();
            registry
                .entry((source, direction, metric))
                .or_insert_with(|| {
                    Arc::new(Mutex::new(SearchState::seeded(
                        source,
                        self.graph[source].id.clone(),
                    )))
                })
                .clone()
        };

        let mut state = entry.lock().unwrap();
        if budget > state.completed_budget {
            self.extend_search(&mut state, budget, direction, metric);
        }

        inspect(&state)
    }

    /// Resumes the retained frontier until every entry cheaper than
    /// `budget` is settled. Nodes settled by earlier, smaller budgets are
    /// never re-expanded.
    fn extend_search(
        &self,
        state: &mut SearchState,
        budget: f64,
        direction: SearchDirection,
        metric: CostMetric,
    ) {
        while let Some(top) = state.frontier.peek() {
            if top.cost > budget {
                break;
            }

            let FrontierEntry { cost, node, .. } = state.frontier.pop().unwrap();
            if !state.settled.insert(node) {
                // Stale frontier entry, already settled cheaper.
                continue;
            }

            for edge in self.graph.edges_directed(node, direction.adjacency()) {
                let neighbour = match direction {
                    SearchDirection::Forward => edge.target(),
                    SearchDirection::Reverse => edge.source(),
                };
                if state.settled.contains(&neighbour) {
                    continue;
                }

                let relaxed = cost + self.relaxation_cost(edge.weight(), metric);
                let improved = state
                    .distances
                    .get(&neighbour)
                    .is_none_or(|known| relaxed < *known);
                if improved {
                    state.distances.insert(neighbour, relaxed);
                    state.parents.insert(neighbour, (node, edge.id()));
                    state.frontier.push(FrontierEntry {
                        cost: relaxed,
                        id: self.graph[neighbour].id.clone(),
                        node: neighbour,
                    });
                }
            }
        }

        debug!(
            "Search from {} extended to budget {budget} ({} settled)",
            self.graph[state.source].id,
            state.settled.len()
        );
        state.completed_budget = budget;
    }

    fn relaxation_cost(&self, edge: &Edge, metric: CostMetric) -> f64 {
        match metric {
            CostMetric::Distance => edge.length,
            CostMetric::TravelTime => {
                let speed = if edge.speed > 0.0 {
                    edge.speed
                } else {
                    self.average_speed
                };
                edge.length / speed
            }
        }
    }
}
