use std::f64::consts::SQRT_2;

use geo::{Distance, Haversine};
use log::{debug, info};
use petgraph::graph::EdgeIndex;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::route::dijkstra::{CostMetric, SearchDirection};
use crate::route::entity::Edge;
use crate::route::error::MatchError;
use crate::route::graph::Graph;
use crate::route::transition::candidate::{Candidate, Hypothesis, Layer};
use crate::route::transition::probability::{
    emission_log_probability, transition_log_probability,
};
use crate::route::transition::trace::GpsPoint;

/// GPS noise standard deviation, in the units of the emission model.
pub const DEFAULT_SIGMA: f64 = 4.07;
/// Transition smoothing constant.
pub const DEFAULT_BETA: f64 = 1.3;
/// Candidate search radius around an observation, in meters.
pub const DEFAULT_SEARCH_RADIUS: f64 = 200.0;
/// Beam width: candidates retained per layer after pruning.
pub const DEFAULT_MAX_CANDIDATES: usize = 10;
/// Elapsed seconds between observations that force a trajectory split.
pub const DEFAULT_MAX_BREAK: f64 = 180.0;
/// Slack added to the straight-line distance when budgeting transition
/// routing queries, in meters.
pub const DEFAULT_DISTANCE_SLACK: f64 = 2_000.0;

/// Tunables of the matcher, passed explicitly at call time.
#[derive(Debug, Clone, Copy)]
pub struct MatchConfig {
    pub sigma: f64,
    pub beta: f64,
    pub search_radius: f64,
    pub max_candidates: usize,
    pub max_break: f64,
    pub distance_slack: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            sigma: DEFAULT_SIGMA,
            beta: DEFAULT_BETA,
            search_radius: DEFAULT_SEARCH_RADIUS,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            max_break: DEFAULT_MAX_BREAK,
            distance_slack: DEFAULT_DISTANCE_SLACK,
        }
    }
}

impl MatchConfig {
    /// Threshold under which consecutive fixes count as "nearby" for the
    /// [`remove_nearby_points`](super::remove_nearby_points) pre-filter.
    pub fn nearby_threshold(&self) -> f64 {
        2.0 * self.sigma
    }
}

/// The Viterbi map-matching engine.
///
/// Holds a reference to an immutable, preprocessed [`Graph`]; matching
/// never mutates the graph beyond its internal shortest-path cache, so one
/// matcher (or several) may run trajectories against the same graph
/// concurrently.
pub struct Matcher<'a> {
    graph: &'a Graph,
    config: MatchConfig,
}

impl<'a> Matcher<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        Matcher {
            graph,
            config: MatchConfig::default(),
        }
    }

    pub fn with_config(graph: &'a Graph, config: MatchConfig) -> Self {
        Matcher { graph, config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Matches a trajectory, sorted ascending by time, onto the network.
    ///
    /// Returns the maximum-likelihood edge sequence in travel order, with
    /// shortest paths spliced between consecutive non-adjacent matches so
    /// the sequence is contiguous. Trajectory gaps (spatial or temporal)
    /// split the match into independently-resolved runs whose sequences
    /// are concatenated.
    ///
    /// An empty trajectory matches to an empty sequence; a trajectory in
    /// which no observation finds any candidate fails with
    /// [`MatchError::NoPathFound`].
    pub fn map_match(&self, points: &[GpsPoint]) -> Result<Vec<&'a Edge>, MatchError> {
        if points.is_empty() {
            return Ok(Vec::new());
        }

        info!("Matching trajectory of {} observations", points.len());

        let mut matched: Vec<EdgeIndex> = Vec::new();
        let mut resolved = 0usize;
        let mut start = 0usize;

        while start < points.len() {
            let Some(seed) = self.seed_layer(points, start) else {
                debug!("No candidates for observation {start}, skipping");
                start += 1;
                continue;
            };

            let (layers, next) = self.extend_segment(points, seed);
            debug!(
                "Resolved segment of {} observations starting at {start}",
                layers.len()
            );

            self.backtrace(points, &layers, &mut matched)?;
            resolved += layers.len();
            start = next;
        }

        if resolved == 0 {
            return Err(MatchError::NoPathFound);
        }

        Ok(matched
            .into_iter()
            .map(|index| self.graph.edge_at(index))
            .collect())
    }

    /// Matches independent trajectories in parallel against the shared
    /// graph.
    pub fn match_many(
        &self,
        traces: &[Vec<GpsPoint>],
    ) -> Vec<Result<Vec<&'a Edge>, MatchError>> {
        traces
            .par_iter()
            .map(|trace| self.map_match(trace))
            .collect()
    }

    /// Candidate edges within the search radius of an observation: a
    /// square query over the edge index, filtered to the exact circle by
    /// perpendicular distance.
    fn candidates(&self, observation: &GpsPoint) -> Vec<Candidate> {
        let half_side = SQRT_2 * self.config.search_radius;

        self.graph
            .edges_in_square(observation.position, half_side)
            .into_iter()
            .filter_map(|index| {
                let edge = self.graph.edge_at(index);
                let position = edge.closest_point(observation.position);
                let deviation = Haversine.distance(observation.position, position);

                (deviation <= self.config.search_radius).then(|| Candidate {
                    edge: index,
                    position,
                    deviation,
                    offset: edge.length_to(position),
                })
            })
            .collect()
    }

    /// First layer of a segment: emission scores only, then pruned.
    fn seed_layer(&self, points: &[GpsPoint], index: usize) -> Option<Layer> {
        let hypotheses = self
            .candidates(&points[index])
            .into_iter()
            .map(|candidate| Hypothesis {
                score: emission_log_probability(candidate.deviation, self.config.sigma),
                candidate,
                parent: None,
            })
            .collect::<Vec<_>>();

        if hypotheses.is_empty() {
            return None;
        }

        let mut layer = Layer {
            point: index,
            hypotheses,
        };
        layer.prune(self.config.max_candidates);
        Some(layer)
    }

    /// Consumes observations after the seed until the trajectory ends, a
    /// time gap exceeds the break threshold, or a layer comes up
    /// unreachable. Returns the segment's layers and the index the next
    /// segment starts at.
    fn extend_segment(&self, points: &[GpsPoint], seed: Layer) -> (Vec<Layer>, usize) {
        let mut layers = vec![seed];
        let mut index = layers[0].point + 1;

        while index < points.len() {
            let previous = layers.last_mut().unwrap();

            let elapsed = points[index].seconds_since(&points[previous.point]);
            if elapsed > self.config.max_break {
                debug!("Splitting on {elapsed:.0}s gap before observation {index}");
                break;
            }

            match self.next_layer(points, index, previous) {
                Some(layer) => layers.push(layer),
                None => {
                    debug!("Splitting on unreachable observation {index}");
                    break;
                }
            }

            index += 1;
        }

        (layers, index)
    }

    /// One step of the recurrence: renormalizes the previous layer, scores
    /// every candidate of observation `index` against it, and prunes.
    /// `None` when no candidate could score any transition.
    fn next_layer(&self, points: &[GpsPoint], index: usize, previous: &mut Layer) -> Option<Layer> {
        previous.normalize();

        let straight = points[index].distance(&points[previous.point]);
        let budget = straight + self.config.distance_slack;

        let mut hypotheses = Vec::new();
        for candidate in self.candidates(&points[index]) {
            let mut best: Option<(usize, f64)> = None;

            for (parent, prior) in previous.hypotheses.iter().enumerate() {
                let Some(routed) = self.road_distance(&prior.candidate, &candidate, budget) else {
                    continue;
                };

                let score = prior.score
                    + transition_log_probability(straight, routed, self.config.beta);
                if best.is_none_or(|(_, known)| score > known) {
                    best = Some((parent, score));
                }
            }

            if let Some((parent, score)) = best {
                hypotheses.push(Hypothesis {
                    score: score
                        + emission_log_probability(candidate.deviation, self.config.sigma),
                    candidate,
                    parent: Some(parent),
                });
            }
        }

        if hypotheses.is_empty() {
            return None;
        }

        let mut layer = Layer {
            point: index,
            hypotheses,
        };
        layer.prune(self.config.max_candidates);
        Some(layer)
    }

    /// Network distance travelled between two consecutive candidates.
    ///
    /// On the same edge this is the signed along-edge difference of the
    /// projected offsets (no graph query). Across edges it routes from the
    /// previous edge's target node to the next edge's source node, run in
    /// reverse from the next candidate so the cached search is shared by
    /// every predecessor in the layer, plus both partial-edge lengths.
    /// `None` when the route exceeds the budget.
    fn road_distance(&self, previous: &Candidate, next: &Candidate, budget: f64) -> Option<f64> {
        if previous.edge == next.edge {
            return Some(next.offset - previous.offset);
        }

        let (_, previous_end) = self.graph.endpoints(previous.edge);
        let (next_start, _) = self.graph.endpoints(next.edge);

        let routed = self.graph.reach(
            next_start,
            previous_end,
            budget,
            SearchDirection::Reverse,
            CostMetric::Distance,
        )?;

        let previous_edge = self.graph.edge_at(previous.edge);
        Some(routed + (previous_edge.length - previous.offset) + next.offset)
    }

    /// Backtracks a resolved segment from its best final hypothesis and
    /// appends the edge sequence, splicing the shortest path wherever
    /// consecutive matches are not on the same edge.
    fn backtrace(
        &self,
        points: &[GpsPoint],
        layers: &[Layer],
        matched: &mut Vec<EdgeIndex>,
    ) -> Result<(), MatchError> {
        let last = layers.last().ok_or(MatchError::NoPathFound)?;

        let mut selection = vec![0usize; layers.len()];
        selection[layers.len() - 1] = last.best().ok_or(MatchError::NoPathFound)?;

        for index in (1..layers.len()).rev() {
            selection[index - 1] = layers[index].hypotheses[selection[index]]
                .parent
                .expect("hypothesis in a non-seed layer without a parent");
        }

        let mut previous: Option<&Candidate> = None;
        for (index, layer) in layers.iter().enumerate() {
            let candidate = &layer.hypotheses[selection[index]].candidate;

            match previous {
                Some(prior) if prior.edge == candidate.edge => {}
                Some(prior) => {
                    self.splice(points, &layers[index - 1..=index], prior, candidate, matched)?;
                    matched.push(candidate.edge);
                }
                None => matched.push(candidate.edge),
            }

            previous = Some(candidate);
        }

        Ok(())
    }

    /// Inserts the shortest-path edges joining two consecutive matched
    /// candidates, exclusive of both matched edges. The search state is
    /// already cached from transition scoring, with the same budget.
    fn splice(
        &self,
        points: &[GpsPoint],
        window: &[Layer],
        previous: &Candidate,
        next: &Candidate,
        matched: &mut Vec<EdgeIndex>,
    ) -> Result<(), MatchError> {
        let straight = points[window[1].point].distance(&points[window[0].point]);
        let budget = straight + self.config.distance_slack;

        let (_, previous_end) = self.graph.endpoints(previous.edge);
        let (next_start, _) = self.graph.endpoints(next.edge);

        let path = self
            .graph
            .reconstruct(
                next_start,
                previous_end,
                budget,
                SearchDirection::Reverse,
                CostMetric::Distance,
            )
            .ok_or(MatchError::NoPathFound)?;

        matched.extend(path);
        Ok(())
    }
}
