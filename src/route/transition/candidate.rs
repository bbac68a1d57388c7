use geo::Point;
use petgraph::graph::EdgeIndex;

/// A hypothesised network position explaining one observation: an edge,
/// the observation's projection onto it, and where along the edge that
/// projection sits.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub edge: EdgeIndex,
    /// The observation projected onto the edge polyline.
    pub position: Point<f64>,
    /// Perpendicular (great-circle) distance from the observation to
    /// `position`, in meters.
    pub deviation: f64,
    /// Arc length from the edge start to `position`, in meters.
    pub offset: f64,
}

/// A candidate scored by the recurrence, with its best-predecessor link
/// into the previous layer.
#[derive(Debug, Clone)]
pub(crate) struct Hypothesis {
    pub candidate: Candidate,
    /// Cumulative log-probability of the best path ending here.
    pub score: f64,
    /// Index of the maximising candidate in the previous layer; `None` in
    /// a segment's first layer.
    pub parent: Option<usize>,
}

/// One observation's scored candidate set.
#[derive(Debug)]
pub(crate) struct Layer {
    /// Index of the observation this layer explains.
    pub point: usize,
    pub hypotheses: Vec<Hypothesis>,
}

impl Layer {
    /// Rescales scores so the maximum becomes zero. Keeps long
    /// trajectories inside floating-point range without changing any
    /// arg-max.
    pub fn normalize(&mut self) {
        let best = self
            .hypotheses
            .iter()
            .map(|hypothesis| hypothesis.score)
            .fold(f64::NEG_INFINITY, f64::max);

        for hypothesis in &mut self.hypotheses {
            hypothesis.score -= best;
        }
    }

    /// Index of the best-scoring hypothesis; exact ties go to the lowest
    /// edge index so backtraces are deterministic.
    pub fn best(&self) -> Option<usize> {
        self.hypotheses
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.score
                    .total_cmp(&b.score)
                    .then_with(|| b.candidate.edge.cmp(&a.candidate.edge))
            })
            .map(|(index, _)| index)
    }

    /// Beam pruning: keeps only the `cap` best-scoring hypotheses,
    /// descending by score with ties broken by edge index.
    pub fn prune(&mut self, cap: usize) {
        if self.hypotheses.len() <= cap {
            return;
        }

        self.hypotheses.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.candidate.edge.cmp(&b.candidate.edge))
        });
        self.hypotheses.truncate(cap);
    }
}
