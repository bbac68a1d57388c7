//! The log-domain probability model.

/// Log-likelihood of observing a fix `deviation` meters away from the
/// candidate it is hypothesised to explain: a zero-mean Gaussian over the
/// perpendicular distance, parameterised by the GPS noise `sigma`.
///
/// Strictly decreasing in `deviation`.
#[inline]
pub fn emission_log_probability(deviation: f64, sigma: f64) -> f64 {
    -0.5 * (deviation / sigma).powi(2)
}

/// Log-likelihood of moving between two candidates whose straight-line
/// observation distance is `straight` and whose routed network distance is
/// `routed`: an exponential penalty on the discrepancy, smoothed by `beta`.
///
/// Strictly decreasing in `|straight - routed|`.
#[inline]
pub fn transition_log_probability(straight: f64, routed: f64, beta: f64) -> f64 {
    -(straight - routed).abs() / beta
}
