//! Brute-force k-nearest-neighbour lookup over a generated dataset.
//!
//! Serves as the reference answer for spatial indexes fed with the
//! generator's output. Distance is planar Euclidean on raw degrees, with
//! longitude as x and latitude as y.

use geocluster_common::{GeneratedPoint, GeneratorError, Result};
use serde::Serialize;

/// A dataset point together with its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    #[serde(flatten)]
    pub point: GeneratedPoint,
    pub distance: f64,
}

/// Returns the `k` points closest to (`lat`, `lon`), nearest first.
///
/// Points at equal distance keep their dataset order.
///
/// # Errors
///
/// Returns [`GeneratorError::InvalidQuery`] if the query coordinates are not
/// finite.
pub fn k_nearest(points: &[GeneratedPoint], lat: f64, lon: f64, k: usize) -> Result<Vec<Neighbor>> {
    if !lat.is_finite() || !lon.is_finite() {
        return Err(GeneratorError::InvalidQuery(format!(
            "query coordinates must be finite, got lat={lat} lon={lon}"
        )));
    }

    let mut neighbors: Vec<Neighbor> = points
        .iter()
        .map(|point| {
            let dx = point.longitude - lon;
            let dy = point.latitude - lat;
            Neighbor {
                point: *point,
                distance: dx.hypot(dy),
            }
        })
        .collect();

    neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    neighbors.truncate(k);
    Ok(neighbors)
}
