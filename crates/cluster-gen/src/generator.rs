//! Clustered point generation.
//!
//! Points are sampled around randomly placed cluster centers by adding a
//! Gaussian offset to each coordinate. Latitude and longitude are drawn
//! independently, so centers are uniform in degrees rather than over the
//! sphere's surface and the poles are over-represented. Perturbed coordinates
//! are never clamped.

use geocluster_common::{ClusterCenter, GeneratedPoint, GenerationParams, GeneratorError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// Builds the random source for a run.
///
/// A fixed seed gives a reproducible dataset, `None` seeds from the OS.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

/// Produces exactly `total_points` points spread over `num_clusters`
/// Gaussian-perturbed groups.
///
/// The random source is owned by the generator; pass `&mut rng` to keep
/// using it afterwards.
pub struct ClusterPointGenerator<R> {
    params: GenerationParams,
    offset: Normal<f64>,
    rng: R,
}

impl<R: Rng> ClusterPointGenerator<R> {
    /// Creates a generator after checking the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidConfig`] when the parameters violate a
    /// precondition (see [`GenerationParams::validate`]).
    pub fn new(params: GenerationParams, rng: R) -> Result<Self> {
        params.validate()?;
        let offset = Normal::new(0.0, params.perturbation_stddev_degrees)
            .map_err(|e| GeneratorError::InvalidConfig(e.to_string()))?;

        Ok(Self { params, offset, rng })
    }

    /// Draws `num_clusters` centers, latitude and longitude independently
    /// uniform over their conventional ranges.
    pub fn place_centers(&mut self) -> Vec<ClusterCenter> {
        (0..self.params.num_clusters)
            .map(|_| ClusterCenter {
                latitude: self.rng.gen_range(LATITUDE_RANGE),
                longitude: self.rng.gen_range(LONGITUDE_RANGE),
            })
            .collect()
    }

    /// Samples the points for the given centers.
    ///
    /// Every center receives `total_points / centers.len()` points, in
    /// order. The remaining points are all sampled around the first center.
    /// Ids count up from 1 in the order points are produced.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidConfig`] if `centers` is empty.
    pub fn generate_around(&mut self, centers: &[ClusterCenter]) -> Result<Vec<GeneratedPoint>> {
        let Some(first) = centers.first().copied() else {
            return Err(GeneratorError::InvalidConfig(
                "at least one cluster center is required".to_string(),
            ));
        };

        let split = GenerationParams {
            num_clusters: centers.len(),
            ..self.params
        };
        let total = split.total_points;
        let mut points = Vec::new();
        points.try_reserve_exact(total).map_err(|e| {
            GeneratorError::InvalidConfig(format!("cannot hold {total} points: {e}"))
        })?;

        for center in centers {
            for _ in 0..split.points_per_cluster() {
                let point = self.sample_point(center, points.len() as u64 + 1);
                points.push(point);
            }
        }

        let remainder = split.remainder();
        if remainder > 0 {
            tracing::debug!("Topping up {} points around the first cluster", remainder);
        }
        for _ in 0..remainder {
            let point = self.sample_point(&first, points.len() as u64 + 1);
            points.push(point);
        }

        Ok(points)
    }

    /// Runs a full generation: place centers, then sample around them.
    pub fn generate(&mut self) -> Result<Vec<GeneratedPoint>> {
        let centers = self.place_centers();
        tracing::debug!(
            "Placed {} cluster centers, {} points each",
            centers.len(),
            self.params.points_per_cluster()
        );
        self.generate_around(&centers)
    }

    fn sample_point(&mut self, center: &ClusterCenter, id: u64) -> GeneratedPoint {
        GeneratedPoint {
            latitude: center.latitude + self.offset.sample(&mut self.rng),
            longitude: center.longitude + self.offset.sample(&mut self.rng),
            id,
        }
    }
}

/// Generates a complete dataset for `params` using `rng`.
pub fn generate<R: Rng>(params: GenerationParams, rng: R) -> Result<Vec<GeneratedPoint>> {
    ClusterPointGenerator::new(params, rng)?.generate()
}
