//! Geographic point types shared by the generator and its consumers.
//!
//! Coordinates are plain degrees. Centers are drawn inside the conventional
//! latitude/longitude ranges, perturbed points are not clamped and may fall
//! outside them.

use serde::{Deserialize, Serialize};

use crate::error::{GeneratorError, Result};

/// Number of points written when nothing else is configured.
pub const DEFAULT_TOTAL_POINTS: usize = 100_000;
/// Number of clusters the points are spread across by default.
pub const DEFAULT_NUM_CLUSTERS: usize = 100;
/// Standard deviation of the Gaussian offset around a center, in degrees.
pub const DEFAULT_STDDEV_DEGREES: f64 = 0.1;

/// Reference coordinate a group of points is sampled around.
///
/// Only lives for the duration of a generation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterCenter {
    pub latitude: f64,
    pub longitude: f64,
}

/// A single record of the output artifact.
///
/// Serialized as `{"lat": .., "lon": .., "id": ..}`. The cluster a point was
/// sampled from is not part of the record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPoint {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    /// Position in generation order, starting at 1
    pub id: u64,
}

/// Parameters that fully determine a generation run given a random source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub total_points: usize,
    pub num_clusters: usize,
    pub perturbation_stddev_degrees: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            total_points: DEFAULT_TOTAL_POINTS,
            num_clusters: DEFAULT_NUM_CLUSTERS,
            perturbation_stddev_degrees: DEFAULT_STDDEV_DEGREES,
        }
    }
}

impl GenerationParams {
    /// Checks the preconditions of a generation run.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidConfig`] if:
    /// - `num_clusters` is zero
    /// - `total_points` is zero
    /// - the standard deviation is negative, NaN or infinite
    ///
    /// `total_points < num_clusters` is accepted: every point then comes from
    /// the remainder top-up around the first center.
    pub fn validate(&self) -> Result<()> {
        if self.num_clusters == 0 {
            return Err(GeneratorError::InvalidConfig(
                "num_clusters must be at least 1".to_string(),
            ));
        }
        if self.total_points == 0 {
            return Err(GeneratorError::InvalidConfig(
                "total_points must be at least 1".to_string(),
            ));
        }
        let stddev = self.perturbation_stddev_degrees;
        if !stddev.is_finite() || stddev < 0.0 {
            return Err(GeneratorError::InvalidConfig(format!(
                "perturbation stddev must be a finite non-negative number, got {stddev}"
            )));
        }
        Ok(())
    }

    /// Points every cluster receives before the remainder top-up.
    pub fn points_per_cluster(&self) -> usize {
        self.total_points / self.num_clusters
    }

    /// Points added around the first center after the even split.
    pub fn remainder(&self) -> usize {
        self.total_points - self.num_clusters * self.points_per_cluster()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = GenerationParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.points_per_cluster(), 1000);
        assert_eq!(params.remainder(), 0);
    }

    #[test]
    fn test_uneven_split() {
        let params = GenerationParams {
            total_points: 10,
            num_clusters: 3,
            perturbation_stddev_degrees: 0.1,
        };
        assert_eq!(params.points_per_cluster(), 3);
        assert_eq!(params.remainder(), 1);
    }

    #[test]
    fn test_fewer_points_than_clusters() {
        let params = GenerationParams {
            total_points: 2,
            num_clusters: 5,
            perturbation_stddev_degrees: 0.1,
        };
        assert!(params.validate().is_ok());
        assert_eq!(params.points_per_cluster(), 0);
        assert_eq!(params.remainder(), 2);
    }

    #[test]
    fn test_rejects_invalid_params() {
        let zero_clusters = GenerationParams {
            num_clusters: 0,
            ..GenerationParams::default()
        };
        assert!(matches!(
            zero_clusters.validate(),
            Err(GeneratorError::InvalidConfig(_))
        ));

        let zero_points = GenerationParams {
            total_points: 0,
            ..GenerationParams::default()
        };
        assert!(matches!(
            zero_points.validate(),
            Err(GeneratorError::InvalidConfig(_))
        ));

        for stddev in [-0.5, f64::NAN, f64::INFINITY] {
            let params = GenerationParams {
                perturbation_stddev_degrees: stddev,
                ..GenerationParams::default()
            };
            assert!(matches!(
                params.validate(),
                Err(GeneratorError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_point_serializes_with_short_field_names() {
        let point = GeneratedPoint {
            latitude: 12.5,
            longitude: -56.25,
            id: 1,
        };
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, r#"{"lat":12.5,"lon":-56.25,"id":1}"#);
    }
}
