//! Synthetic clustered geo-point datasets.
//!
//! [`generator`] produces the points. [`rtree`] indexes a produced dataset
//! for k-nearest queries and [`nearest`] is the brute-force reference for the
//! same queries. Reading and writing the JSON artifact lives in
//! `geocluster_common::dataset`.

pub mod generator;
pub mod nearest;
pub mod rtree;

pub use generator::{generate, rng_from_seed, ClusterPointGenerator};
pub use nearest::{k_nearest, Neighbor};
pub use rtree::RTree;
