//! Common library for the clustered geo-point generator.
//!
//! This crate provides the pieces shared by the generator binary and anything
//! that consumes its output: the point data model, configuration management,
//! error handling, telemetry setup and reading/writing of the JSON dataset.

// Point and parameter types
pub mod points;
pub use points::{ClusterCenter, GeneratedPoint, GenerationParams};

// Configuration management
pub mod config;
pub use config::Config;

// Error handling types
pub mod error;
pub use error::{GeneratorError, Result};

// Telemetry and observability
pub mod telemetry;

// Dataset serialization
pub mod dataset;

pub use dataset::{read_dataset, write_dataset};
pub use telemetry::init_tracing;
