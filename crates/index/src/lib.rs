//! Flat vector index over corpus chunks, its on-disk format, and the
//! query-time retriever.

pub mod builder;
pub mod metric;
pub mod persist;
pub mod retriever;
pub mod vector;

pub use builder::IndexBuilder;
pub use defraud_config::DistanceMetric;
pub use persist::{IndexPaths, Manifest, TrustPolicy};
pub use retriever::Retriever;
pub use vector::VectorIndex;
