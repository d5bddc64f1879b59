//! Flow-direction graphs for stormwater drainage networks.
//!
//! Lines are exploded into two-vertex segments over rounded coordinates
//! ([`graph::SegmentGraphBuilder`]), points are classified as flow sources and
//! sinks ([`points::PointClassifier`]), and the resulting [`Network`] is
//! oriented ([`resolve`]) before answering downstream, outlet and
//! catchment-boundary queries.

pub mod catchment;
pub mod config;
pub mod coords;
pub mod error;
pub mod graph;
pub mod layer;
pub mod network;
pub mod points;
pub mod resolve;
pub mod schema;
pub mod storage;
pub mod traverse;

pub use error::NetworkError;
pub use layer::{Catchment, FeatureId};
pub use network::{Network, NetworkSummary};
pub use resolve::{ResolveMethod, ResolveReport};
