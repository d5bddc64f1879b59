//! Domain errors raised while building or querying a drainage network.

use crate::graph::Claim;
use crate::layer::FeatureId;

/// Fatal conditions of network construction, resolution and queries.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("coordinate reference systems must match (points: {points:?}, lines: {lines:?})")]
    CrsMismatch {
        points: Option<String>,
        lines: Option<String>,
    },
    #[error("catchment CRS {catchment:?} does not match the network CRS {network:?}")]
    CatchmentCrsMismatch {
        network: Option<String>,
        catchment: Option<String>,
    },
    #[error("{layer} layer does not contain the column `{column}`")]
    MissingColumn { layer: &'static str, column: String },
    #[error("column `{column}` must be boolean for every feature (feature {id} is not)")]
    NotBoolean { column: String, id: FeatureId },
    #[error("line {id} has {vertices} vertices, at least 2 are required")]
    InvalidLine { id: FeatureId, vertices: usize },
    #[error("feature {id} has invalid geometry: {reason}")]
    InvalidGeometry { id: FeatureId, reason: String },
    #[error("{layer} identifier {id} appears more than once")]
    DuplicateId { layer: &'static str, id: FeatureId },
    #[error("no point with identifier {0}")]
    UnknownPoint(FeatureId),
    #[error("cannot resolve direction from point {0}: it is not marked as a flow source")]
    NotASource(FeatureId),
    #[error("cannot {0}: graph directions are not resolved")]
    Unresolved(&'static str),
    #[error("subgraph of point {0} has no outlet")]
    NoOutlet(FeatureId),
    #[error("no point present at the outlet coordinate ({x}, {y}) of point {id}")]
    NoPointAtOutlet { id: FeatureId, x: f64, y: f64 },
    #[error(
        "method \"{0}\" is not a valid edge resolution method, must be \"from_sources\", \"vertex_order\", or \"vertex_order_r\""
    )]
    UnsupportedMethod(String),
    #[error(
        "edge ({from_x}, {from_y}) -> ({to_x}, {to_y}) is claimed by {claimed_by}, {contested_by} would reverse it"
    )]
    DirectionConflict {
        from_x: f64,
        from_y: f64,
        to_x: f64,
        to_y: f64,
        claimed_by: Claim,
        contested_by: Claim,
    },
}

pub type Result<T> = std::result::Result<T, NetworkError>;
