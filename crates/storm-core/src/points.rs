//! Storm point ingestion: flow-role classification and coordinate normalization.

use crate::coords::Node;
use crate::error::{NetworkError, Result};
use crate::layer::{FeatureId, PointFeature, PointGeometry, PointLayer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

/// Precomputed attribute marking a point where flow exits the network.
pub const IS_SOURCE: &str = "IS_SOURCE";
/// Precomputed attribute marking a point where flow enters the network.
pub const IS_SINK: &str = "IS_SINK";

/// Vermont type codes for flow sinks: catchbasin, culvert inlet.
pub const SINK_TYPES_VT: [i64; 2] = [2, 8];
/// Vermont type codes for flow sources: outfall, culvert outlet.
pub const SOURCE_TYPES_VT: [i64; 2] = [5, 9];

/// Flow role of a point within the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointRole {
    /// Water exits the network here (outfall, culvert outlet).
    Source,
    /// Water enters the network here (catchbasin, culvert inlet).
    Sink,
    Neither,
    Both,
}

impl PointRole {
    pub fn from_flags(is_source: bool, is_sink: bool) -> Self {
        match (is_source, is_sink) {
            (true, true) => PointRole::Both,
            (true, false) => PointRole::Source,
            (false, true) => PointRole::Sink,
            (false, false) => PointRole::Neither,
        }
    }

    pub fn is_source(self) -> bool {
        matches!(self, PointRole::Source | PointRole::Both)
    }

    pub fn is_sink(self) -> bool {
        matches!(self, PointRole::Sink | PointRole::Both)
    }
}

/// Configurable type-code sets that decide a point's role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCodeMapping {
    pub sink_types: BTreeSet<i64>,
    pub source_types: BTreeSet<i64>,
}

impl Default for TypeCodeMapping {
    fn default() -> Self {
        Self {
            sink_types: SINK_TYPES_VT.into_iter().collect(),
            source_types: SOURCE_TYPES_VT.into_iter().collect(),
        }
    }
}

impl TypeCodeMapping {
    pub fn new(
        sink_types: impl IntoIterator<Item = i64>,
        source_types: impl IntoIterator<Item = i64>,
    ) -> Self {
        Self {
            sink_types: sink_types.into_iter().collect(),
            source_types: source_types.into_iter().collect(),
        }
    }

    /// Map a type code to its role. Points without a code play no role.
    pub fn classify(&self, code: Option<i64>) -> PointRole {
        match code {
            Some(c) => PointRole::from_flags(self.source_types.contains(&c), self.sink_types.contains(&c)),
            None => PointRole::Neither,
        }
    }

    /// Codes listed as both sink and source.
    pub fn overlapping(&self) -> Vec<i64> {
        self.sink_types.intersection(&self.source_types).copied().collect()
    }
}

/// Canonical point value, built once at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StormPoint {
    pub id: FeatureId,
    /// Rounded to the network precision; matches graph nodes by value.
    pub coord: Node,
    pub type_code: Option<i64>,
    pub is_source: bool,
    pub is_sink: bool,
}

impl StormPoint {
    pub fn role(&self) -> PointRole {
        PointRole::from_flags(self.is_source, self.is_sink)
    }
}

/// Turns a point layer into [`StormPoint`]s.
///
/// Precomputed `IS_SOURCE`/`IS_SINK` columns win over the type-code mapping and
/// must hold booleans on every feature. Each column is checked on its own, so a
/// layer may precompute one role and derive the other.
#[derive(Debug, Clone, Copy)]
pub struct PointClassifier<'a> {
    pub index_column: &'a str,
    pub type_column: Option<&'a str>,
    pub mapping: &'a TypeCodeMapping,
    pub decimals: u32,
}

impl PointClassifier<'_> {
    pub fn classify_layer(&self, layer: &PointLayer) -> Result<Vec<StormPoint>> {
        if !layer.has_column(self.index_column) {
            return Err(NetworkError::MissingColumn {
                layer: "storm_pts",
                column: self.index_column.to_string(),
            });
        }
        if let Some(type_column) = self.type_column
            && !layer.has_column(type_column)
        {
            return Err(NetworkError::MissingColumn {
                layer: "storm_pts",
                column: type_column.to_string(),
            });
        }
        let source_precomputed = layer.has_column(IS_SOURCE);
        let sink_precomputed = layer.has_column(IS_SINK);
        if (!source_precomputed || !sink_precomputed) && self.type_column.is_none() {
            let column = if source_precomputed { IS_SINK } else { IS_SOURCE };
            return Err(NetworkError::MissingColumn {
                layer: "storm_pts",
                column: column.to_string(),
            });
        }

        let mut seen = HashSet::new();
        let mut points = Vec::with_capacity(layer.features.len());
        for feature in &layer.features {
            let id = self.feature_id(feature)?;
            if !seen.insert(id.clone()) {
                return Err(NetworkError::DuplicateId {
                    layer: "storm_pts",
                    id,
                });
            }

            let type_code = match self.type_column {
                Some(column) => type_code(&id, feature.properties.get(column)),
                None => None,
            };
            let derived = self.mapping.classify(type_code);
            let is_source = if source_precomputed {
                bool_attr(&id, feature, IS_SOURCE)?
            } else {
                derived.is_source()
            };
            let is_sink = if sink_precomputed {
                bool_attr(&id, feature, IS_SINK)?
            } else {
                derived.is_sink()
            };

            let coord = point_coord(&id, &feature.geometry, self.decimals)?;
            points.push(StormPoint {
                id,
                coord,
                type_code,
                is_source,
                is_sink,
            });
        }
        Ok(points)
    }

    fn feature_id(&self, feature: &PointFeature) -> Result<FeatureId> {
        feature
            .properties
            .get(self.index_column)
            .and_then(FeatureId::from_value)
            .ok_or_else(|| NetworkError::MissingColumn {
                layer: "storm_pts",
                column: self.index_column.to_string(),
            })
    }
}

fn bool_attr(id: &FeatureId, feature: &PointFeature, column: &str) -> Result<bool> {
    match feature.properties.get(column) {
        Some(Value::Bool(b)) => Ok(*b),
        _ => Err(NetworkError::NotBoolean {
            column: column.to_string(),
            id: id.clone(),
        }),
    }
}

/// Integer reading of a type code. Anything else matches no code set.
fn type_code(id: &FeatureId, value: Option<&Value>) -> Option<i64> {
    let code = match value {
        None | Some(Value::Null) => return None,
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    };
    if code.is_none()
        && let Some(raw) = value
    {
        tracing::warn!(
            "point {} has non-integer type code {}, it matches neither sink nor source types",
            id,
            raw
        );
    }
    code
}

/// Resolve a point geometry to one rounded coordinate, keeping the first member of a multi-point.
pub fn point_coord(id: &FeatureId, geometry: &PointGeometry, decimals: u32) -> Result<Node> {
    let [x, y] = match geometry {
        PointGeometry::Point(c) => *c,
        PointGeometry::MultiPoint(members) => {
            let Some(first) = members.first() else {
                return Err(NetworkError::InvalidGeometry {
                    id: id.clone(),
                    reason: "multi-point has no members".to_string(),
                });
            };
            if members.len() > 1 {
                tracing::warn!(
                    "point {} at coordinate ({}, {}) has MultiPoint geometry with {} point coordinates, only keeping the first",
                    id,
                    first[0],
                    first[1],
                    members.len()
                );
            }
            *first
        }
    };
    if !x.is_finite() || !y.is_finite() {
        return Err(NetworkError::InvalidGeometry {
            id: id.clone(),
            reason: "point has a non-finite coordinate".to_string(),
        });
    }
    Ok(Node::rounded(x, y, decimals))
}
