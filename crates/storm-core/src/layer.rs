//! Input feature layers: storm lines, storm points and catchment polygons.
//!
//! Layers are GeoJSON-shaped feature collections carrying a top-level `crs`
//! member. Only the geometry kinds the network consumes are accepted.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Identifier of a line or point feature. Integer and string identifiers are both accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Int(i64),
    Text(String),
}

impl FeatureId {
    /// Read an identifier from a property value. Floats with no fractional part count as integers.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(FeatureId::Int).or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| FeatureId::Int(f as i64))
            }),
            Value::String(s) => Some(FeatureId::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Int(n) => write!(f, "{n}"),
            FeatureId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FeatureId {
    fn from(n: i64) -> Self {
        FeatureId::Int(n)
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        FeatureId::Text(s.to_string())
    }
}

/// Text that parses as an integer becomes [`FeatureId::Int`].
impl FromStr for FeatureId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.trim()
            .parse()
            .map_or_else(|_| FeatureId::Text(s.to_string()), FeatureId::Int))
    }
}

/// Line geometry: an ordered vertex sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum LineGeometry {
    LineString(Vec<[f64; 2]>),
}

impl LineGeometry {
    pub fn vertices(&self) -> &[[f64; 2]] {
        match self {
            LineGeometry::LineString(v) => v,
        }
    }
}

/// Point geometry. A multi-point keeps only its first member once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum PointGeometry {
    Point([f64; 2]),
    MultiPoint(Vec<[f64; 2]>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineFeature {
    #[serde(default)]
    pub properties: Map<String, Value>,
    pub geometry: LineGeometry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointFeature {
    #[serde(default)]
    pub properties: Map<String, Value>,
    pub geometry: PointGeometry,
}

/// All storm line features of the area of interest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineLayer {
    #[serde(default)]
    pub crs: Option<String>,
    pub features: Vec<LineFeature>,
}

/// All storm point features of the area of interest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointLayer {
    #[serde(default)]
    pub crs: Option<String>,
    pub features: Vec<PointFeature>,
}

/// Column checks mirror a table schema: a column exists if any feature carries it.
pub(crate) fn has_column<'a, I>(mut rows: I, column: &str) -> bool
where
    I: Iterator<Item = &'a Map<String, Value>>,
{
    rows.any(|props| props.contains_key(column))
}

impl LineLayer {
    pub fn has_column(&self, column: &str) -> bool {
        has_column(self.features.iter().map(|f| &f.properties), column)
    }
}

impl PointLayer {
    pub fn has_column(&self, column: &str) -> bool {
        has_column(self.features.iter().map(|f| &f.properties), column)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum PolygonGeometry {
    Polygon(Vec<Vec<[f64; 2]>>),
    MultiPolygon(Vec<Vec<Vec<[f64; 2]>>>),
}

/// On-disk form of a candidate catchment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchmentLayer {
    #[serde(default)]
    pub crs: Option<String>,
    pub geometry: PolygonGeometry,
}

/// A candidate catchment polygon, supplied per query and never owned by the graph.
#[derive(Debug, Clone)]
pub struct Catchment {
    pub crs: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

impl Catchment {
    pub fn new(crs: Option<String>, geometry: impl Into<MultiPolygon<f64>>) -> Self {
        Self {
            crs,
            geometry: geometry.into(),
        }
    }
}

fn ring(coords: &[[f64; 2]]) -> LineString<f64> {
    LineString::new(coords.iter().map(|&[x, y]| Coord { x, y }).collect())
}

fn polygon(rings: &[Vec<[f64; 2]>]) -> Polygon<f64> {
    match rings.split_first() {
        Some((exterior, holes)) => Polygon::new(ring(exterior), holes.iter().map(|h| ring(h)).collect()),
        None => Polygon::new(LineString::new(Vec::new()), Vec::new()),
    }
}

impl From<CatchmentLayer> for Catchment {
    fn from(layer: CatchmentLayer) -> Self {
        let geometry = match &layer.geometry {
            PolygonGeometry::Polygon(rings) => MultiPolygon::new(vec![polygon(rings)]),
            PolygonGeometry::MultiPolygon(polys) => {
                MultiPolygon::new(polys.iter().map(|p| polygon(p)).collect())
            }
        };
        Self {
            crs: layer.crs,
            geometry,
        }
    }
}
