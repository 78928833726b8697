use crate::{
    core::geo::{LatLng, LatLngBounds},
    measure::{self, Units},
    MapError, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trail shipped with the viewer
const BUNDLED_TRAIL: &str = include_str!("../../data/hs-trail.geojson");

/// A GeoJSON position. Extra ordinates (elevation) are kept but unused.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Position {
    pub lng: f64,
    pub lat: f64,
    pub elevation: Option<f64>,
}

impl Position {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            lng,
            lat,
            elevation: None,
        }
    }

    pub fn to_lat_lng(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = String;

    fn try_from(values: Vec<f64>) -> std::result::Result<Self, Self::Error> {
        match values.as_slice() {
            [lng, lat] => Ok(Self::new(*lng, *lat)),
            [lng, lat, elevation, ..] => Ok(Self {
                lng: *lng,
                lat: *lat,
                elevation: Some(*elevation),
            }),
            _ => Err(format!("position needs at least 2 numbers, got {}", values.len())),
        }
    }
}

impl From<Position> for Vec<f64> {
    fn from(position: Position) -> Self {
        match position.elevation {
            Some(elevation) => vec![position.lng, position.lat, elevation],
            None => vec![position.lng, position.lat],
        }
    }
}

impl From<LatLng> for Position {
    fn from(lat_lng: LatLng) -> Self {
        Self::new(lat_lng.lng, lat_lng.lat)
    }
}

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: Position,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

impl GeoJsonGeometry {
    /// Builds a LineString geometry from coordinates
    pub fn line_string(points: &[LatLng]) -> Self {
        GeoJsonGeometry::LineString {
            coordinates: points.iter().copied().map(Position::from).collect(),
        }
    }

    /// Every polyline in the geometry (polygon rings included)
    pub fn lines(&self) -> Vec<Vec<LatLng>> {
        let to_line = |coords: &Vec<Position>| coords.iter().map(Position::to_lat_lng).collect();
        match self {
            GeoJsonGeometry::LineString { coordinates } => vec![to_line(coordinates)],
            GeoJsonGeometry::MultiLineString { coordinates }
            | GeoJsonGeometry::Polygon { coordinates } => coordinates.iter().map(to_line).collect(),
            GeoJsonGeometry::GeometryCollection { geometries } => {
                geometries.iter().flat_map(|g| g.lines()).collect()
            }
            GeoJsonGeometry::Point { .. } | GeoJsonGeometry::MultiPoint { .. } => Vec::new(),
        }
    }

    /// Every standalone point in the geometry
    pub fn points(&self) -> Vec<LatLng> {
        match self {
            GeoJsonGeometry::Point { coordinates } => vec![coordinates.to_lat_lng()],
            GeoJsonGeometry::MultiPoint { coordinates } => {
                coordinates.iter().map(Position::to_lat_lng).collect()
            }
            GeoJsonGeometry::GeometryCollection { geometries } => {
                geometries.iter().flat_map(|g| g.points()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Converts coordinates to LatLng points
    pub fn to_lat_lng_points(&self) -> Vec<LatLng> {
        let mut points = self.points();
        points.extend(self.lines().into_iter().flatten());
        points
    }
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Option<HashMap<String, serde_json::Value>>,
}

impl GeoJsonFeature {
    pub fn new(geometry: GeoJsonGeometry) -> Self {
        Self {
            id: None,
            geometry: Some(geometry),
            properties: None,
        }
    }

    /// String property lookup
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.as_ref()?.get(key)?.as_str()
    }
}

/// Root GeoJSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJson {
    Feature(GeoJsonFeature),
    FeatureCollection { features: Vec<GeoJsonFeature> },
}

impl GeoJson {
    /// Parses a GeoJSON document
    pub fn parse(geojson_str: &str) -> Result<Self> {
        serde_json::from_str(geojson_str)
            .map_err(|e| MapError::ParseError(format!("Invalid GeoJSON: {}", e)))
    }

    /// Wraps a single feature into a collection
    pub fn single(feature: GeoJsonFeature) -> Self {
        GeoJson::FeatureCollection {
            features: vec![feature],
        }
    }

    /// Gets all features in the document
    pub fn features(&self) -> Vec<&GeoJsonFeature> {
        match self {
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::FeatureCollection { features } => features.iter().collect(),
        }
    }

    /// Every polyline across all features
    pub fn lines(&self) -> Vec<Vec<LatLng>> {
        self.features()
            .into_iter()
            .filter_map(|f| f.geometry.as_ref())
            .flat_map(|g| g.lines())
            .collect()
    }

    /// Every standalone point across all features
    pub fn points(&self) -> Vec<LatLng> {
        self.features()
            .into_iter()
            .filter_map(|f| f.geometry.as_ref())
            .flat_map(|g| g.points())
            .collect()
    }

    /// Gets the bounding box of all features
    pub fn bounds(&self) -> Option<LatLngBounds> {
        let all: Vec<LatLng> = self
            .features()
            .into_iter()
            .filter_map(|f| f.geometry.as_ref())
            .flat_map(|g| g.to_lat_lng_points())
            .collect();
        LatLngBounds::from_points(&all)
    }
}

/// The hiking trail: one immutable polyline plus the feature's properties
#[derive(Debug, Clone, PartialEq)]
pub struct Trail {
    line: Vec<LatLng>,
    properties: HashMap<String, serde_json::Value>,
}

impl Trail {
    /// Creates a trail from coordinates; needs at least two distinct points
    pub fn new(line: Vec<LatLng>) -> Result<Self> {
        Self::with_properties(line, HashMap::new())
    }

    fn with_properties(line: Vec<LatLng>, properties: HashMap<String, serde_json::Value>) -> Result<Self> {
        if let Some(bad) = line.iter().find(|p| !p.is_valid()) {
            return Err(MapError::InvalidCoordinates(format!(
                "trail contains an out-of-range coordinate {:?}",
                bad
            )));
        }

        let mut deduped: Vec<LatLng> = Vec::with_capacity(line.len());
        for point in line {
            if deduped.last() != Some(&point) {
                deduped.push(point);
            }
        }

        if deduped.len() < 2 {
            return Err(MapError::Geometry(
                "trail needs at least two distinct coordinates".to_string(),
            ));
        }

        Ok(Self {
            line: deduped,
            properties,
        })
    }

    /// Extracts the trail from the first LineString feature of a document.
    /// A MultiLineString is accepted and its parts are joined end to end.
    pub fn from_geojson(geojson: &GeoJson) -> Result<Self> {
        let feature = geojson
            .features()
            .into_iter()
            .find(|f| {
                matches!(
                    f.geometry,
                    Some(GeoJsonGeometry::LineString { .. }) | Some(GeoJsonGeometry::MultiLineString { .. })
                )
            })
            .ok_or_else(|| MapError::Geometry("no LineString feature found".to_string()))?;

        let line = feature
            .geometry
            .as_ref()
            .map(|g| g.lines().into_iter().flatten().collect())
            .unwrap_or_default();

        Self::with_properties(line, feature.properties.clone().unwrap_or_default())
    }

    /// Parses a GeoJSON document and extracts the trail
    pub fn from_geojson_str(geojson_str: &str) -> Result<Self> {
        Self::from_geojson(&GeoJson::parse(geojson_str)?)
    }

    /// Reads a GeoJSON file and extracts the trail
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&contents)
    }

    /// The trail compiled into the binary
    pub fn bundled() -> Result<Self> {
        Self::from_geojson_str(BUNDLED_TRAIL)
    }

    pub fn line(&self) -> &[LatLng] {
        &self.line
    }

    pub fn name(&self) -> Option<&str> {
        self.properties.get("name")?.as_str()
    }

    pub fn properties(&self) -> &HashMap<String, serde_json::Value> {
        &self.properties
    }

    pub fn bounds(&self) -> LatLngBounds {
        // Construction guarantees at least two points
        LatLngBounds::from_points(&self.line)
            .unwrap_or_else(|| LatLngBounds::new(self.line[0], self.line[0]))
    }

    /// Total length of the trail
    pub fn length(&self, units: Units) -> f64 {
        measure::length(&self.line, units)
    }

    /// The trail as a single-feature collection, ready to register as a source
    pub fn to_geojson(&self) -> GeoJson {
        let mut feature = GeoJsonFeature::new(GeoJsonGeometry::line_string(&self.line));
        if !self.properties.is_empty() {
            feature.properties = Some(self.properties.clone());
        }
        GeoJson::single(feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRAIGHT_TRAIL: &str = r#"
    {
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"name": "Straight"},
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-76.20, 40.20], [-76.10, 40.30, 210.5]]
                }
            }
        ]
    }
    "#;

    #[test]
    fn test_geojson_parsing() {
        let geojson = GeoJson::parse(STRAIGHT_TRAIL).unwrap();
        assert_eq!(geojson.features().len(), 1);
        assert_eq!(geojson.lines().len(), 1);
        assert!(geojson.points().is_empty());
    }

    #[test]
    fn test_position_keeps_elevation() {
        let geojson = GeoJson::parse(STRAIGHT_TRAIL).unwrap();
        let Some(GeoJsonGeometry::LineString { coordinates }) = &geojson.features()[0].geometry else {
            panic!("expected a LineString");
        };
        assert_eq!(coordinates[0].elevation, None);
        assert_eq!(coordinates[1].elevation, Some(210.5));
    }

    #[test]
    fn test_short_position_is_rejected() {
        let bad = r#"{"type": "Feature", "properties": null,
                      "geometry": {"type": "Point", "coordinates": [1.0]}}"#;
        assert!(matches!(GeoJson::parse(bad), Err(MapError::ParseError(_))));
    }

    #[test]
    fn test_trail_extraction() {
        let trail = Trail::from_geojson_str(STRAIGHT_TRAIL).unwrap();
        assert_eq!(trail.line().len(), 2);
        assert_eq!(trail.line()[0], LatLng::new(40.20, -76.20));
        assert_eq!(trail.name(), Some("Straight"));

        let bounds = trail.bounds();
        assert_eq!(bounds.south_west, LatLng::new(40.20, -76.20));
        assert_eq!(bounds.north_east, LatLng::new(40.30, -76.10));
    }

    #[test]
    fn test_trail_requires_line_feature() {
        let points_only = r#"
        {"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [-76.1, 40.2]}}
        ]}"#;
        assert!(matches!(
            Trail::from_geojson_str(points_only),
            Err(MapError::Geometry(_))
        ));
    }

    #[test]
    fn test_trail_rejects_degenerate_line() {
        let result = Trail::new(vec![LatLng::new(40.2, -76.2), LatLng::new(40.2, -76.2)]);
        assert!(matches!(result, Err(MapError::Geometry(_))));
    }

    #[test]
    fn test_trail_round_trips_through_source_geojson() {
        let trail = Trail::from_geojson_str(STRAIGHT_TRAIL).unwrap();
        let again = Trail::from_geojson(&trail.to_geojson()).unwrap();
        assert_eq!(again.line(), trail.line());
    }

    #[test]
    fn test_bundled_trail_loads() {
        let trail = Trail::bundled().unwrap();
        assert!(trail.line().len() > 10);
        assert!(trail.length(Units::Miles) > 1.0);
        assert!(trail.bounds().contains(&LatLng::new(40.25, -76.13)));
    }
}
