pub mod geojson;

pub use geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry, Position, Trail};
