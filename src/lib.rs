//! # trailmeter
//!
//! A small slippy-map viewer for a single hiking trail. The trail is loaded
//! from GeoJSON and drawn as a line layer; double-clicking two points along it
//! slices out the segment between them and reports its length.
//!
//! The crate is split the way a map engine usually is: `core` holds the
//! projection, viewport and the `Map` itself, `layers` the sources and style
//! layers, `input` the event plumbing, `measure` the line geometry, and
//! `controller` wires them together into the trail-measuring behaviour.

pub mod controller;
pub mod core;
pub mod data;
pub mod input;
pub mod layers;
pub mod measure;
pub mod prelude;
pub mod rendering;
pub mod tiles;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    config::ViewerConfig,
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::{Map, MapOptions},
    viewport::Viewport,
};

pub use controller::{MapViewController, ViewState};

pub use data::geojson::{GeoJson, Trail};

pub use input::{events::InputEvent, events::MapEvent};

pub use measure::{line_slice, length, nearest_point_on_line, MeasuredSegment, Units};

pub use rendering::context::RenderContext;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Error type alias for convenience
pub type Error = MapError;
