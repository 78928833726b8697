//! Prelude module for common trailmeter types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use trailmeter::prelude::*;`

pub use crate::core::{
    config::ViewerConfig,
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::{Map, MapCursor, MapOptions},
    viewport::Viewport,
};

pub use crate::controller::{MapViewController, Observable, ViewState};

pub use crate::data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry, Trail};

pub use crate::layers::{
    base::Layer,
    manager::LayerManager,
    marker::Marker,
    source::GeoJsonSource,
    style::{LinePaint, SerializableColor, StyleLayer},
};

pub use crate::measure::{MeasuredSegment, PointSelection, Units};

pub use crate::input::{
    events::{InputEvent, MapEvent, MouseButton},
    handler::{Action, InputHandler},
};

pub use crate::tiles::{TileCache, TileLayer, TileLoader, TileLoaderConfig, TileSource};

pub use crate::rendering::context::{DrawCommand, RenderContext};

pub use crate::ui::popup::{Popup, PopupManager};

#[cfg(feature = "egui")]
pub use crate::ui::widget::{MapViewStyle, TrailMapView};

pub use crate::{Error as MapError, Result};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
