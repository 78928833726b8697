use crate::{
    core::{geo::Point, viewport::Viewport},
    layers::source::GeoJsonSource,
    rendering::context::RenderContext,
    Result,
};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Line,
    Marker,
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::Line => write!(f, "line"),
            LayerType::Marker => write!(f, "marker"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayerProperties {
    pub id: String,
    pub layer_type: LayerType,
    pub z_index: i32,
    pub opacity: f32,
    pub visible: bool,
    /// Takes part in pointer hit-testing
    pub interactive: bool,
}

impl LayerProperties {
    pub fn new(id: impl Into<String>, layer_type: LayerType) -> Self {
        Self {
            id: id.into(),
            layer_type,
            z_index: 0,
            opacity: 1.0,
            visible: true,
            interactive: true,
        }
    }
}

/// A feature found under the pointer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerHit {
    pub layer_id: String,
    /// Index of the feature within the layer's source
    pub feature_index: usize,
    pub properties: Option<HashMap<String, Value>>,
    /// Screen distance from the pointer to the feature
    pub distance_px: f64,
}

/// Something the map can draw and hit-test, in z-order
pub trait Layer {
    fn properties(&self) -> &LayerProperties;

    fn properties_mut(&mut self) -> &mut LayerProperties;

    fn id(&self) -> &str {
        &self.properties().id
    }

    fn layer_type(&self) -> LayerType {
        self.properties().layer_type
    }

    fn z_index(&self) -> i32 {
        self.properties().z_index
    }

    fn set_z_index(&mut self, z_index: i32) {
        self.properties_mut().z_index = z_index;
    }

    fn opacity(&self) -> f32 {
        self.properties().opacity
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.properties_mut().opacity = opacity.clamp(0.0, 1.0);
    }

    fn is_visible(&self) -> bool {
        self.properties().visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.properties_mut().visible = visible;
    }

    fn is_interactive(&self) -> bool {
        self.properties().interactive
    }

    /// ID of the source this layer draws, if it draws one
    fn source_id(&self) -> Option<&str> {
        None
    }

    fn render(
        &self,
        context: &mut RenderContext,
        viewport: &Viewport,
        source: Option<&GeoJsonSource>,
    ) -> Result<()>;

    /// Returns the closest feature within `tolerance` pixels of `pixel`
    fn hit_test(
        &self,
        _viewport: &Viewport,
        _source: Option<&GeoJsonSource>,
        _pixel: Point,
        _tolerance: f64,
    ) -> Option<LayerHit> {
        None
    }

    fn as_any(&self) -> &dyn std::any::Any;
}
