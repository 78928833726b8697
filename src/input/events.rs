use crate::core::geo::{LatLng, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw pointer input in container pixels, as delivered by the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Single click/tap
    Click {
        position: Point,
        button: MouseButton,
    },
    /// Double click/tap
    DoubleClick { position: Point },
    /// Pointer moved inside the map
    MouseMove { position: Point },
    /// Start of drag operation
    DragStart { position: Point },
    /// Drag in progress
    Drag { delta: Point },
    /// End of drag operation
    DragEnd,
    /// Scroll wheel; positive delta zooms in
    Scroll { delta: f64, position: Point },
    /// Viewport/window resize
    Resize { size: Point },
    /// Pointer left the map container
    PointerLeave,
}

/// Mouse button types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

impl InputEvent {
    /// Gets the primary position associated with this event, if any
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::Click { position, .. } => Some(*position),
            InputEvent::DoubleClick { position } => Some(*position),
            InputEvent::MouseMove { position } => Some(*position),
            InputEvent::DragStart { position } => Some(*position),
            InputEvent::Scroll { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Checks if this is a mouse/pointer event
    pub fn is_pointer_event(&self) -> bool {
        !matches!(self, InputEvent::Resize { .. })
    }
}

/// Events the map emits, either map-wide or scoped to one layer
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The map is ready and sources/layers may be added
    Load,
    /// Center or zoom changed
    Move { center: LatLng, zoom: f64 },
    Click { lat_lng: LatLng, pixel: Point },
    DoubleClick { lat_lng: LatLng, pixel: Point },
    MouseMove { lat_lng: LatLng, pixel: Point },
    /// Click that landed on a feature of an interactive layer
    LayerClick {
        layer_id: String,
        lat_lng: LatLng,
        pixel: Point,
        properties: Option<HashMap<String, serde_json::Value>>,
    },
    /// Pointer started hovering a layer
    MouseEnter {
        layer_id: String,
        lat_lng: LatLng,
        pixel: Point,
    },
    /// Pointer stopped hovering a layer
    MouseLeave { layer_id: String },
    SourceAdd { source_id: String },
    SourceRemove { source_id: String },
    LayerAdd { layer_id: String },
    LayerRemove { layer_id: String },
}

impl MapEvent {
    /// Name listeners subscribe with
    pub fn event_type(&self) -> &'static str {
        match self {
            MapEvent::Load => "load",
            MapEvent::Move { .. } => "move",
            MapEvent::Click { .. } | MapEvent::LayerClick { .. } => "click",
            MapEvent::DoubleClick { .. } => "dblclick",
            MapEvent::MouseMove { .. } => "mousemove",
            MapEvent::MouseEnter { .. } => "mouseenter",
            MapEvent::MouseLeave { .. } => "mouseleave",
            MapEvent::SourceAdd { .. } => "sourceadd",
            MapEvent::SourceRemove { .. } => "sourceremove",
            MapEvent::LayerAdd { .. } => "layeradd",
            MapEvent::LayerRemove { .. } => "layerremove",
        }
    }

    /// Layer a pointer event is scoped to
    pub fn layer_id(&self) -> Option<&str> {
        match self {
            MapEvent::LayerClick { layer_id, .. }
            | MapEvent::MouseEnter { layer_id, .. }
            | MapEvent::MouseLeave { layer_id } => Some(layer_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_event_position() {
        let click = InputEvent::Click {
            position: Point::new(100.0, 200.0),
            button: MouseButton::Left,
        };
        assert_eq!(click.position(), Some(Point::new(100.0, 200.0)));
        assert_eq!(InputEvent::DragEnd.position(), None);
        assert!(click.is_pointer_event());
        assert!(!InputEvent::Resize {
            size: Point::new(10.0, 10.0)
        }
        .is_pointer_event());
    }

    #[test]
    fn test_layer_scoped_events() {
        let enter = MapEvent::MouseEnter {
            layer_id: "trail".to_string(),
            lat_lng: LatLng::new(40.25, -76.15),
            pixel: Point::new(0.0, 0.0),
        };
        assert_eq!(enter.event_type(), "mouseenter");
        assert_eq!(enter.layer_id(), Some("trail"));

        let click = MapEvent::Click {
            lat_lng: LatLng::new(40.25, -76.15),
            pixel: Point::new(0.0, 0.0),
        };
        assert_eq!(click.event_type(), "click");
        assert_eq!(click.layer_id(), None);
        assert_eq!(MapEvent::Load.event_type(), "load");
    }
}
