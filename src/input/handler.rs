use crate::{
    core::{constants::DEFAULT_ZOOM_DELTA, geo::Point, viewport::Viewport},
    input::events::{InputEvent, MapEvent},
    prelude::HashMap,
};
use std::collections::VecDeque;

/// View change produced by pointer input
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Pan { delta: Point },
    Zoom { level: f64, focus_point: Option<Point> },
    Resize { size: Point },
}

/// Event listener callback type
pub type EventCallback = Box<dyn Fn(&MapEvent) + Send + Sync>;

/// Event queue plus map-wide and per-layer listeners
#[derive(Default)]
pub struct EventManager {
    /// Map-wide listeners by event type
    listeners: HashMap<String, Vec<EventCallback>>,
    /// Listeners scoped to (event type, layer id)
    layer_listeners: HashMap<(String, String), Vec<EventCallback>>,
    event_queue: VecDeque<MapEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a map-wide event listener
    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.listeners
            .entry(event_type.to_string())
            .or_default()
            .push(Box::new(callback));
    }

    /// Register a listener for events on one layer
    pub fn on_layer<F>(&mut self, event_type: &str, layer_id: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.layer_listeners
            .entry((event_type.to_string(), layer_id.to_string()))
            .or_default()
            .push(Box::new(callback));
    }

    /// Drops every listener registered for `event_type`
    pub fn off(&mut self, event_type: &str) {
        self.listeners.remove(event_type);
        self.layer_listeners.retain(|(kind, _), _| kind != event_type);
    }

    /// Emit an event to the queue
    pub fn emit(&mut self, event: MapEvent) {
        self.event_queue.push_back(event);
    }

    /// Runs listeners for every queued event and hands the events back
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        let events: Vec<_> = self.event_queue.drain(..).collect();

        for event in &events {
            let callbacks = match event.layer_id() {
                Some(layer_id) => self
                    .layer_listeners
                    .get(&(event.event_type().to_string(), layer_id.to_string())),
                None => self.listeners.get(event.event_type()),
            };

            if let Some(callbacks) = callbacks {
                for callback in callbacks {
                    callback(event);
                }
            }
        }

        events
    }

    /// Clear all events from the queue
    pub fn clear_events(&mut self) {
        self.event_queue.clear();
    }

    /// Get number of pending events
    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }
}

/// Applies an action to the viewport; returns whether the view changed
pub fn execute_action(viewport: &mut Viewport, action: &Action) -> bool {
    let before = (viewport.center, viewport.zoom, viewport.size);
    match action {
        Action::Pan { delta } => {
            viewport.pan(*delta);
        }
        Action::Zoom { level, focus_point } => viewport.zoom_to(*level, *focus_point),
        Action::Resize { size } => viewport.set_size(*size),
    }
    before != (viewport.center, viewport.zoom, viewport.size)
}

/// Turns pointer input into view actions according to the interaction options
pub struct InputHandler {
    pub enabled: bool,
    pub pan_on_drag: bool,
    pub zoom_on_wheel: bool,
    pub zoom_on_double_click: bool,
    /// Zoom levels per wheel notch or double-click
    pub zoom_delta: f64,
    dragging: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            enabled: true,
            pan_on_drag: true,
            zoom_on_wheel: true,
            zoom_on_double_click: true,
            zoom_delta: DEFAULT_ZOOM_DELTA,
            dragging: false,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Handle one input event and return the view actions it causes
    pub fn handle_event(&mut self, event: &InputEvent, current_zoom: f64) -> Vec<Action> {
        if !self.enabled {
            return vec![];
        }

        match event {
            InputEvent::DragStart { .. } if self.pan_on_drag => {
                self.dragging = true;
                vec![]
            }
            InputEvent::Drag { delta } if self.pan_on_drag && self.dragging => {
                vec![Action::Pan { delta: *delta }]
            }
            InputEvent::DragEnd => {
                self.dragging = false;
                vec![]
            }
            InputEvent::Scroll { delta, position } if self.zoom_on_wheel && *delta != 0.0 => {
                let step = if *delta > 0.0 { self.zoom_delta } else { -self.zoom_delta };
                vec![Action::Zoom {
                    level: current_zoom + step,
                    focus_point: Some(*position),
                }]
            }
            InputEvent::DoubleClick { position } if self.zoom_on_double_click => {
                vec![Action::Zoom {
                    level: current_zoom + self.zoom_delta,
                    focus_point: Some(*position),
                }]
            }
            InputEvent::Resize { size } => vec![Action::Resize { size: *size }],
            _ => vec![],
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
