//! Trail measuring behaviour on top of the map engine.
//!
//! The controller owns the [`Map`], adds the trail once the map reports
//! `load`, and turns pairs of double-clicks into a measured, dashed segment.
//! Map events are drained and dispatched here so handlers can change both the
//! map and the [`ViewState`].

pub mod state;

pub use state::{Observable, SubscriptionId, ViewState};

use crate::{
    core::{
        config::ViewerConfig,
        geo::{LatLng, Point},
        map::{Map, MapCursor},
    },
    data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry, Trail},
    input::{InputEvent, MapEvent},
    layers::{marker::Marker, source::GeoJsonSource, style::StyleLayer},
    measure::{MeasuredSegment, SelectionStep},
    rendering::context::RenderContext,
    ui::popup::Popup,
    Result,
};
use std::time::Duration;

pub const TRAIL_ID: &str = "trail";
pub const SEGMENT_ID: &str = "trail-segment";
pub const START_MARKER_ID: &str = "segment-start";
pub const END_MARKER_ID: &str = "segment-end";
pub const TOOLTIP_ID: &str = "trail-tooltip";

/// How long the "add ending point" hint stays up after the first point
const HINT_DURATION: Duration = Duration::from_millis(1500);
const TOOLTIP_OFFSET: Point = Point { x: 12.0, y: -28.0 };
/// Padding around the trail when fitting it on load
const FIT_PADDING_PX: f64 = 40.0;

pub struct MapViewController {
    map: Map,
    trail: Trail,
    config: ViewerConfig,
    state: Observable<ViewState>,
    loaded: bool,
}

impl MapViewController {
    /// Creates the map, registers the handlers and runs the initial `load`
    pub fn mount(config: ViewerConfig, trail: Trail, size: Point) -> Result<Self> {
        let mut map = Map::new(&config, size)?;
        map.set_double_click_zoom(false);
        map.on_layer("click", TRAIL_ID, |event| {
            if let MapEvent::LayerClick {
                lat_lng,
                properties,
                ..
            } = event
            {
                log::info!(
                    "trail clicked at {:.5},{:.5}: {:?}",
                    lat_lng.lng,
                    lat_lng.lat,
                    properties
                );
            }
        });

        let state = Observable::new(ViewState::new(map.center(), map.zoom()));
        let mut controller = Self {
            map,
            trail,
            config,
            state,
            loaded: false,
        };
        controller.pump();
        Ok(controller)
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut Map {
        &mut self.map
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn state(&self) -> &ViewState {
        self.state.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Registers a callback run after every view-state change
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&ViewState) + Send + Sync + 'static,
    {
        self.state.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    /// Feeds one input event to the map and handles what it caused
    pub fn handle_input(&mut self, input: InputEvent) -> Result<()> {
        self.map.handle_input(input)?;
        self.pump();
        Ok(())
    }

    /// Dispatches queued map events until none are left; returns how many ran
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while self.map.pending_events() > 0 {
            for event in self.map.process_events() {
                handled += 1;
                if let Err(e) = self.dispatch(&event) {
                    log::error!("handling {} failed: {}", event.event_type(), e);
                }
            }
        }
        handled
    }

    /// Per-frame housekeeping; true when the view should be repainted
    pub fn tick(&mut self) -> bool {
        let changed = self.map.update();
        self.pump();
        changed
    }

    pub fn render(&self, context: &mut RenderContext) -> Result<()> {
        self.map.render(context)
    }

    /// Removes the measured segment, its markers and any pending point
    pub fn clear_measurement(&mut self) {
        self.remove_measurement();
        self.map.remove_popup(TOOLTIP_ID);
        self.state.update(|s| {
            s.selection.reset();
            s.segment = None;
        });
        self.pump();
        log::info!("measurement cleared");
    }

    fn dispatch(&mut self, event: &MapEvent) -> Result<()> {
        match event {
            MapEvent::Load => self.on_load(),
            MapEvent::Move { center, zoom } => {
                let (center, zoom) = (*center, *zoom);
                self.state.update(|s| {
                    s.center = center;
                    s.zoom = zoom;
                });
                Ok(())
            }
            MapEvent::DoubleClick { lat_lng, .. } => self.on_double_click(*lat_lng),
            MapEvent::MouseEnter {
                layer_id, lat_lng, ..
            } if layer_id == TRAIL_ID => {
                self.map.set_cursor(MapCursor::Pointer);
                self.show_tooltip(*lat_lng, None);
                self.state.update(|s| s.hovering_trail = true);
                Ok(())
            }
            MapEvent::MouseMove { lat_lng, .. } if self.state.get().hovering_trail => {
                self.show_tooltip(*lat_lng, None);
                Ok(())
            }
            MapEvent::MouseLeave { layer_id } if layer_id == TRAIL_ID => {
                self.map.set_cursor(MapCursor::Default);
                self.map.remove_popup(TOOLTIP_ID);
                self.state.update(|s| s.hovering_trail = false);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn on_load(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }

        self.map
            .add_source(GeoJsonSource::new(TRAIL_ID, self.trail.to_geojson()))?;
        self.map.add_layer(Box::new(StyleLayer::line(
            TRAIL_ID,
            TRAIL_ID,
            self.config.trail_paint.clone(),
        )))?;
        self.loaded = true;

        if self.config.fit_trail_on_load {
            self.map.fit_bounds(&self.trail.bounds(), Some(FIT_PADDING_PX));
        }

        log::info!(
            "trail '{}' loaded: {} points, {:.2} {}",
            self.trail.name().unwrap_or("unnamed"),
            self.trail.line().len(),
            self.trail.length(self.config.units),
            self.config.units
        );
        Ok(())
    }

    fn on_double_click(&mut self, lat_lng: LatLng) -> Result<()> {
        let mut selection = self.state.get().selection.clone();
        if !selection.is_awaiting_second() {
            // New pair: the map rejects duplicate IDs, so drop the old measurement
            self.remove_measurement();
        }

        match selection.record(lat_lng) {
            SelectionStep::Start => {
                log::info!("start point {:.5},{:.5}", lat_lng.lng, lat_lng.lat);
                self.map.add_marker(Marker::new(START_MARKER_ID, lat_lng).with_label("A"))?;
                self.state.update(|s| {
                    s.selection = selection;
                    s.segment = None;
                });
                self.show_tooltip(lat_lng, Some(HINT_DURATION));
            }
            SelectionStep::End => {
                log::info!("end point {:.5},{:.5}", lat_lng.lng, lat_lng.lat);
                self.map.add_marker(Marker::new(END_MARKER_ID, lat_lng).with_label("B"))?;
                let pair = selection.take_pair();
                self.state.update(|s| s.selection = selection);

                // The hint now asks for a starting point again
                if self.state.get().hovering_trail {
                    self.show_tooltip(lat_lng, None);
                } else {
                    self.map.remove_popup(TOOLTIP_ID);
                }

                if let Some((start, end)) = pair {
                    self.measure(start, end)?;
                }
            }
        }
        Ok(())
    }

    fn measure(&mut self, start: LatLng, end: LatLng) -> Result<()> {
        let segment = MeasuredSegment::measure(self.trail.line(), start, end, self.config.units)?;

        let geojson = GeoJson::single(GeoJsonFeature::new(GeoJsonGeometry::line_string(
            &segment.line,
        )));
        self.map.add_source(GeoJsonSource::new(SEGMENT_ID, geojson))?;
        self.map.add_layer(Box::new(
            StyleLayer::line(SEGMENT_ID, SEGMENT_ID, self.config.segment_paint.clone())
                .with_z_index(1),
        ))?;

        log::info!(
            "measured {} over {} points",
            segment.display_text(),
            segment.line.len()
        );
        self.state.update(|s| s.segment = Some(segment));
        Ok(())
    }

    /// Shows the single tooltip with the hint for the next point
    fn show_tooltip(&mut self, at: LatLng, auto_close: Option<Duration>) {
        let text = self.state.get().selection.hint();
        let mut popup = Popup::new(TOOLTIP_ID, at, text).with_offset(TOOLTIP_OFFSET);
        if let Some(duration) = auto_close {
            popup = popup.with_auto_close(duration);
        }
        self.map.show_popup(popup);
    }

    fn remove_measurement(&mut self) {
        for marker_id in [START_MARKER_ID, END_MARKER_ID] {
            if self.map.has_layer(marker_id) {
                if let Err(e) = self.map.remove_marker(marker_id) {
                    log::warn!("{}", e);
                }
            }
        }
        if self.map.has_layer(SEGMENT_ID) {
            if let Err(e) = self.map.remove_layer(SEGMENT_ID) {
                log::warn!("{}", e);
            }
        }
        if self.map.has_source(SEGMENT_ID) {
            if let Err(e) = self.map.remove_source(SEGMENT_ID) {
                log::warn!("{}", e);
            }
        }
    }
}
