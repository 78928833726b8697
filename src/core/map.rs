use crate::{
    core::{
        config::ViewerConfig,
        constants::{DEFAULT_HIT_TOLERANCE_PX, DEFAULT_ZOOM_DELTA, MAX_ZOOM, MIN_ZOOM},
        geo::{LatLng, LatLngBounds, Point},
        viewport::Viewport,
    },
    input::{execute_action, EventManager, InputEvent, InputHandler, MapEvent, MouseButton},
    layers::{
        base::{Layer, LayerType},
        manager::LayerManager,
        marker::Marker,
        source::GeoJsonSource,
    },
    prelude::HashSet,
    rendering::context::RenderContext,
    tiles::{cache::TileCache, layer::TileLayer, source::source_for_style},
    ui::{
        controls::{NavButton, NavigationControl},
        popup::{Popup, PopupManager},
    },
    MapError, Result,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub dragging: bool,
    pub scroll_wheel_zoom: bool,
    pub double_click_zoom: bool,
    pub navigation_control: bool,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_delta: f64,
    /// Pixels beyond a line's half-width that still hit it
    pub hit_tolerance_px: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            dragging: true,
            scroll_wheel_zoom: true,
            double_click_zoom: true,
            navigation_control: true,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_delta: DEFAULT_ZOOM_DELTA,
            hit_tolerance_px: DEFAULT_HIT_TOLERANCE_PX,
        }
    }
}

impl MapOptions {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            ..Self::default()
        }
    }
}

/// Pointer shape the host UI should show over the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapCursor {
    #[default]
    Default,
    Pointer,
    Grab,
    Grabbing,
}

/// The map: viewport, sources and layers, markers, popups and event dispatch.
///
/// A `Load` event is queued on creation, so listeners registered right after
/// `new` see it on the first [`Map::process_events`].
pub struct Map {
    viewport: Viewport,
    options: MapOptions,
    style_url: String,
    layers: LayerManager,
    popups: PopupManager,
    navigation: NavigationControl,
    cursor: MapCursor,
    /// Interactive layers currently under the pointer
    hovered: HashSet<String>,
    input: InputHandler,
    events: EventManager,
    tiles: Option<TileLayer>,
}

impl Map {
    /// Creates a map from configuration, including the raster basemap when
    /// `load_tiles` is set
    pub fn new(config: &ViewerConfig, size: Point) -> Result<Self> {
        config.validate()?;

        let viewport = Viewport::new(config.center, config.zoom, size);
        let mut map = Self::with_options(viewport, MapOptions::from_config(config));
        map.style_url = config.style_url.clone();

        if config.load_tiles {
            let source = source_for_style(&config.style_url, &config.access_token)?;
            map.tiles = Some(TileLayer::new(source, TileCache::new(config.tile_cache_capacity)));
        }

        log::info!(
            "map created at {:.4},{:.4} zoom {:.2} with style {}",
            config.center.lng,
            config.center.lat,
            config.zoom,
            config.style_url
        );
        Ok(map)
    }

    /// Creates a map without a basemap
    pub fn with_options(mut viewport: Viewport, options: MapOptions) -> Self {
        viewport.set_zoom_limits(options.min_zoom, options.max_zoom);

        let mut input = InputHandler::new();
        input.pan_on_drag = options.dragging;
        input.zoom_on_wheel = options.scroll_wheel_zoom;
        input.zoom_on_double_click = options.double_click_zoom;
        input.zoom_delta = options.zoom_delta;

        let navigation = NavigationControl {
            visible: options.navigation_control,
            ..NavigationControl::default()
        };

        let mut events = EventManager::new();
        events.emit(MapEvent::Load);

        Self {
            viewport,
            options,
            style_url: String::new(),
            layers: LayerManager::new(),
            popups: PopupManager::new(),
            navigation,
            cursor: MapCursor::Default,
            hovered: HashSet::default(),
            input,
            events,
            tiles: None,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn style_url(&self) -> &str {
        &self.style_url
    }

    pub fn center(&self) -> LatLng {
        self.viewport.center
    }

    pub fn zoom(&self) -> f64 {
        self.viewport.zoom
    }

    pub fn set_tile_layer(&mut self, tiles: Option<TileLayer>) {
        self.tiles = tiles;
    }

    pub fn tile_layer(&self) -> Option<&TileLayer> {
        self.tiles.as_ref()
    }

    pub fn set_double_click_zoom(&mut self, enabled: bool) {
        self.options.double_click_zoom = enabled;
        self.input.zoom_on_double_click = enabled;
    }

    pub fn navigation_control(&self) -> Option<&NavigationControl> {
        self.navigation.visible.then_some(&self.navigation)
    }

    pub fn is_dragging(&self) -> bool {
        self.input.is_dragging()
    }

    // View

    fn view_changed(&mut self, before: (LatLng, f64)) {
        if before != (self.viewport.center, self.viewport.zoom) {
            self.events.emit(MapEvent::Move {
                center: self.viewport.center,
                zoom: self.viewport.zoom,
            });
        }
    }

    pub fn set_view(&mut self, center: LatLng, zoom: f64) -> Result<()> {
        if !center.is_valid() {
            return Err(MapError::InvalidCoordinates(format!("{:?}", center)));
        }
        let before = (self.viewport.center, self.viewport.zoom);
        self.viewport.set_center(center);
        self.viewport.set_zoom(zoom);
        self.view_changed(before);
        Ok(())
    }

    pub fn zoom_to(&mut self, zoom: f64, focus_point: Option<Point>) {
        let before = (self.viewport.center, self.viewport.zoom);
        self.viewport.zoom_to(zoom, focus_point);
        self.view_changed(before);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_to(self.viewport.zoom + self.options.zoom_delta, None);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_to(self.viewport.zoom - self.options.zoom_delta, None);
    }

    pub fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: Option<f64>) {
        let before = (self.viewport.center, self.viewport.zoom);
        self.viewport.fit_bounds(bounds, padding);
        self.view_changed(before);
    }

    pub fn resize(&mut self, size: Point) {
        if size != self.viewport.size {
            self.viewport.set_size(size);
        }
    }

    // Sources and layers

    pub fn add_source(&mut self, source: GeoJsonSource) -> Result<()> {
        let source_id = source.id().to_string();
        self.layers.add_source(source)?;
        log::debug!("source '{}' added", source_id);
        self.events.emit(MapEvent::SourceAdd { source_id });
        Ok(())
    }

    pub fn remove_source(&mut self, source_id: &str) -> Result<()> {
        self.layers.remove_source(source_id)?;
        log::debug!("source '{}' removed", source_id);
        self.events.emit(MapEvent::SourceRemove {
            source_id: source_id.to_string(),
        });
        Ok(())
    }

    pub fn get_source(&self, source_id: &str) -> Option<&GeoJsonSource> {
        self.layers.get_source(source_id)
    }

    pub fn has_source(&self, source_id: &str) -> bool {
        self.layers.has_source(source_id)
    }

    pub fn add_layer(&mut self, layer: Box<dyn Layer>) -> Result<()> {
        let layer_id = layer.id().to_string();
        self.layers.add_layer(layer)?;
        log::debug!("layer '{}' added", layer_id);
        self.events.emit(MapEvent::LayerAdd { layer_id });
        Ok(())
    }

    pub fn remove_layer(&mut self, layer_id: &str) -> Result<()> {
        self.layers.remove_layer(layer_id)?;
        self.hovered.remove(layer_id);
        log::debug!("layer '{}' removed", layer_id);
        self.events.emit(MapEvent::LayerRemove {
            layer_id: layer_id.to_string(),
        });
        Ok(())
    }

    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn Layer> {
        self.layers.get_layer(layer_id)
    }

    pub fn has_layer(&self, layer_id: &str) -> bool {
        self.layers.has_layer(layer_id)
    }

    /// All layer IDs in render order, markers included
    pub fn layer_ids(&self) -> Vec<String> {
        self.layers.layer_ids()
    }

    /// IDs of the style layers, without markers
    pub fn style_layer_ids(&self) -> Vec<String> {
        self.layers
            .layers()
            .into_iter()
            .filter(|l| l.layer_type() != LayerType::Marker)
            .map(|l| l.id().to_string())
            .collect()
    }

    pub fn add_marker(&mut self, marker: Marker) -> Result<()> {
        self.add_layer(Box::new(marker))
    }

    pub fn remove_marker(&mut self, marker_id: &str) -> Result<()> {
        let is_marker = self
            .layers
            .get_layer(marker_id)
            .is_some_and(|layer| layer.layer_type() == LayerType::Marker);
        if !is_marker {
            return Err(MapError::Layer(format!(
                "There is no marker with ID \"{}\"",
                marker_id
            )));
        }
        self.remove_layer(marker_id)
    }

    pub fn marker(&self, marker_id: &str) -> Option<&Marker> {
        self.layers.get_layer(marker_id)?.as_any().downcast_ref::<Marker>()
    }

    // Popups and cursor

    /// Shows a popup, replacing any popup with the same ID
    pub fn show_popup(&mut self, popup: Popup) {
        self.popups.add_popup(popup);
    }

    pub fn remove_popup(&mut self, popup_id: &str) -> Option<Popup> {
        self.popups.remove_popup(popup_id)
    }

    pub fn popups(&self) -> &PopupManager {
        &self.popups
    }

    pub fn cursor(&self) -> MapCursor {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: MapCursor) {
        self.cursor = cursor;
    }

    // Events

    /// Listen to a map-wide event ("load", "move", "click", "dblclick", ...)
    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.events.on(event_type, callback);
    }

    /// Listen to pointer events on one layer ("click", "mouseenter", "mouseleave")
    pub fn on_layer<F>(&mut self, event_type: &str, layer_id: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.events.on_layer(event_type, layer_id, callback);
    }

    /// Runs listeners for queued events and returns them for the caller to dispatch
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        self.events.process_events()
    }

    pub fn pending_events(&self) -> usize {
        self.events.pending_events()
    }

    /// Turns raw input into map events and view changes
    pub fn handle_input(&mut self, input: InputEvent) -> Result<()> {
        match &input {
            InputEvent::Click {
                position,
                button: MouseButton::Left,
            } => {
                if let Some(button) = self.navigation.hit(*position, self.viewport.size) {
                    match button {
                        NavButton::ZoomIn => self.zoom_in(),
                        NavButton::ZoomOut => self.zoom_out(),
                    }
                    return Ok(());
                }
                self.emit_click(*position);
            }
            InputEvent::DoubleClick { position } => {
                if self.navigation.hit(*position, self.viewport.size).is_some() {
                    return Ok(());
                }
                let lat_lng = self.viewport.pixel_to_lat_lng(position);
                self.events.emit(MapEvent::DoubleClick {
                    lat_lng,
                    pixel: *position,
                });
            }
            InputEvent::MouseMove { position } => {
                let lat_lng = self.viewport.pixel_to_lat_lng(position);
                self.events.emit(MapEvent::MouseMove {
                    lat_lng,
                    pixel: *position,
                });
                self.update_hover(*position);
            }
            InputEvent::PointerLeave => self.clear_hover(),
            _ => {}
        }

        let before = (self.viewport.center, self.viewport.zoom);
        let actions = self.input.handle_event(&input, self.viewport.zoom);
        let mut changed = false;
        for action in &actions {
            changed |= execute_action(&mut self.viewport, action);
        }
        if changed {
            self.view_changed(before);
        }
        Ok(())
    }

    fn emit_click(&mut self, pixel: Point) {
        let lat_lng = self.viewport.pixel_to_lat_lng(&pixel);
        self.events.emit(MapEvent::Click { lat_lng, pixel });

        for hit in self
            .layers
            .hit_test(&self.viewport, pixel, self.options.hit_tolerance_px)
        {
            self.events.emit(MapEvent::LayerClick {
                layer_id: hit.layer_id,
                lat_lng,
                pixel,
                properties: hit.properties,
            });
        }
    }

    fn update_hover(&mut self, pixel: Point) {
        let lat_lng = self.viewport.pixel_to_lat_lng(&pixel);
        let hits = self
            .layers
            .hit_test(&self.viewport, pixel, self.options.hit_tolerance_px);
        let current: HashSet<String> = hits.into_iter().map(|h| h.layer_id).collect();

        let mut left: Vec<String> = self.hovered.difference(&current).cloned().collect();
        left.sort();
        for layer_id in left {
            self.events.emit(MapEvent::MouseLeave { layer_id });
        }

        let mut entered: Vec<String> = current.difference(&self.hovered).cloned().collect();
        entered.sort();
        for layer_id in entered {
            self.events.emit(MapEvent::MouseEnter {
                layer_id,
                lat_lng,
                pixel,
            });
        }

        self.hovered = current;
    }

    fn clear_hover(&mut self) {
        let mut left: Vec<String> = self.hovered.drain().collect();
        left.sort();
        for layer_id in left {
            self.events.emit(MapEvent::MouseLeave { layer_id });
        }
    }

    // Frame

    /// Expires popups and pumps tile downloads; true when a repaint is due
    pub fn update(&mut self) -> bool {
        let popups_changed = self.popups.update();
        let tiles_arrived = match &mut self.tiles {
            Some(tiles) => tiles.update(&self.viewport),
            None => false,
        };
        popups_changed || tiles_arrived
    }

    /// Fills `context` with this frame's draw commands: basemap, then layers
    pub fn render(&self, context: &mut RenderContext) -> Result<()> {
        context.begin_frame();
        if let Some(tiles) = &self.tiles {
            tiles.render(context, &self.viewport)?;
        }
        self.layers.render(context, &self.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry},
        layers::style::{LinePaint, StyleLayer},
    };

    fn test_map() -> Map {
        let viewport = Viewport::new(LatLng::new(40.25, -76.15), 11.0, Point::new(800.0, 600.0));
        let mut map = Map::with_options(viewport, MapOptions::default());
        let line = [LatLng::new(40.20, -76.20), LatLng::new(40.30, -76.10)];
        map.add_source(GeoJsonSource::new(
            "trail",
            GeoJson::single(GeoJsonFeature::new(GeoJsonGeometry::line_string(&line))),
        ))
        .unwrap();
        map.add_layer(Box::new(StyleLayer::line("trail", "trail", LinePaint::default())))
            .unwrap();
        map
    }

    #[test]
    fn test_load_is_first_event() {
        let mut map = test_map();
        let events = map.process_events();
        assert_eq!(events.first(), Some(&MapEvent::Load));
        assert!(events.contains(&MapEvent::LayerAdd {
            layer_id: "trail".to_string()
        }));
    }

    #[test]
    fn test_hover_enter_and_leave() {
        let mut map = test_map();
        map.process_events();
        let on_line = map.viewport().lat_lng_to_pixel(&LatLng::new(40.25, -76.15));

        map.handle_input(InputEvent::MouseMove { position: on_line }).unwrap();
        // still hovering: no second enter
        map.handle_input(InputEvent::MouseMove { position: on_line }).unwrap();
        let events = map.process_events();
        let enters = events
            .iter()
            .filter(|e| matches!(e, MapEvent::MouseEnter { .. }))
            .count();
        assert_eq!(enters, 1);

        map.handle_input(InputEvent::MouseMove {
            position: Point::new(10.0, 590.0),
        })
        .unwrap();
        let events = map.process_events();
        assert!(events.contains(&MapEvent::MouseLeave {
            layer_id: "trail".to_string()
        }));
    }

    #[test]
    fn test_disabled_double_click_zoom_keeps_view() {
        let mut map = test_map();
        map.set_double_click_zoom(false);
        map.process_events();

        map.handle_input(InputEvent::DoubleClick {
            position: Point::new(400.0, 300.0),
        })
        .unwrap();
        let events = map.process_events();

        assert_eq!(map.zoom(), 11.0);
        assert!(matches!(events.as_slice(), [MapEvent::DoubleClick { .. }]));
    }

    #[test]
    fn test_double_click_zoom_emits_move() {
        let mut map = test_map();
        map.process_events();

        map.handle_input(InputEvent::DoubleClick {
            position: Point::new(400.0, 300.0),
        })
        .unwrap();
        let events = map.process_events();

        assert_eq!(map.zoom(), 12.0);
        assert!(events.iter().any(|e| matches!(e, MapEvent::Move { .. })));
    }

    #[test]
    fn test_navigation_buttons_zoom() {
        let mut map = test_map();
        map.handle_input(InputEvent::Click {
            position: Point::new(775.0, 20.0),
            button: MouseButton::Left,
        })
        .unwrap();
        assert_eq!(map.zoom(), 12.0);

        map.handle_input(InputEvent::Click {
            position: Point::new(775.0, 50.0),
            button: MouseButton::Left,
        })
        .unwrap();
        assert_eq!(map.zoom(), 11.0);
    }

    #[test]
    fn test_layer_click_carries_properties() {
        let mut map = test_map();
        map.process_events();
        let on_line = map.viewport().lat_lng_to_pixel(&LatLng::new(40.25, -76.15));

        map.handle_input(InputEvent::Click {
            position: on_line,
            button: MouseButton::Left,
        })
        .unwrap();
        let events = map.process_events();

        assert!(matches!(events[0], MapEvent::Click { .. }));
        assert!(matches!(
            &events[1],
            MapEvent::LayerClick { layer_id, .. } if layer_id == "trail"
        ));
    }

    #[test]
    fn test_markers_are_separate_from_style_layers() {
        let mut map = test_map();
        map.add_marker(Marker::new("segment-start", LatLng::new(40.2, -76.2)))
            .unwrap();

        assert_eq!(map.style_layer_ids(), vec!["trail"]);
        assert_eq!(map.layer_ids(), vec!["trail", "segment-start"]);
        assert!(map.marker("segment-start").is_some());
        assert!(map.remove_marker("trail").is_err());
        map.remove_marker("segment-start").unwrap();
        assert!(map.marker("segment-start").is_none());
    }

    #[test]
    fn test_render_draws_trail() {
        let map = test_map();
        let mut context = RenderContext::new(800, 600).unwrap();
        map.render(&mut context).unwrap();
        assert_eq!(context.line_layer_ids(), vec!["trail"]);
    }
}
