use crate::core::{
    constants::{MAX_ZOOM, MIN_ZOOM, TILE_SIZE},
    geo::{LatLng, LatLngBounds, Point, TileCoord, EARTH_RADIUS, MAX_LATITUDE},
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center: Self::clamp_center(center),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            size,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }

    /// Sets the center of the viewport, clamped to the projectable world
    pub fn set_center(&mut self, center: LatLng) {
        self.center = Self::clamp_center(center);
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom.max(min_zoom);
        self.zoom = self.zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Gets the scale factor for the current zoom level
    pub fn scale(&self) -> f64 {
        2_f64.powf(self.zoom)
    }

    /// Projects a LatLng to world pixel coordinates (EPSG:3857) at the given zoom level
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let z = zoom.unwrap_or(self.zoom);
        let world_size = TILE_SIZE as f64 * 2_f64.powf(z);
        let mercator = lat_lng.to_mercator();
        let circumference = 2.0 * PI * EARTH_RADIUS;

        Point::new(
            (mercator.x + PI * EARTH_RADIUS) / circumference * world_size,
            (-mercator.y + PI * EARTH_RADIUS) / circumference * world_size,
        )
    }

    /// Unprojects world pixel coordinates back to LatLng at the given zoom level
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let z = zoom.unwrap_or(self.zoom);
        let world_size = TILE_SIZE as f64 * 2_f64.powf(z);
        let circumference = 2.0 * PI * EARTH_RADIUS;

        let x = pixel.x / world_size * circumference - PI * EARTH_RADIUS;
        let y = PI * EARTH_RADIUS - pixel.y / world_size * circumference;

        LatLng::from_mercator(Point::new(x, y))
    }

    /// World pixel position of the viewport's top-left corner
    fn pixel_origin(&self) -> Point {
        self.project(&self.center, None)
            .subtract(&Point::new(self.size.x / 2.0, self.size.y / 2.0))
    }

    /// Converts a geographical coordinate to container pixel coordinates
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        self.project(lat_lng, None).subtract(&self.pixel_origin())
    }

    /// Converts container pixel coordinates back to geographical coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        self.unproject(&pixel.add(&self.pixel_origin()), None)
    }

    /// Pans the viewport so the content moves by the given pixel offset.
    /// Returns the offset actually applied after clamping.
    pub fn pan(&mut self, delta: Point) -> Point {
        let current = self.project(&self.center, None);
        let target = current.subtract(&delta);
        self.set_center(self.unproject(&target, None));
        current.subtract(&self.project(&self.center, None))
    }

    /// Zooms the viewport to a specific level, keeping `focus_point` stationary on screen
    pub fn zoom_to(&mut self, zoom: f64, focus_point: Option<Point>) {
        let new_zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < 0.001 {
            return;
        }

        match focus_point {
            Some(focus_screen) => {
                let focus_lat_lng = self.pixel_to_lat_lng(&focus_screen);
                self.zoom = new_zoom;
                let drifted = self.lat_lng_to_pixel(&focus_lat_lng);
                self.pan(focus_screen.subtract(&drifted));
            }
            None => self.zoom = new_zoom,
        }
    }

    /// Gets the current viewport bounds in geographical coordinates
    pub fn bounds(&self) -> LatLngBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&self.size);

        LatLngBounds::new(LatLng::new(se.lat, nw.lng), LatLng::new(nw.lat, se.lng))
    }

    /// Fits the viewport to contain the given bounds
    pub fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: Option<f64>) {
        let padding = padding.unwrap_or(20.0);
        let available = Point::new(
            (self.size.x - 2.0 * padding).max(1.0),
            (self.size.y - 2.0 * padding).max(1.0),
        );

        let nw = LatLng::new(bounds.north_east.lat, bounds.south_west.lng);
        let se = LatLng::new(bounds.south_west.lat, bounds.north_east.lng);

        // Extent in pixels at zoom 0, each zoom level doubles it
        let nw0 = self.project(&nw, Some(0.0));
        let se0 = self.project(&se, Some(0.0));
        let width0 = (se0.x - nw0.x).abs();
        let height0 = (se0.y - nw0.y).abs();

        let zoom = if width0 == 0.0 && height0 == 0.0 {
            self.max_zoom
        } else {
            let zoom_x = if width0 > 0.0 { (available.x / width0).log2() } else { f64::MAX };
            let zoom_y = if height0 > 0.0 { (available.y / height0).log2() } else { f64::MAX };
            zoom_x.min(zoom_y)
        };

        self.set_center(bounds.center());
        self.set_zoom(zoom);
        log::debug!("fit bounds -> center {:?} zoom {:.2}", self.center, self.zoom);
    }

    /// Integer zoom used to request tiles for the current zoom
    pub fn tile_zoom(&self) -> u8 {
        self.zoom.floor().clamp(0.0, MAX_ZOOM) as u8
    }

    /// Tiles covering the visible area at `tile_zoom()`
    pub fn visible_tiles(&self) -> Vec<TileCoord> {
        let z = self.tile_zoom();
        let bounds = self.bounds();
        let nw = TileCoord::from_lat_lng(
            &LatLng::new(bounds.north_east.lat.min(MAX_LATITUDE), bounds.south_west.lng.max(-180.0)),
            z,
        );
        let se = TileCoord::from_lat_lng(
            &LatLng::new(bounds.south_west.lat.max(-MAX_LATITUDE), bounds.north_east.lng.min(180.0)),
            z,
        );

        let mut tiles = Vec::new();
        for y in nw.y..=se.y {
            for x in nw.x..=se.x {
                tiles.push(TileCoord::new(x, y, z));
            }
        }
        tiles
    }

    /// Container pixel rectangle (min, max) that a tile covers at the current zoom
    pub fn tile_screen_bounds(&self, coord: &TileCoord) -> (Point, Point) {
        let nw = self.lat_lng_to_pixel(&coord.to_lat_lng());
        let se = self.lat_lng_to_pixel(&TileCoord::new(coord.x + 1, coord.y + 1, coord.z).to_lat_lng());
        (nw, se)
    }

    /// Gets the resolution in meters per pixel at the equator for the current zoom level
    pub fn resolution(&self) -> f64 {
        let earth_circumference = 2.0 * PI * EARTH_RADIUS;
        earth_circumference / (TILE_SIZE as f64 * self.scale())
    }

    fn clamp_center(center: LatLng) -> LatLng {
        LatLng::new(
            center.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            center.lng.clamp(-180.0, 180.0),
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0.0, Point::new(800.0, 600.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trail_viewport() -> Viewport {
        Viewport::new(LatLng::new(40.25, -76.13), 9.9, Point::new(800.0, 600.0))
    }

    #[test]
    fn test_viewport_creation() {
        let viewport = trail_viewport();

        assert_eq!(viewport.zoom, 9.9);
        assert_eq!(viewport.center.lat, 40.25);
        assert_eq!(viewport.size.x, 800.0);
    }

    #[test]
    fn test_center_maps_to_middle_of_container() {
        let viewport = trail_viewport();
        let pixel = viewport.lat_lng_to_pixel(&viewport.center);
        assert!((pixel.x - 400.0).abs() < 1e-6);
        assert!((pixel.y - 300.0).abs() < 1e-6);

        let back = viewport.pixel_to_lat_lng(&Point::new(400.0, 300.0));
        assert!((back.lat - 40.25).abs() < 1e-9);
        assert!((back.lng + 76.13).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_limits() {
        let mut viewport = Viewport::default();
        viewport.set_zoom_limits(2.0, 15.0);

        viewport.set_zoom(1.0);
        assert_eq!(viewport.zoom, 2.0);

        viewport.set_zoom(20.0);
        assert_eq!(viewport.zoom, 15.0);
    }

    #[test]
    fn test_pan_moves_center_against_drag() {
        let mut viewport = trail_viewport();
        let original_center = viewport.center;
        viewport.pan(Point::new(100.0, 0.0));

        // Dragging content to the right reveals terrain to the west
        assert!(viewport.center.lng < original_center.lng);
        assert!((viewport.center.lat - original_center.lat).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_keeps_focus_point_stationary() {
        let mut viewport = trail_viewport();
        let focus = Point::new(600.0, 150.0);
        let before = viewport.pixel_to_lat_lng(&focus);

        viewport.zoom_to(11.0, Some(focus));
        let after = viewport.lat_lng_to_pixel(&before);

        assert_eq!(viewport.zoom, 11.0);
        assert!((after.x - focus.x).abs() < 1e-6);
        assert!((after.y - focus.y).abs() < 1e-6);
    }

    #[test]
    fn test_fit_bounds_contains_bounds() {
        let mut viewport = trail_viewport();
        let bounds = LatLngBounds::from_coords(40.2, -76.2, 40.3, -76.1);
        viewport.fit_bounds(&bounds, Some(20.0));

        let visible = viewport.bounds();
        assert!(visible.contains(&bounds.south_west));
        assert!(visible.contains(&bounds.north_east));
    }

    #[test]
    fn test_visible_tiles_cover_center() {
        let viewport = trail_viewport();
        let tiles = viewport.visible_tiles();
        let center_tile = TileCoord::from_lat_lng(&viewport.center, viewport.tile_zoom());

        assert!(!tiles.is_empty());
        assert!(tiles.contains(&center_tile));
        assert!(tiles.iter().all(|t| t.z == 9));
    }
}
