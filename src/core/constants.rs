//! Engine-wide defaults for the trail viewer.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Initial map center longitude (Horse-Shoe Trail, Pennsylvania).
pub const DEFAULT_CENTER_LNG: f64 = -76.13;

/// Initial map center latitude.
pub const DEFAULT_CENTER_LAT: f64 = 40.25;

/// Initial zoom level.
pub const DEFAULT_ZOOM: f64 = 9.9;

/// Style the viewer asks the tile service for.
pub const DEFAULT_STYLE_URL: &str = "mapbox://styles/mapbox/streets-v9";

/// Environment variable holding the tile service access token.
pub const ACCESS_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 22.0;

/// Programmatic +/- zoom step used by the navigation control.
pub const DEFAULT_ZOOM_DELTA: f64 = 1.0;

/// Extra pixels around a line's stroke that still count as a hit.
pub const DEFAULT_HIT_TOLERANCE_PX: f64 = 3.0;

/// Mean earth radius in meters used for great-circle lengths.
pub const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Default number of raw tiles kept in memory.
pub const DEFAULT_TILE_CACHE_CAPACITY: usize = 512;

/// Marker glyph radius in pixels.
pub const MARKER_RADIUS_PX: f32 = 6.0;
