//! Viewer configuration
//!
//! Everything the map needs at start-up lives here, including the tile
//! service access token, which is handed to `Map` explicitly rather than
//! stored in a global.

use crate::{
    core::{
        constants::{
            ACCESS_TOKEN_ENV, DEFAULT_CENTER_LAT, DEFAULT_CENTER_LNG, DEFAULT_STYLE_URL,
            DEFAULT_TILE_CACHE_CAPACITY, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM,
        },
        geo::LatLng,
    },
    layers::style::{LinePaint, SerializableColor},
    measure::Units,
    MapError, Result,
};
use serde::{Deserialize, Serialize};

/// Optional environment overrides
pub const STYLE_ENV: &str = "TRAILMETER_STYLE";
pub const CENTER_ENV: &str = "TRAILMETER_CENTER";
pub const ZOOM_ENV: &str = "TRAILMETER_ZOOM";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Token appended to tile requests
    pub access_token: String,
    /// `mapbox://styles/{owner}/{style}` URL
    pub style_url: String,
    pub center: LatLng,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Paint for the full trail line
    pub trail_paint: LinePaint,
    /// Paint for the measured segment
    pub segment_paint: LinePaint,
    /// Unit the measured length is reported in
    pub units: Units,
    /// Zoom to the trail extent once it is loaded
    pub fit_trail_on_load: bool,
    /// Fetch raster tiles in the background
    pub load_tiles: bool,
    pub tile_cache_capacity: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            style_url: DEFAULT_STYLE_URL.to_string(),
            center: LatLng::new(DEFAULT_CENTER_LAT, DEFAULT_CENTER_LNG),
            zoom: DEFAULT_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            trail_paint: LinePaint {
                color: SerializableColor::rgb(0x38, 0x87, 0xbe),
                width: 4.0,
                opacity: 1.0,
                dash_pattern: Vec::new(),
            },
            segment_paint: LinePaint {
                color: SerializableColor::rgb(0xe5, 0x5e, 0x5e),
                width: 4.0,
                opacity: 1.0,
                dash_pattern: vec![2.0, 1.5],
            },
            units: Units::Miles,
            fit_trail_on_load: false,
            load_tiles: true,
            tile_cache_capacity: DEFAULT_TILE_CACHE_CAPACITY,
        }
    }
}

impl ViewerConfig {
    /// Builds the configuration from the process environment.
    ///
    /// `MAPBOX_ACCESS_TOKEN` is required; style, center and zoom may be
    /// overridden through `TRAILMETER_STYLE`, `TRAILMETER_CENTER` (`lng,lat`)
    /// and `TRAILMETER_ZOOM`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ViewerConfig::from_env`] with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.access_token = lookup(ACCESS_TOKEN_ENV)
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| MapError::Config(format!("{} is not set", ACCESS_TOKEN_ENV)))?;

        if let Some(style) = lookup(STYLE_ENV) {
            config.style_url = style;
        }

        if let Some(center) = lookup(CENTER_ENV) {
            config.center = parse_center(&center)?;
        }

        if let Some(zoom) = lookup(ZOOM_ENV) {
            config.zoom = zoom
                .trim()
                .parse()
                .map_err(|_| MapError::Config(format!("{} must be a number, got {:?}", ZOOM_ENV, zoom)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON configuration; missing fields fall back to defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.center.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "initial center {:?} is out of range",
                self.center
            )));
        }
        if self.min_zoom > self.max_zoom {
            return Err(MapError::Config(format!(
                "min_zoom {} is greater than max_zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        self.trail_paint.validate("trail_paint")?;
        self.segment_paint.validate("segment_paint")?;
        Ok(())
    }
}

/// Parses a `lng,lat` pair
fn parse_center(value: &str) -> Result<LatLng> {
    let mut parts = value.split(',').map(str::trim);
    let (Some(lng), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(MapError::Config(format!(
            "{} must look like `lng,lat`, got {:?}",
            CENTER_ENV, value
        )));
    };

    let parse = |s: &str| {
        s.parse::<f64>()
            .map_err(|_| MapError::Config(format!("{} has a non-numeric part {:?}", CENTER_ENV, s)))
    };

    Ok(LatLng::new(parse(lat)?, parse(lng)?))
}
