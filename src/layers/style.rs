use crate::{
    core::{geo::Point, viewport::Viewport},
    layers::{
        base::{Layer, LayerHit, LayerProperties, LayerType},
        source::GeoJsonSource,
    },
    rendering::context::{RenderContext, StyleConversion},
    MapError, Result,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "egui")]
use egui::Color32;

/// Serializable color type that can convert to/from egui::Color32
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[cfg(feature = "egui")]
impl From<Color32> for SerializableColor {
    fn from(color: Color32) -> Self {
        Self {
            r: color.r(),
            g: color.g(),
            b: color.b(),
            a: color.a(),
        }
    }
}

#[cfg(feature = "egui")]
impl From<SerializableColor> for Color32 {
    fn from(color: SerializableColor) -> Self {
        Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
    }
}

impl SerializableColor {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses `#rrggbb` or `#rrggbbaa`
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || MapError::ParseError(format!("Invalid color: {}", hex));

        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());

        let a = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, a))
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Paint properties of a line layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinePaint {
    pub color: SerializableColor,
    /// Stroke width in pixels
    pub width: f32,
    /// Opacity (0.0 to 1.0)
    pub opacity: f32,
    /// Dash and gap lengths in line widths (empty for solid line)
    pub dash_pattern: Vec<f32>,
}

impl Default for LinePaint {
    fn default() -> Self {
        Self {
            color: SerializableColor::rgb(0, 0, 255),
            width: 2.0,
            opacity: 1.0,
            dash_pattern: Vec::new(),
        }
    }
}

impl LinePaint {
    pub fn is_dashed(&self) -> bool {
        is_valid_dash_pattern(&self.dash_pattern)
    }

    /// Width must be positive; a dash pattern, if present, must be usable
    pub fn validate(&self, name: &str) -> Result<()> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(MapError::Config(format!(
                "{} width must be a positive number, got {}",
                name, self.width
            )));
        }
        if !self.dash_pattern.is_empty() && !self.is_dashed() {
            return Err(MapError::Config(format!(
                "{} dash_pattern needs at least two positive lengths, got {:?}",
                name, self.dash_pattern
            )));
        }
        Ok(())
    }
}

/// At least a dash and a gap, all finite and positive
pub fn is_valid_dash_pattern(pattern: &[f32]) -> bool {
    pattern.len() >= 2 && pattern.iter().all(|d| d.is_finite() && *d > 0.0)
}

/// Line layer drawing every polyline of a GeoJSON source
pub struct StyleLayer {
    properties: LayerProperties,
    source: String,
    paint: LinePaint,
}

impl StyleLayer {
    pub fn line(id: impl Into<String>, source: impl Into<String>, paint: LinePaint) -> Self {
        Self {
            properties: LayerProperties::new(id, LayerType::Line),
            source: source.into(),
            paint,
        }
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.properties.z_index = z_index;
        self
    }

    pub fn paint(&self) -> &LinePaint {
        &self.paint
    }

    pub fn set_paint(&mut self, paint: LinePaint) {
        self.paint = paint;
    }

    fn screen_lines(&self, viewport: &Viewport, source: &GeoJsonSource) -> Vec<(usize, Vec<Point>)> {
        source
            .data()
            .features()
            .into_iter()
            .enumerate()
            .filter_map(|(index, feature)| feature.geometry.as_ref().map(|g| (index, g)))
            .flat_map(move |(index, geometry)| {
                geometry.lines().into_iter().map(move |line| {
                    let pixels = line.iter().map(|p| viewport.lat_lng_to_pixel(p)).collect();
                    (index, pixels)
                })
            })
            .collect()
    }
}

impl Layer for StyleLayer {
    fn properties(&self) -> &LayerProperties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut LayerProperties {
        &mut self.properties
    }

    fn source_id(&self) -> Option<&str> {
        Some(&self.source)
    }

    fn render(
        &self,
        context: &mut RenderContext,
        viewport: &Viewport,
        source: Option<&GeoJsonSource>,
    ) -> Result<()> {
        let source = source.ok_or_else(|| {
            MapError::Layer(format!(
                "source '{}' for layer '{}' is missing",
                self.source, self.properties.id
            ))
        })?;

        let style = self.paint.to_render_style(self.properties.opacity);
        for (_, pixels) in self.screen_lines(viewport, source) {
            context.render_line(&self.properties.id, &pixels, &style);
        }
        Ok(())
    }

    fn hit_test(
        &self,
        viewport: &Viewport,
        source: Option<&GeoJsonSource>,
        pixel: Point,
        tolerance: f64,
    ) -> Option<LayerHit> {
        let source = source?;
        let reach = self.paint.width as f64 / 2.0 + tolerance;
        let features = source.data().features();

        let mut best: Option<(usize, f64)> = None;
        for (index, pixels) in self.screen_lines(viewport, source) {
            let distance = pixels
                .windows(2)
                .map(|pair| pixel.distance_to_segment(&pair[0], &pair[1]))
                .fold(f64::INFINITY, f64::min);
            if distance <= reach && best.map_or(true, |(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }

        best.map(|(feature_index, distance_px)| LayerHit {
            layer_id: self.properties.id.clone(),
            feature_index,
            properties: features
                .get(feature_index)
                .and_then(|f| f.properties.clone()),
            distance_px,
        })
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
