use crate::{
    core::geo::{Point, TileCoord},
    layers::style::{is_valid_dash_pattern, LinePaint, SerializableColor},
    MapError, Result,
};
use std::sync::Arc;

/// Converts a layer's paint into the style a draw command carries
pub trait StyleConversion<T> {
    fn to_render_style(&self, opacity_multiplier: f32) -> T;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointRenderStyle {
    pub fill_color: SerializableColor,
    pub stroke_color: SerializableColor,
    pub stroke_width: f32,
    pub radius: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineRenderStyle {
    pub color: SerializableColor,
    pub width: f32,
    pub opacity: f32,
    /// Dash and gap lengths in multiples of the line width, empty when solid
    pub dash_pattern: Vec<f32>,
}

impl LineRenderStyle {
    /// Dashing with a zero length never terminates, so such patterns draw solid
    pub fn is_dashed(&self) -> bool {
        self.width.is_finite() && self.width > 0.0 && is_valid_dash_pattern(&self.dash_pattern)
    }
}

impl StyleConversion<LineRenderStyle> for LinePaint {
    fn to_render_style(&self, opacity_multiplier: f32) -> LineRenderStyle {
        LineRenderStyle {
            color: self.color,
            width: self.width,
            opacity: self.opacity * opacity_multiplier,
            dash_pattern: if self.is_dashed() {
                self.dash_pattern.clone()
            } else {
                Vec::new()
            },
        }
    }
}

/// Render-ready drawing primitive
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Point {
        position: Point,
        style: PointRenderStyle,
    },
    Line {
        /// Layer that issued the command
        layer_id: String,
        points: Vec<Point>,
        style: LineRenderStyle,
    },
    Text {
        position: Point,
        text: String,
        color: SerializableColor,
    },
    Tile {
        coord: TileCoord,
        data: Arc<Vec<u8>>,
        bounds: (Point, Point), // min, max screen coordinates
        opacity: f32,
    },
}

/// Collects the draw commands for one frame
pub struct RenderContext {
    pub width: u32,
    pub height: u32,
    pub drawing_queue: Vec<DrawCommand>,
    /// Screen rectangle outside which tiles are culled
    pub clip_bounds: Option<(Point, Point)>,
}

impl RenderContext {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MapError::Config(format!(
                "render target must not be empty ({}x{})",
                width, height
            )));
        }
        Ok(Self {
            width,
            height,
            drawing_queue: Vec::new(),
            clip_bounds: Some((
                Point::new(0.0, 0.0),
                Point::new(width as f64, height as f64),
            )),
        })
    }

    /// Begin a frame
    pub fn begin_frame(&mut self) {
        self.drawing_queue.clear();
    }

    pub fn render_point(&mut self, position: &Point, style: &PointRenderStyle) {
        self.drawing_queue.push(DrawCommand::Point {
            position: *position,
            style: style.clone(),
        });
    }

    pub fn render_line(&mut self, layer_id: &str, points: &[Point], style: &LineRenderStyle) {
        if points.len() < 2 {
            return;
        }
        self.drawing_queue.push(DrawCommand::Line {
            layer_id: layer_id.to_string(),
            points: points.to_vec(),
            style: style.clone(),
        });
    }

    pub fn render_text(&mut self, position: &Point, text: &str, color: SerializableColor) {
        self.drawing_queue.push(DrawCommand::Text {
            position: *position,
            text: text.to_string(),
            color,
        });
    }

    /// Queues a raw tile image; tiles entirely outside the clip rectangle are dropped
    pub fn render_tile(
        &mut self,
        coord: TileCoord,
        data: Arc<Vec<u8>>,
        bounds: (Point, Point),
        opacity: f32,
    ) -> Result<()> {
        if bounds.0.x >= bounds.1.x || bounds.0.y >= bounds.1.y {
            return Err(MapError::Layer(format!("invalid bounds for tile {:?}", coord)));
        }

        if let Some((clip_min, clip_max)) = self.clip_bounds {
            let (tile_min, tile_max) = bounds;
            if tile_max.x < clip_min.x
                || tile_min.x > clip_max.x
                || tile_max.y < clip_min.y
                || tile_min.y > clip_max.y
            {
                return Ok(());
            }
        }

        self.drawing_queue.push(DrawCommand::Tile {
            coord,
            data,
            bounds,
            opacity: opacity.clamp(0.0, 1.0),
        });
        Ok(())
    }

    pub fn set_clip_bounds(&mut self, min: Point, max: Point) {
        self.clip_bounds = Some((min, max));
    }

    pub fn clear_clip_bounds(&mut self) {
        self.clip_bounds = None;
    }

    pub fn get_drawing_queue(&self) -> &[DrawCommand] {
        &self.drawing_queue
    }

    /// IDs of the layers that drew lines this frame, in draw order
    pub fn line_layer_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for command in &self.drawing_queue {
            if let DrawCommand::Line { layer_id, .. } = command {
                if ids.last() != Some(&layer_id.as_str()) {
                    ids.push(layer_id);
                }
            }
        }
        ids
    }

    pub fn clear_queue(&mut self) {
        self.drawing_queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_target_is_rejected() {
        assert!(RenderContext::new(0, 600).is_err());
    }

    #[test]
    fn test_line_layer_ids() {
        let mut context = RenderContext::new(800, 600).unwrap();
        let style = LinePaint::default().to_render_style(1.0);
        let points = [Point::new(0.0, 0.0), Point::new(10.0, 10.0)];

        context.render_line("trail", &points, &style);
        context.render_line("trail", &points, &style);
        context.render_line("trail-segment", &points, &style);
        // single points never make a line
        context.render_line("ignored", &points[..1], &style);

        assert_eq!(context.line_layer_ids(), vec!["trail", "trail-segment"]);
    }

    #[test]
    fn test_zero_length_dashes_render_solid() {
        let paint = LinePaint {
            dash_pattern: vec![0.0, 0.0],
            ..LinePaint::default()
        };
        let style = paint.to_render_style(1.0);
        assert!(!style.is_dashed());
        assert!(style.dash_pattern.is_empty());

        let hand_built = LineRenderStyle {
            dash_pattern: vec![2.0, f32::NAN],
            ..style.clone()
        };
        assert!(!hand_built.is_dashed());

        let zero_width = LineRenderStyle {
            width: 0.0,
            dash_pattern: vec![2.0, 1.5],
            ..style
        };
        assert!(!zero_width.is_dashed());
    }

    #[test]
    fn test_offscreen_tiles_are_culled() {
        let mut context = RenderContext::new(256, 256).unwrap();
        let data = Arc::new(vec![0u8; 4]);

        context
            .render_tile(
                TileCoord::new(0, 0, 1),
                data.clone(),
                (Point::new(300.0, 0.0), Point::new(556.0, 256.0)),
                1.0,
            )
            .unwrap();
        assert!(context.get_drawing_queue().is_empty());

        context
            .render_tile(
                TileCoord::new(0, 0, 1),
                data,
                (Point::new(-128.0, -128.0), Point::new(128.0, 128.0)),
                1.0,
            )
            .unwrap();
        assert_eq!(context.get_drawing_queue().len(), 1);
    }
}
