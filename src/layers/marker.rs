use crate::{
    core::{
        constants::MARKER_RADIUS_PX,
        geo::{LatLng, Point},
        viewport::Viewport,
    },
    layers::{
        base::{Layer, LayerProperties, LayerType},
        source::GeoJsonSource,
        style::SerializableColor,
    },
    rendering::context::{PointRenderStyle, RenderContext},
    Result,
};

/// Markers always draw above line layers
pub const MARKER_Z_INDEX: i32 = 1000;

pub struct Marker {
    properties: LayerProperties,
    position: LatLng,
    color: SerializableColor,
    label: Option<String>,
}

impl Marker {
    pub fn new(id: impl Into<String>, position: LatLng) -> Self {
        let mut properties = LayerProperties::new(id, LayerType::Marker);
        properties.z_index = MARKER_Z_INDEX;
        properties.interactive = false;
        Self {
            properties,
            position,
            color: SerializableColor::rgb(0x31, 0x6a, 0xd4),
            label: None,
        }
    }

    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn set_position(&mut self, position: LatLng) {
        self.position = position;
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl Layer for Marker {
    fn properties(&self) -> &LayerProperties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut LayerProperties {
        &mut self.properties
    }

    fn render(
        &self,
        context: &mut RenderContext,
        viewport: &Viewport,
        _source: Option<&GeoJsonSource>,
    ) -> Result<()> {
        let pixel = viewport.lat_lng_to_pixel(&self.position);
        context.render_point(
            &pixel,
            &PointRenderStyle {
                fill_color: self.color,
                stroke_color: SerializableColor::WHITE,
                stroke_width: 2.0,
                radius: MARKER_RADIUS_PX,
                opacity: self.properties.opacity,
            },
        );

        if let Some(label) = &self.label {
            let offset = Point::new(0.0, -(MARKER_RADIUS_PX as f64) - 10.0);
            context.render_text(&pixel.add(&offset), label, SerializableColor::BLACK);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::context::DrawCommand;

    #[test]
    fn test_marker_renders_point_and_label() {
        let viewport = Viewport::new(LatLng::new(40.25, -76.15), 11.0, Point::new(800.0, 600.0));
        let marker = Marker::new("segment-start", LatLng::new(40.25, -76.15)).with_label("A");
        let mut context = RenderContext::new(800, 600).unwrap();

        marker.render(&mut context, &viewport, None).unwrap();

        let queue = context.get_drawing_queue();
        assert_eq!(queue.len(), 2);
        match &queue[0] {
            DrawCommand::Point { position, .. } => {
                assert!((position.x - 400.0).abs() < 1e-6);
                assert!((position.y - 300.0).abs() < 1e-6);
            }
            other => panic!("expected a point, got {:?}", other),
        }
        assert!(matches!(&queue[1], DrawCommand::Text { text, .. } if text == "A"));
        assert!(!marker.is_interactive());
        assert_eq!(marker.z_index(), MARKER_Z_INDEX);
    }
}
