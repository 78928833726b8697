use crate::{
    core::{geo::Point, viewport::Viewport},
    layers::{
        base::{Layer, LayerHit},
        source::GeoJsonSource,
    },
    prelude::HashMap,
    rendering::context::RenderContext,
    MapError, Result,
};

/// Registry of sources and the layers drawn from them, kept in z-order
pub struct LayerManager {
    sources: HashMap<String, GeoJsonSource>,
    /// All layers indexed by ID
    layers: HashMap<String, Box<dyn Layer>>,
    /// Ordered list of layer IDs for rendering (sorted by z-index)
    render_order: Vec<String>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self {
            sources: HashMap::default(),
            layers: HashMap::default(),
            render_order: Vec::new(),
        }
    }

    /// Registers a source; IDs must be unique
    pub fn add_source(&mut self, source: GeoJsonSource) -> Result<()> {
        if self.sources.contains_key(source.id()) {
            return Err(MapError::Layer(format!(
                "There is already a source with ID \"{}\"",
                source.id()
            )));
        }
        self.sources.insert(source.id().to_string(), source);
        Ok(())
    }

    /// Removes a source that no layer still draws from
    pub fn remove_source(&mut self, source_id: &str) -> Result<GeoJsonSource> {
        if let Some(user) = self
            .layers
            .values()
            .find(|layer| layer.source_id() == Some(source_id))
        {
            return Err(MapError::Layer(format!(
                "Source \"{}\" cannot be removed while layer \"{}\" is using it",
                source_id,
                user.id()
            )));
        }
        self.sources
            .remove(source_id)
            .ok_or_else(|| MapError::Layer(format!("There is no source with ID \"{}\"", source_id)))
    }

    pub fn get_source(&self, source_id: &str) -> Option<&GeoJsonSource> {
        self.sources.get(source_id)
    }

    pub fn get_source_mut(&mut self, source_id: &str) -> Option<&mut GeoJsonSource> {
        self.sources.get_mut(source_id)
    }

    pub fn has_source(&self, source_id: &str) -> bool {
        self.sources.contains_key(source_id)
    }

    /// Adds a layer; its ID must be unique and its source must exist
    pub fn add_layer(&mut self, layer: Box<dyn Layer>) -> Result<()> {
        let layer_id = layer.id().to_string();
        if self.layers.contains_key(&layer_id) {
            return Err(MapError::Layer(format!(
                "Layer with id \"{}\" already exists on this map",
                layer_id
            )));
        }
        if let Some(source_id) = layer.source_id() {
            if !self.sources.contains_key(source_id) {
                return Err(MapError::Layer(format!(
                    "Source \"{}\" not found for layer \"{}\"",
                    source_id, layer_id
                )));
            }
        }

        let z_index = layer.z_index();
        self.layers.insert(layer_id.clone(), layer);

        // Insert in sorted order by z-index
        let insert_pos = self
            .render_order
            .iter()
            .position(|id| {
                self.layers
                    .get(id)
                    .map(|l| l.z_index() > z_index)
                    .unwrap_or(false)
            })
            .unwrap_or(self.render_order.len());

        self.render_order.insert(insert_pos, layer_id);
        Ok(())
    }

    pub fn remove_layer(&mut self, layer_id: &str) -> Result<Box<dyn Layer>> {
        let layer = self.layers.remove(layer_id).ok_or_else(|| {
            MapError::Layer(format!(
                "Cannot remove non-existing layer \"{}\"",
                layer_id
            ))
        })?;
        self.render_order.retain(|id| id != layer_id);
        Ok(layer)
    }

    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn Layer> {
        self.layers.get(layer_id).map(|l| l.as_ref())
    }

    /// Applies a function to a specific layer mutably
    pub fn with_layer_mut<F, R>(&mut self, layer_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn Layer) -> R,
    {
        self.layers.get_mut(layer_id).map(|layer| f(layer.as_mut()))
    }

    pub fn has_layer(&self, layer_id: &str) -> bool {
        self.layers.contains_key(layer_id)
    }

    /// Layer IDs in render order
    pub fn layer_ids(&self) -> Vec<String> {
        self.render_order.clone()
    }

    /// Gets all layers in render order
    pub fn layers(&self) -> Vec<&dyn Layer> {
        self.render_order
            .iter()
            .filter_map(|id| self.layers.get(id).map(|l| l.as_ref()))
            .collect()
    }

    /// Renders all visible layers bottom to top
    pub fn render(&self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        for layer in self.layers() {
            if !layer.is_visible() {
                continue;
            }
            let source = layer.source_id().and_then(|id| self.sources.get(id));
            layer.render(context, viewport, source)?;
        }
        Ok(())
    }

    /// Interactive layers under `pixel`, topmost first
    pub fn hit_test(&self, viewport: &Viewport, pixel: Point, tolerance: f64) -> Vec<LayerHit> {
        self.layers()
            .into_iter()
            .rev()
            .filter(|layer| layer.is_visible() && layer.is_interactive())
            .filter_map(|layer| {
                let source = layer.source_id().and_then(|id| self.sources.get(id));
                layer.hit_test(viewport, source, pixel, tolerance)
            })
            .collect()
    }

    /// Re-sorts the render order after z-index changes
    pub fn update_render_order(&mut self) {
        let layers = &self.layers;
        self.render_order.sort_by_key(|id| layers.get(id).map(|l| l.z_index()).unwrap_or(0));
    }

    /// Gets the number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::geo::LatLng,
        data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry},
        layers::{
            marker::Marker,
            style::{LinePaint, StyleLayer},
        },
    };

    fn source(id: &str) -> GeoJsonSource {
        let line = [LatLng::new(40.20, -76.20), LatLng::new(40.30, -76.10)];
        GeoJsonSource::new(
            id,
            GeoJson::single(GeoJsonFeature::new(GeoJsonGeometry::line_string(&line))),
        )
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut manager = LayerManager::new();
        manager.add_source(source("trail")).unwrap();
        assert!(matches!(
            manager.add_source(source("trail")),
            Err(MapError::Layer(_))
        ));

        manager
            .add_layer(Box::new(StyleLayer::line("trail", "trail", LinePaint::default())))
            .unwrap();
        assert!(manager
            .add_layer(Box::new(StyleLayer::line("trail", "trail", LinePaint::default())))
            .is_err());
    }

    #[test]
    fn test_layer_needs_existing_source() {
        let mut manager = LayerManager::new();
        let result =
            manager.add_layer(Box::new(StyleLayer::line("segment", "missing", LinePaint::default())));
        assert!(result.is_err());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_source_in_use_cannot_be_removed() {
        let mut manager = LayerManager::new();
        manager.add_source(source("trail")).unwrap();
        manager
            .add_layer(Box::new(StyleLayer::line("trail", "trail", LinePaint::default())))
            .unwrap();

        assert!(manager.remove_source("trail").is_err());
        manager.remove_layer("trail").unwrap();
        manager.remove_source("trail").unwrap();
        assert!(manager.remove_source("trail").is_err());
        assert!(manager.remove_layer("trail").is_err());
    }

    #[test]
    fn test_render_order_follows_z_index() {
        let mut manager = LayerManager::new();
        manager.add_source(source("trail")).unwrap();
        manager.add_source(source("segment")).unwrap();

        manager
            .add_layer(Box::new(Marker::new("start", LatLng::new(40.2, -76.2))))
            .unwrap();
        manager
            .add_layer(Box::new(
                StyleLayer::line("segment", "segment", LinePaint::default()).with_z_index(1),
            ))
            .unwrap();
        manager
            .add_layer(Box::new(StyleLayer::line("trail", "trail", LinePaint::default())))
            .unwrap();

        assert_eq!(manager.layer_ids(), vec!["trail", "segment", "start"]);
    }

    #[test]
    fn test_hit_test_returns_topmost_first() {
        let mut manager = LayerManager::new();
        manager.add_source(source("trail")).unwrap();
        manager.add_source(source("segment")).unwrap();
        manager
            .add_layer(Box::new(StyleLayer::line("trail", "trail", LinePaint::default())))
            .unwrap();
        manager
            .add_layer(Box::new(
                StyleLayer::line("segment", "segment", LinePaint::default()).with_z_index(1),
            ))
            .unwrap();

        let viewport = Viewport::new(LatLng::new(40.25, -76.15), 11.0, Point::new(800.0, 600.0));
        let pixel = viewport.lat_lng_to_pixel(&LatLng::new(40.25, -76.15));
        let hits = manager.hit_test(&viewport, pixel, 3.0);

        let ids: Vec<&str> = hits.iter().map(|h| h.layer_id.as_str()).collect();
        assert_eq!(ids, vec!["segment", "trail"]);
    }
}
