use crate::{core::geo::LatLngBounds, data::geojson::GeoJson};

/// Named GeoJSON dataset that style layers draw from
#[derive(Debug, Clone, PartialEq)]
pub struct GeoJsonSource {
    id: String,
    data: GeoJson,
}

impl GeoJsonSource {
    pub fn new(id: impl Into<String>, data: GeoJson) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &GeoJson {
        &self.data
    }

    /// Replaces the source's data in place
    pub fn set_data(&mut self, data: GeoJson) {
        self.data = data;
    }

    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.data.bounds()
    }
}
