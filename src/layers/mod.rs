pub mod base;
pub mod manager;
pub mod marker;
pub mod source;
pub mod style;

pub use base::{Layer, LayerHit, LayerProperties, LayerType};
pub use manager::LayerManager;
pub use marker::Marker;
pub use source::GeoJsonSource;
pub use style::{LinePaint, SerializableColor, StyleLayer};
