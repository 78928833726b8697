pub mod cache;
pub mod layer;
pub mod loader;
pub mod source;

// Re-exports for convenience
pub use cache::TileCache;
pub use layer::TileLayer;
pub use loader::{TileLoader, TileLoaderConfig, TileResult};
pub use source::{source_for_style, MapboxStyleSource, TileSource, UrlTemplateSource};
