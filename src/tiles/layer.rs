use crate::{
    core::{geo::TileCoord, viewport::Viewport},
    prelude::{HashMap, HashSet},
    rendering::context::RenderContext,
    tiles::{
        cache::TileCache,
        loader::{TileLoader, TileLoaderConfig},
        source::TileSource,
    },
    Result,
};
use std::time::{Duration, Instant};

/// How long a tile that failed to download is left alone before asking again
pub const FAILED_TILE_RETRY: Duration = Duration::from_secs(30);

/// Raster basemap: keeps the visible tiles requested, cached and drawn
pub struct TileLayer {
    source: Box<dyn TileSource>,
    cache: TileCache,
    loader: Option<TileLoader>,
    pending: HashSet<TileCoord>,
    failed: HashMap<TileCoord, Instant>,
    opacity: f32,
}

impl TileLayer {
    /// Creates a layer with a running download pool
    pub fn new(source: Box<dyn TileSource>, cache: TileCache) -> Self {
        Self::with_loader(source, cache, Some(TileLoader::new(TileLoaderConfig::default())))
    }

    /// A `None` loader draws only what is already cached
    pub fn with_loader(
        source: Box<dyn TileSource>,
        cache: TileCache,
        loader: Option<TileLoader>,
    ) -> Self {
        Self {
            source,
            cache,
            loader,
            pending: HashSet::default(),
            failed: HashMap::default(),
            opacity: 1.0,
        }
    }

    pub fn source(&self) -> &dyn TileSource {
        self.source.as_ref()
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Collects finished downloads and requests missing visible tiles.
    /// Returns true when new tiles arrived.
    pub fn update(&mut self, viewport: &Viewport) -> bool {
        let Some(loader) = &self.loader else {
            return false;
        };
        let now = Instant::now();

        let mut arrived = false;
        for result in loader.poll() {
            self.pending.remove(&result.coord);
            match result.data {
                Ok(data) => {
                    self.cache.insert(result.coord, data);
                    self.failed.remove(&result.coord);
                    arrived = true;
                }
                Err(_) => {
                    self.failed.insert(result.coord, now);
                }
            }
        }

        let visible = viewport.visible_tiles();
        let visible_set: HashSet<TileCoord> = visible.iter().copied().collect();
        self.pending.retain(|coord| {
            let keep = visible_set.contains(coord);
            if !keep {
                loader.cancel(coord);
            }
            keep
        });

        for coord in visible {
            if !self.needs_request(&coord, now) {
                continue;
            }
            match loader.request(coord, self.source.url(coord)) {
                Ok(()) => {
                    self.failed.remove(&coord);
                    self.pending.insert(coord);
                }
                Err(e) => log::warn!("tile {:?} not requested: {}", coord, e),
            }
        }

        arrived
    }

    fn needs_request(&self, coord: &TileCoord, now: Instant) -> bool {
        if coord.z > self.source.max_zoom()
            || self.cache.contains(coord)
            || self.pending.contains(coord)
        {
            return false;
        }
        match self.failed.get(coord) {
            Some(failed_at) => now.saturating_duration_since(*failed_at) >= FAILED_TILE_RETRY,
            None => true,
        }
    }

    /// Draws visible tiles, standing in the closest cached ancestor for missing ones
    pub fn render(&self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let mut drawn_ancestors: HashSet<TileCoord> = HashSet::default();
        let mut fallbacks = Vec::new();
        let mut exact = Vec::new();

        for coord in viewport.visible_tiles() {
            if let Some(data) = self.cache.get(&coord) {
                exact.push((coord, data));
            } else if let Some((ancestor, data)) = self.cached_ancestor(coord) {
                if drawn_ancestors.insert(ancestor) {
                    fallbacks.push((ancestor, data));
                }
            }
        }

        // Ancestors first so exact tiles cover them
        for (coord, data) in fallbacks.into_iter().chain(exact) {
            let bounds = viewport.tile_screen_bounds(&coord);
            context.render_tile(coord, data, bounds, self.opacity)?;
        }
        Ok(())
    }

    fn cached_ancestor(&self, coord: TileCoord) -> Option<(TileCoord, std::sync::Arc<Vec<u8>>)> {
        let mut current = coord;
        while current.z > 0 {
            current = TileCoord::new(current.x / 2, current.y / 2, current.z - 1);
            if let Some(data) = self.cache.get(&current) {
                return Some((current, data));
            }
        }
        None
    }
}
