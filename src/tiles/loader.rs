use crate::{core::geo::TileCoord, prelude::HashSet, MapError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

/// Tiles still wanted by the layer; a queued request whose tile is gone is skipped
type WantedTiles = Arc<Mutex<HashSet<TileCoord>>>;

/// Shared blocking HTTP client, built once for every worker.
pub(crate) static HTTP_CLIENT: Lazy<Option<Client>> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("trailmeter/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| log::error!("failed to build HTTP client: {}", e))
        .ok()
});

#[derive(Debug, Clone)]
pub struct TileLoaderConfig {
    /// Worker threads fetching in parallel
    pub workers: usize,
    /// Maximum number of attempts per tile
    pub max_attempts: usize,
    pub retry_delay: Duration,
}

impl Default for TileLoaderConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_attempts: 2,
            retry_delay: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone)]
struct TileRequest {
    coord: TileCoord,
    url: String,
}

/// Outcome of one tile download
#[derive(Debug)]
pub struct TileResult {
    pub coord: TileCoord,
    pub data: Result<Vec<u8>>,
}

/// Fixed pool of threads downloading tiles; results come back over a channel
/// that the UI thread drains with [`TileLoader::poll`].
pub struct TileLoader {
    request_tx: Sender<TileRequest>,
    result_rx: Receiver<TileResult>,
    wanted: WantedTiles,
}

impl TileLoader {
    pub fn new(config: TileLoaderConfig) -> Self {
        let (request_tx, request_rx) = unbounded::<TileRequest>();
        let (result_tx, result_rx) = unbounded();
        let wanted: WantedTiles = Arc::default();

        for worker in 0..config.workers.max(1) {
            let requests = request_rx.clone();
            let results = result_tx.clone();
            let config = config.clone();
            let wanted = wanted.clone();
            let spawned = thread::Builder::new()
                .name(format!("tile-worker-{}", worker))
                .spawn(move || {
                    // Ends once every sender is dropped
                    for request in requests.iter() {
                        if !claim(&wanted, &request.coord) {
                            log::debug!("skipping stale tile {:?}", request.coord);
                            continue;
                        }
                        let data = fetch_with_retry(&request, &config);
                        if results
                            .send(TileResult {
                                coord: request.coord,
                                data,
                            })
                            .is_err()
                        {
                            break;
                        }
                    }
                });
            if let Err(e) = spawned {
                log::error!("could not spawn tile worker {}: {}", worker, e);
            }
        }

        Self {
            request_tx,
            result_rx,
            wanted,
        }
    }

    /// Queues a download
    pub fn request(&self, coord: TileCoord, url: String) -> Result<()> {
        lock_wanted(&self.wanted).insert(coord);
        self.request_tx.send(TileRequest { coord, url }).map_err(|_| {
            lock_wanted(&self.wanted).remove(&coord);
            MapError::Layer("tile workers have shut down".to_string())
        })
    }

    /// Drops interest in a queued tile; workers skip it instead of fetching
    pub fn cancel(&self, coord: &TileCoord) {
        lock_wanted(&self.wanted).remove(coord);
    }

    /// Requested and not yet picked up by a worker
    pub fn is_wanted(&self, coord: &TileCoord) -> bool {
        lock_wanted(&self.wanted).contains(coord)
    }

    /// Drains finished downloads without blocking
    pub fn poll(&self) -> Vec<TileResult> {
        self.result_rx.try_iter().collect()
    }
}

impl Default for TileLoader {
    fn default() -> Self {
        Self::new(TileLoaderConfig::default())
    }
}

fn lock_wanted(wanted: &WantedTiles) -> MutexGuard<'_, HashSet<TileCoord>> {
    wanted.lock().unwrap_or_else(|poisoned| {
        log::warn!("tile request set lock was poisoned; recovering");
        poisoned.into_inner()
    })
}

/// Takes the tile off the wanted set; false when it was cancelled or already taken
fn claim(wanted: &WantedTiles, coord: &TileCoord) -> bool {
    lock_wanted(wanted).remove(coord)
}

fn fetch_with_retry(request: &TileRequest, config: &TileLoaderConfig) -> Result<Vec<u8>> {
    let attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        log::debug!("fetch tile {:?} attempt {}", request.coord, attempt);
        match fetch(&request.url) {
            Ok(data) => {
                log::debug!("downloaded tile {:?} ({} bytes)", request.coord, data.len());
                return Ok(data);
            }
            Err(e) if attempt < attempts => {
                log::warn!(
                    "tile {:?} download failed on attempt {}: {}",
                    request.coord,
                    attempt,
                    e
                );
                thread::sleep(config.retry_delay);
                attempt += 1;
            }
            Err(e) => {
                log::error!("giving up on tile {:?}: {}", request.coord, e);
                return Err(e);
            }
        }
    }
}

fn fetch(url: &str) -> Result<Vec<u8>> {
    let client = HTTP_CLIENT
        .as_ref()
        .ok_or_else(|| MapError::Config("HTTP client is unavailable".to_string()))?;
    let response = client.get(url).send()?.error_for_status()?;
    Ok(response.bytes()?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_tiles_are_not_claimed() {
        let wanted: WantedTiles = Arc::default();
        let coord = TileCoord::new(300, 380, 10);

        lock_wanted(&wanted).insert(coord);
        assert!(claim(&wanted, &coord));
        // a second queued request for the same tile is a duplicate
        assert!(!claim(&wanted, &coord));

        lock_wanted(&wanted).insert(coord);
        lock_wanted(&wanted).remove(&coord);
        assert!(!claim(&wanted, &coord));
    }
}
