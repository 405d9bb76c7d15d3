//! World dataset loading
//!
//! A [`DatasetSource`] produces the raw payload; [`DataLoader`] fetches it
//! once on a worker thread and hands the decoded [`WorldDataset`] to the frame
//! loop, which polls for it. Any failure (fetch error, malformed payload,
//! worker gone) is replaced by [`WorldDataset::fallback`] and logged; the
//! loader never retries.
//!
//! # Example
//!
//! ```rust,ignore
//! use globeview::loader::{DataLoader, HttpSource};
//!
//! let mut loader = DataLoader::new("countries");
//! loader.start(HttpSource::new(DEFAULT_DATASET_URL));
//! // ... once per frame:
//! if let Some(dataset) = loader.poll() {
//!     println!("{} features", dataset.len());
//! }
//! ```

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::{debug, warn};

use crate::geo::WorldDataset;
use crate::{GlobeError, Result};

pub const DEFAULT_DATASET_URL: &str = "https://cdn.jsdelivr.net/npm/world-atlas@2/countries-110m.json";

/// TopoJSON object holding the country features
pub const DEFAULT_OBJECT: &str = "countries";

/// Where the dataset payload comes from
pub trait DatasetSource: Send + 'static {
    /// Blocking fetch of the raw payload text
    fn fetch(&self) -> Result<String>;

    /// Human-readable origin for log messages
    fn describe(&self) -> String;
}

/// GET request to a fixed URL
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
}

#[cfg(feature = "http")]
impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[cfg(feature = "http")]
impl DatasetSource for HttpSource {
    fn fetch(&self) -> Result<String> {
        let mut response = ureq::get(&self.url)
            .call()
            .map_err(|e| GlobeError::FetchError(format!("HTTP error: {}", e)))?;
        response
            .body_mut()
            .read_to_string()
            .map_err(|e| GlobeError::FetchError(format!("Read error: {}", e)))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Payload read from a local file
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for FileSource {
    fn fetch(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| {
            GlobeError::FetchError(format!("Failed to read {}: {}", self.path.display(), e))
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Payload held in memory, or a canned failure
#[derive(Debug, Clone)]
pub struct StaticSource {
    payload: std::result::Result<String, String>,
}

impl StaticSource {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: Ok(payload.into()),
        }
    }

    /// A source whose fetch always fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            payload: Err(message.into()),
        }
    }
}

impl DatasetSource for StaticSource {
    fn fetch(&self) -> Result<String> {
        self.payload.clone().map_err(GlobeError::FetchError)
    }

    fn describe(&self) -> String {
        "static payload".to_string()
    }
}

/// Fetch and decode, without the fallback
pub fn fetch_dataset(source: &dyn DatasetSource, object: &str) -> Result<WorldDataset> {
    let payload = source.fetch()?;
    WorldDataset::decode(&payload, object)
}

/// Fetch and decode, substituting the fallback on any failure
pub fn load_blocking(source: &dyn DatasetSource, object: &str) -> WorldDataset {
    match fetch_dataset(source, object) {
        Ok(dataset) => {
            debug!(source = %source.describe(), features = dataset.len(), "Dataset loaded");
            dataset
        }
        Err(e) => {
            warn!(source = %source.describe(), error = %e, "Dataset load failed, using fallback");
            WorldDataset::fallback()
        }
    }
}

enum LoadState {
    Idle,
    Loading(Receiver<Result<WorldDataset>>),
    Loaded,
}

/// One-shot asynchronous dataset loader
pub struct DataLoader {
    object: String,
    state: LoadState,
}

impl DataLoader {
    pub fn new(object: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            state: LoadState::Idle,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading(_))
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LoadState::Loaded)
    }

    /// Spawn the fetch; only the first call per loader does anything
    pub fn start<S: DatasetSource>(&mut self, source: S) {
        if !matches!(self.state, LoadState::Idle) {
            return;
        }

        let (tx, rx) = mpsc::channel();
        let object = self.object.clone();
        debug!(source = %source.describe(), "Starting dataset fetch");

        thread::spawn(move || {
            let result = fetch_dataset(&source, &object);
            if tx.send(result).is_err() {
                debug!(
                    source = %source.describe(),
                    "Loader gone, discarding late dataset response"
                );
            }
        });

        self.state = LoadState::Loading(rx);
    }

    /// Check for a finished fetch without blocking
    ///
    /// Yields the dataset exactly once: the decoded payload, or the fallback
    /// if anything went wrong.
    pub fn poll(&mut self) -> Option<WorldDataset> {
        let LoadState::Loading(rx) = &self.state else {
            return None;
        };
        let dataset = match rx.try_recv() {
            Ok(result) => self.settle(result),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => self.settle(Err(GlobeError::FetchError(
                "Loader worker exited without a result".to_string(),
            ))),
        };
        self.state = LoadState::Loaded;
        Some(dataset)
    }

    /// Block until the fetch finishes
    pub fn wait(&mut self) -> Option<WorldDataset> {
        let LoadState::Loading(rx) = &self.state else {
            return None;
        };
        let result = rx.recv().unwrap_or_else(|_| {
            Err(GlobeError::FetchError(
                "Loader worker exited without a result".to_string(),
            ))
        });
        let dataset = self.settle(result);
        self.state = LoadState::Loaded;
        Some(dataset)
    }

    /// Stop listening; a response arriving later is dropped by the worker
    pub fn cancel(&mut self) {
        if self.is_loading() {
            debug!("Dataset fetch abandoned");
        }
        self.state = LoadState::Idle;
    }

    fn settle(&self, result: Result<WorldDataset>) -> WorldDataset {
        match result {
            Ok(dataset) => {
                debug!(features = dataset.len(), "Dataset loaded");
                dataset
            }
            Err(e) => {
                warn!(error = %e, "Dataset load failed, using fallback");
                WorldDataset::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ONE_SQUARE: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"name": "Square"},
            "geometry": {"type": "Polygon", "coordinates": [[[0,0],[0,10],[10,10],[10,0],[0,0]]]}
        }]
    }"#;

    #[test]
    fn test_static_source_loads() {
        let dataset = load_blocking(&StaticSource::new(ONE_SQUARE), DEFAULT_OBJECT);
        assert_eq!(dataset.len(), 1);
        assert!(!dataset.is_fallback());
    }

    #[test]
    fn test_failed_fetch_gives_fallback() {
        let dataset = load_blocking(&StaticSource::failing("connection refused"), DEFAULT_OBJECT);
        assert!(dataset.is_fallback());
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_malformed_payload_gives_fallback() {
        let dataset = load_blocking(&StaticSource::new("<!doctype html>"), DEFAULT_OBJECT);
        assert!(dataset.is_fallback());
    }

    #[test]
    fn test_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ONE_SQUARE.as_bytes()).unwrap();
        let source = FileSource::new(file.path());
        let dataset = fetch_dataset(&source, DEFAULT_OBJECT).unwrap();
        assert_eq!(dataset.features()[0].property_str("name"), Some("Square"));

        let missing = FileSource::new(file.path().with_extension("missing"));
        assert!(matches!(
            fetch_dataset(&missing, DEFAULT_OBJECT),
            Err(GlobeError::FetchError(_))
        ));
    }

    #[test]
    fn test_async_load_yields_once() {
        let mut loader = DataLoader::new(DEFAULT_OBJECT);
        loader.start(StaticSource::new(ONE_SQUARE));
        assert!(loader.is_loading());
        let dataset = loader.wait().unwrap();
        assert_eq!(dataset.len(), 1);
        assert!(loader.is_loaded());
        assert!(loader.poll().is_none());
        assert!(loader.wait().is_none());
    }

    #[test]
    fn test_async_failure_yields_fallback() {
        let mut loader = DataLoader::new(DEFAULT_OBJECT);
        loader.start(StaticSource::failing("offline"));
        let dataset = loop {
            if let Some(dataset) = loader.poll() {
                break dataset;
            }
            std::thread::yield_now();
        };
        assert!(dataset.is_fallback());
    }

    #[test]
    fn test_start_only_once() {
        let mut loader = DataLoader::new(DEFAULT_OBJECT);
        loader.start(StaticSource::new(ONE_SQUARE));
        loader.wait();
        loader.start(StaticSource::failing("second fetch"));
        assert!(loader.is_loaded());
    }

    #[test]
    fn test_cancel_discards_response() {
        let mut loader = DataLoader::new(DEFAULT_OBJECT);
        loader.start(StaticSource::new(ONE_SQUARE));
        loader.cancel();
        assert!(!loader.is_loading());
        assert!(loader.poll().is_none());
    }
}
