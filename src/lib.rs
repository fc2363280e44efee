// Public API exports
pub mod config;
pub mod error;
pub mod geojson;
pub mod split;
pub mod stream;
pub mod suffix;

// Re-export main types for convenience
pub use config::{ConfigError, SplitConfig, DEFAULT_BATCH_SIZE, DEFAULT_SUFFIX_WIDTH};
pub use error::SplitError;
pub use geojson::{Feature, FeatureCollection};
pub use split::{SplitReport, Splitter};
pub use stream::{BatchStream, FeatureStream, StreamError, DEFAULT_PREFIX};
