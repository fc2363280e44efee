mod batcher;
mod error;
mod extractor;
mod scanner;


pub use batcher::BatchStream;
pub use error::StreamError;
pub use extractor::{FeatureStream, DEFAULT_PREFIX};
