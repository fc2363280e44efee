use std::io::Read;

use crate::geojson::Feature;

use super::error::StreamError;
use super::extractor::FeatureStream;

/// Groups a feature stream into bounded, non-empty batches.
///
/// Pull-based cursor: each call to [`next_batch`](BatchStream::next_batch)
/// draws up to `batch_size` features from the underlying stream, in
/// document order. The final batch may be smaller; an exhausted stream
/// yields `None` rather than an empty batch.
pub struct BatchStream<R: Read> {
    features: FeatureStream<R>,
    batch_size: usize,
}

impl<R: Read> BatchStream<R> {
    /// `batch_size` must be at least 1; `SplitConfig::validate` enforces
    /// this before a stream is ever constructed.
    pub fn new(features: FeatureStream<R>, batch_size: usize) -> Self {
        debug_assert!(batch_size > 0);
        Self {
            features,
            batch_size,
        }
    }

    /// Pull the next batch, or `None` once the stream is exhausted.
    pub fn next_batch(&mut self) -> Result<Option<Vec<Feature>>, StreamError> {
        let mut batch = Vec::new();
        while batch.len() < self.batch_size {
            match self.features.next_feature()? {
                Some(feature) => batch.push(feature),
                None => break,
            }
        }
        if batch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(batch))
        }
    }
}
