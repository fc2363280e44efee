use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::warn;

use crate::geojson::Feature;

use super::error::StreamError;
use super::scanner::JsonScanner;

/// Default extraction prefix: the elements of the top-level `features`
/// array of a FeatureCollection document.
pub const DEFAULT_PREFIX: &str = "features.item";

/// Streaming extractor for the elements of one array inside a JSON
/// document.
///
/// The document is scanned incrementally: members that are not on the path
/// to the target array are skipped without being retained, and each call to
/// [`next_feature`](FeatureStream::next_feature) materializes exactly one
/// array element. Memory use is bounded by the largest single feature, not
/// by the document.
///
/// The stream is single-pass; restarting requires reopening the source.
#[derive(Debug)]
pub struct FeatureStream<R: Read> {
    scanner: JsonScanner<BufReader<R>>,
    /// Object keys leading to the target array, e.g. `["features"]`.
    keys: Vec<String>,
    /// Original prefix, kept for diagnostics.
    prefix: String,
    state: State,
}

#[derive(Debug)]
enum State {
    /// Not yet descended to the target array.
    Start,
    /// Inside the target array; `first` until one element has been read.
    Items { first: bool },
    /// Array finished, shape mismatch, or document exhausted.
    Finished,
}

impl FeatureStream<File> {
    /// Open a GeoJSON document for streaming with the default prefix.
    ///
    /// Fails with [`StreamError::NotFound`] before any read if `path` does
    /// not reference an existing file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        Self::open_with_prefix(path, DEFAULT_PREFIX)
    }

    /// Open a document and extract the elements under a dotted prefix such
    /// as `"features.item"`: leading segments name object keys to descend
    /// through, and a trailing `item` segment denotes the elements of the
    /// array found there.
    pub fn open_with_prefix(path: impl AsRef<Path>, prefix: &str) -> Result<Self, StreamError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StreamError::NotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        Ok(Self::from_reader_with_prefix(file, prefix))
    }
}

impl<R: Read> FeatureStream<R> {
    /// Stream from an arbitrary reader with the default prefix.
    pub fn from_reader(input: R) -> Self {
        Self::from_reader_with_prefix(input, DEFAULT_PREFIX)
    }

    /// Stream from an arbitrary reader with a custom prefix.
    pub fn from_reader_with_prefix(input: R, prefix: &str) -> Self {
        Self {
            scanner: JsonScanner::new(BufReader::new(input)),
            keys: parse_prefix(prefix),
            prefix: prefix.to_string(),
            state: State::Start,
        }
    }

    /// Pull the next feature, or `None` once the target array is
    /// exhausted.
    ///
    /// A document that never contains the target array yields no features
    /// at all; that is not treated as an error, but a single warning is
    /// logged. Malformed JSON encountered while scanning is an error.
    pub fn next_feature(&mut self) -> Result<Option<Feature>, StreamError> {
        loop {
            match self.state {
                State::Finished => return Ok(None),
                State::Start => {
                    if self.descend()? {
                        self.state = State::Items { first: true };
                    } else {
                        warn!(
                            "no `{}` array found in document, nothing to extract",
                            self.prefix
                        );
                        self.state = State::Finished;
                        return Ok(None);
                    }
                }
                State::Items { first } => {
                    if self.scanner.consume_if(b']')? {
                        self.state = State::Finished;
                        return Ok(None);
                    }
                    if !first {
                        self.scanner.expect(b',')?;
                    }
                    let start = self.scanner.offset();
                    let raw = self.scanner.capture_value()?;
                    let feature = serde_json::from_slice(&raw).map_err(|source| {
                        StreamError::Parse {
                            offset: start,
                            source,
                        }
                    })?;
                    self.state = State::Items { first: false };
                    return Ok(Some(feature));
                }
            }
        }
    }

    /// Walk object members down to the target array, leaving the scanner
    /// just past its opening bracket. Returns `false` on any shape
    /// mismatch: root is not an object, a key on the path is missing, or
    /// the value at the path is not an array.
    fn descend(&mut self) -> Result<bool, StreamError> {
        for depth in 0..self.keys.len() {
            if self.scanner.peek_token()? != Some(b'{') {
                return Ok(false);
            }
            self.scanner.expect(b'{')?;
            if !self.seek_key(depth)? {
                return Ok(false);
            }
        }
        if self.scanner.peek_token()? != Some(b'[') {
            return Ok(false);
        }
        self.scanner.expect(b'[')?;
        Ok(true)
    }

    /// Scan members of the current object until the wanted key, skipping
    /// every other member's value. Leaves the scanner positioned on the
    /// matching member's value.
    fn seek_key(&mut self, depth: usize) -> Result<bool, StreamError> {
        if self.scanner.consume_if(b'}')? {
            return Ok(false);
        }
        loop {
            let key = self.scanner.read_string()?;
            self.scanner.expect(b':')?;
            if key == self.keys[depth] {
                return Ok(true);
            }
            self.scanner.skip_value()?;
            if self.scanner.consume_if(b',')? {
                continue;
            }
            self.scanner.expect(b'}')?;
            return Ok(false);
        }
    }
}

/// Split a dotted prefix into the object keys leading to the target array.
/// A trailing `item` segment marks the array elements themselves and is
/// dropped; a bare `item` prefix addresses a document whose root is the
/// array.
fn parse_prefix(prefix: &str) -> Vec<String> {
    let mut keys: Vec<String> = prefix
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();
    if keys.last().map(String::as_str) == Some("item") {
        keys.pop();
    }
    keys
}
