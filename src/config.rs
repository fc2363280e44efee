use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default number of features per output file.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default width of the generated filename suffix.
pub const DEFAULT_SUFFIX_WIDTH: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("geometry count must be at least 1, got {0}")]
    InvalidBatchSize(usize),

    #[error("limit must be at least 1")]
    InvalidLimit,
}

/// Immutable parameters for one split run.
///
/// Built once at the boundary and range-checked by
/// [`validate`](SplitConfig::validate) before the pipeline starts.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Document to split.
    pub source: PathBuf,
    /// Maximum number of features per output file.
    pub batch_size: usize,
    /// Width of the alphabetic filename suffix.
    pub suffix_width: usize,
    /// Output directory override; `None` means the source's own directory.
    pub output_dir: Option<PathBuf>,
    /// Maximum number of output files; `None` means unlimited.
    pub limit: Option<u64>,
    /// Compute and report everything, write nothing.
    pub dry_run: bool,
}

impl SplitConfig {
    /// Configuration with defaults for everything but the source path.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            suffix_width: DEFAULT_SUFFIX_WIDTH,
            output_dir: None,
            limit: None,
            dry_run: false,
        }
    }

    /// Set the maximum number of features per output file.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the filename suffix width.
    pub fn suffix_width(mut self, suffix_width: usize) -> Self {
        self.suffix_width = suffix_width;
        self
    }

    /// Set the output directory.
    pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    /// Cap the number of output files.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Suppress filesystem writes.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Range-check the configuration before the pipeline starts. The
    /// batcher requires at least one feature per batch, so a zero batch
    /// size is rejected here rather than looping forever downstream.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }
        if self.limit == Some(0) {
            return Err(ConfigError::InvalidLimit);
        }
        Ok(())
    }

    /// Directory output files land in: the configured override, or else
    /// the source document's own directory.
    pub fn resolved_output_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => self
                .source
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }
}
