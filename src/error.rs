use thiserror::Error;

use crate::config::ConfigError;
use crate::stream::StreamError;
use crate::suffix::SuffixExhausted;

/// Fatal conditions that stop a split run.
///
/// Per-file write failures are not represented here: those are logged and
/// counted in the report while the run continues.
#[derive(Error, Debug)]
pub enum SplitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Suffix(#[from] SuffixExhausted),
}
