use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("file {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read source document: {0}")]
    Io(#[from] io::Error),

    #[error("malformed JSON at byte {offset}: {message}")]
    Syntax { offset: u64, message: String },

    #[error("invalid JSON value at byte {offset}: {source}")]
    Parse {
        offset: u64,
        source: serde_json::Error,
    },
}
