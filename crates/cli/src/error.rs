use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Malformed trace line {line}: {content:?}")]
    MalformedTrace { line: usize, content: String },

    #[error("Failed to read trace: {0}")]
    TraceRead(#[source] io::Error),

    #[error("Failed to write output: {0}")]
    Output(#[source] io::Error),
}
