#![forbid(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("config file not found: {0}")]
    InvalidPath(PathBuf),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}
