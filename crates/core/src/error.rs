use thiserror::Error;

use crate::config::ConfigError;
use crate::content::ContentError;
use crate::scroll::PositionError;

/// Any failure while loading stage inputs.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("content: {0}")]
    Content(#[from] ContentError),
    #[error("position: {0}")]
    Position(#[from] PositionError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
