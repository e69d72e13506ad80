// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid queue thread spec: {0}")]
    InvalidSpec(String),

    #[error("Missing queue thread spec: {0}")]
    MissingSpec(&'static str),
}

pub type Result<T> = std::result::Result<T, DomainError>;
