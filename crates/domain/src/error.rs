use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Malformed directory entry: {0}")]
    MalformedEntry(String),
    #[error("Duplicate credential for principal `{0}`")]
    DuplicatePrincipal(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;

/// A search ran past its deadline before finding a match.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[error("Time limit exceeded")]
pub struct TimeLimitExceeded;
