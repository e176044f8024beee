use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Already exists: `{0}`")]
    AlreadyExists(String),
    #[error("Not found: `{0}`")]
    NotFound(String),
    #[error("Transient failure: {0}")]
    Transient(#[source] anyhow::Error),
    #[error("{0}")]
    Fatal(#[from] anyhow::Error),
    #[error("Cancelled")]
    Cancelled,
    #[error("Gave up waiting for {what} after {elapsed:?}")]
    DeadlineExceeded { what: String, elapsed: Duration },
    #[error("Gave up waiting for {what} after {attempts} attempts")]
    Exhausted { what: String, attempts: usize },
    #[error("Invalid config: {0}")]
    Config(String),
}

impl Error {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub fn fatal<T: std::fmt::Display>(message: T) -> Self {
        Self::Fatal(anyhow::anyhow!("{message}"))
    }
}
