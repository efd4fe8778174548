use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LocalIo,
    Validation,
    RemoteApi,
    Aborted,
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct CliError {
    pub kind: ErrorKind,
    pub message: String,
    pub exit_code: i32,
}

impl CliError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            exit_code: 1,
        }
    }

    pub fn local_io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LocalIo, message)
    }

    pub fn credentials_file(path: &Path) -> Self {
        Self::local_io(format!(
            "Couldn't access the credentials file at {}",
            path.display()
        ))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RemoteApi, message)
    }

    pub fn aborted() -> Self {
        Self::new(ErrorKind::Aborted, "Aborted!")
    }
}

pub type CliResult<T> = Result<T, CliError>;
