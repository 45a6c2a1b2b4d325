use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Database command failed: {0}")]
    CommandError(String),

    #[error("Invalid segment name: '{0}'")]
    InvalidSegmentName(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

pub type Result<T> = std::result::Result<T, SweepError>;

impl SweepError {
    /// True for failures talking to the database. A cycle that hits one of
    /// these must stop before touching the filesystem.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::ConnectionError(_) | Self::CommandError(_))
    }
}

impl From<tokio_postgres::Error> for SweepError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            Self::ConnectionError(err.to_string())
        } else {
            Self::CommandError(err.to_string())
        }
    }
}
