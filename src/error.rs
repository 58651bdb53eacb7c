use chrono::NaiveDate;

/// Failures while turning a source into a normalized table.
///
/// Bad rows are never reported here; they are counted in
/// [`crate::loader::LoadReport`] instead.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Source is not readable as tabular data: {0}")]
    Unreadable(String),

    #[error("Required column not found: {0}")]
    MissingColumn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<calamine::Error> for LoadError {
    fn from(e: calamine::Error) -> Self {
        match e {
            calamine::Error::Io(io) => LoadError::Io(io),
            other => LoadError::Unreadable(other.to_string()),
        }
    }
}

impl From<csv::Error> for LoadError {
    fn from(e: csv::Error) -> Self {
        if e.is_io_error() {
            match e.into_kind() {
                csv::ErrorKind::Io(io) => LoadError::Io(io),
                other => LoadError::Unreadable(format!("{:?}", other)),
            }
        } else {
            LoadError::Unreadable(e.to_string())
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid date range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
