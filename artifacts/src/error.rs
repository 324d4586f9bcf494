use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

/// The result type used in the entire artifacts crate.
pub type Result<T> = std::result::Result<T, StoreErr>;

/// Failures while reading or publishing artifacts.
#[derive(Debug)]
pub enum StoreErr {
    Io { path: PathBuf, source: io::Error },
    Serde { path: PathBuf, source: serde_json::Error },
    /// Nothing has been published yet.
    NoCurrentVersion,
    /// The requested version does not exist or is not a valid id.
    UnknownVersion(String),
    /// An artifact name that is not a plain file stem.
    InvalidName(String),
}

impl StoreErr {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    pub(crate) fn serde(path: impl Into<PathBuf>) -> impl FnOnce(serde_json::Error) -> Self {
        let path = path.into();
        move |source| Self::Serde { path, source }
    }
}

impl Display for StoreErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreErr::Io { path, source } => write!(f, "io error on {}: {source}", path.display()),
            StoreErr::Serde { path, source } => {
                write!(f, "malformed artifact {}: {source}", path.display())
            }
            StoreErr::NoCurrentVersion => f.write_str("no model version has been published yet"),
            StoreErr::UnknownVersion(id) => write!(f, "unknown model version '{id}'"),
            StoreErr::InvalidName(name) => write!(f, "invalid artifact name '{name}'"),
        }
    }
}

impl Error for StoreErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreErr::Io { source, .. } => Some(source),
            StoreErr::Serde { source, .. } => Some(source),
            _ => None,
        }
    }
}
