use std::path::PathBuf;
use thiserror::Error;

/// Boxed underlying cause attached to backend failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for DocEnhancer operations
#[derive(Error, Debug)]
pub enum DocEnhancerError {
    #[error("Module not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Access denied: {}", .0.display())]
    AccessDenied(PathBuf),

    #[error("Parse error in {}: {diagnostic}", .path.display())]
    Parse { path: PathBuf, diagnostic: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Generation error: {message}")]
    Generation {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocEnhancerError {
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation { message: message.into(), source: None }
    }

    pub fn generation_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Generation { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Map an I/O failure on `path` onto the taxonomy
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::AccessDenied(path),
            _ => Self::Internal(format!("{}: {}", path.display(), err)),
        }
    }
}

pub type Result<T> = std::result::Result<T, DocEnhancerError>;
