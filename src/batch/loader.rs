use crate::batch::schema::{Batch, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFormat {
    Json,
    Yaml,
}

#[derive(Debug)]
pub enum BatchError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    Yaml {
        path: Option<PathBuf>,
        source: serde_norway::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
    UnknownFormat {
        path: PathBuf,
    },
}

impl BatchError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            BatchError::Json { path: None, source } => BatchError::Json {
                path: Some(path),
                source,
            },
            BatchError::Yaml { path: None, source } => BatchError::Yaml {
                path: Some(path),
                source,
            },
            BatchError::Validation { path: None, source } => BatchError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::Io { path, source } => {
                write!(f, "failed to read batch from {}: {}", path.display(), source)
            }
            BatchError::Json { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse batch JSON ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse batch JSON: {}", source),
            },
            BatchError::Yaml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse batch YAML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse batch YAML: {}", source),
            },
            BatchError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid batch ({}): {}", path.display(), source),
                None => write!(f, "invalid batch: {}", source),
            },
            BatchError::UnknownFormat { path } => {
                write!(
                    f,
                    "cannot infer batch format from {} (expected .json, .yaml, or .yml)",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::Io { source, .. } => Some(source),
            BatchError::Json { source, .. } => Some(source),
            BatchError::Yaml { source, .. } => Some(source),
            BatchError::Validation { source, .. } => Some(source),
            BatchError::UnknownFormat { .. } => None,
        }
    }
}

pub fn load_from_str(input: &str, format: BatchFormat) -> Result<Batch, BatchError> {
    let batch: Batch = match format {
        BatchFormat::Json => serde_json::from_str(input)
            .map_err(|source| BatchError::Json { path: None, source })?,
        BatchFormat::Yaml => serde_norway::from_str(input)
            .map_err(|source| BatchError::Yaml { path: None, source })?,
    };
    batch
        .validate()
        .map_err(|source| BatchError::Validation { path: None, source })?;
    Ok(batch)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Batch, BatchError> {
    let path = path.as_ref();
    let format = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => BatchFormat::Json,
        Some("yaml") | Some("yml") => BatchFormat::Yaml,
        _ => {
            return Err(BatchError::UnknownFormat {
                path: path.to_path_buf(),
            })
        }
    };
    let contents = fs::read_to_string(path).map_err(|source| BatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents, format).map_err(|error| error.with_path(path))
}
