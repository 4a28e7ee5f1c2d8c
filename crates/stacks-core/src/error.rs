use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StacksError {
    #[error("stack not found: {0}")]
    StackNotFound(String),

    #[error("invalid stack name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidStackName(String),

    #[error("dependency cycle detected: {0}")]
    DependencyCycle(String),

    #[error("target path does not exist: {0}")]
    TargetNotFound(PathBuf),

    #[error("target path is not a directory: {0}")]
    TargetNotADirectory(PathBuf),

    #[error("{0} already exists (use --force to overwrite)")]
    AlreadyInstalled(PathBuf),

    #[error("nothing installed at {0}: no lockfile found")]
    NotInstalled(PathBuf),

    #[error("output directory is not empty: {0}")]
    OutputNotEmpty(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StacksError>;
