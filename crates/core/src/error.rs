use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan root not found: {0}")]
    RootNotFound(PathBuf),
    #[error("scan root is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("failed to list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] globset::Error),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not valid UTF-8")]
    Decode(PathBuf),
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("unknown merge tool: {0}")]
    UnknownTool(String),
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status} on scenario {scenario}")]
    Failed {
        tool: String,
        scenario: String,
        status: std::process::ExitStatus,
    },
    #[error("failed to create output directory {path}: {source}")]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("flatten_from must be a relative path of plain folder names: {0:?}")]
    InvalidFlatten(String),
    #[error("failed to relocate output in {path}: {source}")]
    Relocate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
