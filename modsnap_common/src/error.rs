use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModSnapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Deletion error: {0}")]
    Deletion(String),
}

pub type Result<T> = std::result::Result<T, ModSnapError>;
