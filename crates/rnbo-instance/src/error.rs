use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("preset not found: {0}")]
    PresetNotFound(String),
    #[error("dataref not found: {0}")]
    DatarefNotFound(String),
    #[error("dataref decode failed: {0}")]
    DatarefDecode(String),
    #[error("dataref file error: {0}")]
    DatarefFile(#[from] hound::Error),
    #[error("database error: {0}")]
    Db(#[from] rnbo_db::DbError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
