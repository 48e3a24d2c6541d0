use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatcherLoadError {
    #[error("failed to load library: {0}")]
    Load(#[from] libloading::Error),
    #[error("library is missing required export: {0}")]
    MissingSymbol(String),
    #[error("factory entry point returned a null handle")]
    NullFactory,
}
