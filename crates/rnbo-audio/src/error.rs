use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("jack error: {0}")]
    Jack(#[from] jack::Error),
    #[error("failed to create jack client: {0}")]
    ClientCreate(String),
    #[error("failed to register port: {0}")]
    PortRegister(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
