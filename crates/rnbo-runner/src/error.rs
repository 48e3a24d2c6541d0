//! Maps every command-handler error category onto the wire's `{code,message}`
//! pair. Unexpected failures fall back to the dispatcher's catch-all code.

use rnbo_proto::error::{
    CompileLoadError, FileCommandError, InstallProgramError, ListenerError, PackageCommandError, DISPATCH_CATCH_ALL_CODE,
};

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Compile(#[from] CompileLoadError),
    #[error(transparent)]
    File(#[from] FileCommandError),
    #[error(transparent)]
    Package(#[from] PackageCommandError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error(transparent)]
    Install(#[from] InstallProgramError),
    #[error("{0}")]
    Other(String),
}

impl CommandError {
    pub fn code(&self) -> i64 {
        match self {
            CommandError::Compile(e) => e.code(),
            CommandError::File(e) => e.code(),
            CommandError::Package(e) => e.code(),
            CommandError::Listener(e) => e.code(),
            CommandError::Install(e) => e.code(),
            CommandError::Other(_) => DISPATCH_CATCH_ALL_CODE,
        }
    }
}

impl From<rnbo_db::DbError> for CommandError {
    fn from(e: rnbo_db::DbError) -> Self {
        CommandError::Other(e.to_string())
    }
}

impl From<rnbo_instance::InstanceError> for CommandError {
    fn from(e: rnbo_instance::InstanceError) -> Self {
        CommandError::Other(e.to_string())
    }
}

impl From<rnbo_patcher::PatcherLoadError> for CommandError {
    fn from(e: rnbo_patcher::PatcherLoadError) -> Self {
        CommandError::Other(e.to_string())
    }
}

impl From<rnbo_audio::AudioError> for CommandError {
    fn from(e: rnbo_audio::AudioError) -> Self {
        CommandError::Other(e.to_string())
    }
}

impl From<std::io::Error> for CommandError {
    fn from(e: std::io::Error) -> Self {
        CommandError::Other(e.to_string())
    }
}
