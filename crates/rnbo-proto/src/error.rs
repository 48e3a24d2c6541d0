//! Stable error-kind enums for the command stream, each with a numeric `code()`
//! matching the values clients key off of.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileLoadError {
    #[error("patcher export not found: {0}")]
    ExportNotFound(String),
    #[error("compile already in progress")]
    AlreadyCompiling,
    #[error("compiler exited with status {0}")]
    CompilerFailed(i32),
    #[error("library load failed: {0}")]
    LoadFailed(String),
    #[error("no factory entry point in library")]
    NoFactory,
}

impl CompileLoadError {
    pub fn code(&self) -> i64 {
        match self {
            CompileLoadError::ExportNotFound(_) => 1,
            CompileLoadError::AlreadyCompiling => 2,
            CompileLoadError::CompilerFailed(_) => 3,
            CompileLoadError::LoadFailed(_) => 4,
            CompileLoadError::NoFactory => 5,
        }
    }
}

#[derive(Debug, Error)]
pub enum FileCommandError {
    #[error("unknown file category: {0}")]
    UnknownCategory(String),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("path escapes data directory: {0}")]
    PathEscape(String),
    #[error("io error: {0}")]
    Io(String),
}

impl FileCommandError {
    pub fn code(&self) -> i64 {
        match self {
            FileCommandError::UnknownCategory(_) => 1,
            FileCommandError::NotFound(_) => 2,
            FileCommandError::PathEscape(_) => 3,
            FileCommandError::Io(_) => 4,
        }
    }
}

#[derive(Debug, Error)]
pub enum PackageCommandError {
    #[error("package not found: {0}")]
    NotFound(String),
    #[error("archive is malformed: {0}")]
    Malformed(String),
    #[error("io error: {0}")]
    Io(String),
}

impl PackageCommandError {
    pub fn code(&self) -> i64 {
        match self {
            PackageCommandError::NotFound(_) => 1,
            PackageCommandError::Malformed(_) => 2,
            PackageCommandError::Io(_) => 3,
        }
    }
}

impl From<std::io::Error> for PackageCommandError {
    fn from(e: std::io::Error) -> Self {
        PackageCommandError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for PackageCommandError {
    fn from(e: serde_json::Error) -> Self {
        PackageCommandError::Malformed(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("listener already registered: {0}")]
    AlreadyRegistered(String),
    #[error("listener not found: {0}")]
    NotFound(String),
}

impl ListenerError {
    pub fn code(&self) -> i64 {
        match self {
            ListenerError::AlreadyRegistered(_) => 1,
            ListenerError::NotFound(_) => 2,
        }
    }
}

#[derive(Debug, Error)]
pub enum InstallProgramError {
    #[error("malformed version string: {0}")]
    MalformedVersion(String),
    #[error("update peer unavailable")]
    PeerUnavailable,
    #[error("install already in progress")]
    AlreadyInstalling,
    #[error("update peer reported failure: {0}")]
    PeerFailed(String),
}

impl InstallProgramError {
    pub fn code(&self) -> i64 {
        match self {
            InstallProgramError::MalformedVersion(_) => 1,
            InstallProgramError::PeerUnavailable => 2,
            InstallProgramError::AlreadyInstalling => 3,
            InstallProgramError::PeerFailed(_) => 4,
        }
    }
}

/// Catch-all code used by the dispatcher when a handler panics or returns an
/// error type with no dedicated kind.
pub const DISPATCH_CATCH_ALL_CODE: i64 = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_codes_are_stable() {
        assert_eq!(CompileLoadError::AlreadyCompiling.code(), 2);
        assert_eq!(CompileLoadError::NoFactory.code(), 5);
    }

    #[test]
    fn catch_all_code_is_1000() {
        assert_eq!(DISPATCH_CATCH_ALL_CODE, 1000);
    }
}
