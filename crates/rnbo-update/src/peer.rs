//! The update-bus peer surface: properties and methods the real system
//! peer (out of scope here, per the external-interfaces boundary) exposes
//! over D-Bus. Only the interface is normative.

use rnbo_proto::error::InstallProgramError;
use rnbo_proto::version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Idle,
    Active,
    Failed,
}

impl UpdateState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateState::Idle => "idle",
            UpdateState::Active => "active",
            UpdateState::Failed => "failed",
        }
    }
}

/// The properties and methods a system update-bus peer publishes.
pub trait UpdatePeer: Send + Sync {
    fn state(&self) -> UpdateState;
    fn status(&self) -> String;
    fn outdated_packages(&self) -> u32;

    /// Queues an install of `version`. Rejects malformed version strings
    /// before making any call into the peer.
    fn queue_runner_install(&self, version: &str) -> Result<bool, InstallProgramError> {
        if !version::is_valid(version) {
            return Err(InstallProgramError::MalformedVersion(version.to_string()));
        }
        self.queue_runner_install_checked(version)
    }

    /// Called only with an already-validated version string.
    fn queue_runner_install_checked(&self, version: &str) -> Result<bool, InstallProgramError>;

    fn update_outdated(&self) -> Result<(), InstallProgramError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RejectingPeer;
    impl UpdatePeer for RejectingPeer {
        fn state(&self) -> UpdateState {
            UpdateState::Idle
        }
        fn status(&self) -> String {
            String::new()
        }
        fn outdated_packages(&self) -> u32 {
            0
        }
        fn queue_runner_install_checked(&self, _version: &str) -> Result<bool, InstallProgramError> {
            panic!("should not be reached for a malformed version")
        }
        fn update_outdated(&self) -> Result<(), InstallProgramError> {
            Ok(())
        }
    }

    #[test]
    fn malformed_version_never_reaches_the_peer() {
        let peer = RejectingPeer;
        let err = peer.queue_runner_install("not-a-version!").unwrap_err();
        assert!(matches!(err, InstallProgramError::MalformedVersion(_)));
    }
}
