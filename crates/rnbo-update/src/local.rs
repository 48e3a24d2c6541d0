//! In-process stand-in for the real system update-bus peer, which is out
//! of scope here. Always idle with nothing outdated; `queue_runner_install`
//! and `update_outdated` are accepted but are no-ops.

use std::sync::Mutex;

use rnbo_proto::error::InstallProgramError;

use crate::peer::{UpdatePeer, UpdateState};

pub struct LocalUpdatePeer {
    status: Mutex<String>,
}

impl LocalUpdatePeer {
    pub fn new() -> Self {
        Self {
            status: Mutex::new("no update peer connected".to_string()),
        }
    }
}

impl Default for LocalUpdatePeer {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdatePeer for LocalUpdatePeer {
    fn state(&self) -> UpdateState {
        UpdateState::Idle
    }

    fn status(&self) -> String {
        self.status.lock().unwrap().clone()
    }

    fn outdated_packages(&self) -> u32 {
        0
    }

    fn queue_runner_install_checked(&self, version: &str) -> Result<bool, InstallProgramError> {
        *self.status.lock().unwrap() = format!("install of {version} requested, no peer available");
        log::warn!("queue_runner_install({version}) called with no update peer attached");
        Ok(false)
    }

    fn update_outdated(&self) -> Result<(), InstallProgramError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_idle_with_nothing_outdated() {
        let peer = LocalUpdatePeer::new();
        assert_eq!(peer.state(), UpdateState::Idle);
        assert_eq!(peer.outdated_packages(), 0);
    }

    #[test]
    fn queue_runner_install_accepts_a_well_formed_version_but_does_nothing() {
        let peer = LocalUpdatePeer::new();
        let queued = peer.queue_runner_install("1.3.0").unwrap();
        assert!(!queued);
        assert!(peer.status().contains("1.3.0"));
    }

    #[test]
    fn queue_runner_install_rejects_a_malformed_version() {
        let peer = LocalUpdatePeer::new();
        let err = peer.queue_runner_install("bad version").unwrap_err();
        assert!(matches!(err, InstallProgramError::MalformedVersion(_)));
    }
}
