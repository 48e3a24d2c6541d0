//! `install`: forwards a runner version to the update-bus peer. `update_check`
//! asks the peer to refresh its outdated-package list.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::CommandError;

use super::Controller;

#[derive(Deserialize)]
struct InstallParams {
    version: String,
}

impl Controller {
    pub fn install(&self, params: Value) -> Result<Value, CommandError> {
        let params: InstallParams =
            serde_json::from_value(params).map_err(|e| CommandError::Other(format!("malformed install params: {e}")))?;
        let queued = self.update.peer().queue_runner_install(&params.version)?;
        Ok(json!({ "queued": queued }))
    }

    pub fn update_check(&self, _params: Value) -> Result<Value, CommandError> {
        self.update.peer().update_outdated()?;
        Ok(json!({}))
    }
}
