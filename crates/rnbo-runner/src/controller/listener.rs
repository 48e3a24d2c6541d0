//! `listener_add`, `listener_del`, `listener_clear`: thin wrappers over the
//! self-loop-rejecting OSC listener set.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::CommandError;
use crate::listeners;

use super::Controller;

#[derive(Deserialize)]
struct ListenerParams {
    host: String,
    port: u16,
}

impl Controller {
    pub fn listener_add(&self, params: Value) -> Result<Value, CommandError> {
        let params: ListenerParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed listener_add params: {e}")))?;
        listeners::add(&self.db, &params.host, params.port)?;
        Ok(json!({}))
    }

    pub fn listener_del(&self, params: Value) -> Result<Value, CommandError> {
        let params: ListenerParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed listener_del params: {e}")))?;
        listeners::delete(&self.db, &params.host, params.port)?;
        Ok(json!({}))
    }

    pub fn listener_clear(&self, _params: Value) -> Result<Value, CommandError> {
        listeners::clear(&self.db)?;
        Ok(json!({}))
    }
}
