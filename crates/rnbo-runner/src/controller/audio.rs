//! `activate_audio` and `restart_audio`: bringing the JACK bridge up (or
//! cycling it) for every currently loaded instance.

use std::sync::atomic::Ordering;

use serde_json::{json, Value};

use crate::error::CommandError;

use super::Controller;

impl Controller {
    /// Starts a JACK client for every loaded instance that doesn't have one
    /// yet. Idempotent: instances already wired in are left alone.
    pub fn activate_audio(&self, _params: Value) -> Result<Value, CommandError> {
        let instances: Vec<(i64, std::sync::Arc<rnbo_instance::Instance>)> = self
            .instances
            .lock()
            .unwrap()
            .iter()
            .map(|(i, inst)| (*i, inst.clone()))
            .collect();

        let mut started = Vec::new();
        for (index, instance) in instances {
            if self.audio_clients.lock().unwrap().contains_key(&index) {
                continue;
            }
            self.start_instance_audio(index, &instance)?;
            started.push(index);
        }

        self.audio_active.store(true, Ordering::SeqCst);
        log::info!("audio activated, {} instance(s) wired", started.len());
        Ok(json!({ "activated": started }))
    }

    /// Tears down every instance's audio client, then activates again. Used
    /// after a JACK server restart or sample-rate change.
    pub fn restart_audio(&self, params: Value) -> Result<Value, CommandError> {
        let indexes: Vec<i64> = self.audio_clients.lock().unwrap().keys().copied().collect();
        for index in indexes {
            self.audio_clients.lock().unwrap().remove(&index);
        }
        self.audio_active.store(false, Ordering::SeqCst);
        self.activate_audio(params)
    }
}
