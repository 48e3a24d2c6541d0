//! Async preset capture: a dedicated worker thread serializes and persists
//! a parameter snapshot off the calling thread, the same way `DatarefWorker`
//! keeps file decoding off the audio path. Completion is reported back as
//! the same `InstanceEvent` the control thread already drains.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};

use rnbo_db::Db;

use crate::events::InstanceEvent;
use crate::preset::PresetStore;

enum PresetSaveCommand {
    Save { db: Db, patcher_id: i64, name: String, content: serde_json::Value },
    Shutdown,
}

pub struct PresetWorker {
    command_tx: Sender<PresetSaveCommand>,
    event_rx: Receiver<InstanceEvent>,
    handle: Option<JoinHandle<()>>,
}

impl PresetWorker {
    pub fn spawn() -> Self {
        let (command_tx, command_rx) = channel::unbounded::<PresetSaveCommand>();
        let (event_tx, event_rx) = channel::unbounded::<InstanceEvent>();

        let handle = std::thread::spawn(move || loop {
            match command_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(PresetSaveCommand::Shutdown) | Err(channel::RecvTimeoutError::Disconnected) => break,
                Ok(PresetSaveCommand::Save { db, patcher_id, name, content }) => {
                    match PresetStore::save_patcher_preset(&db, patcher_id, &name, &content) {
                        Ok(()) => {
                            let _ = event_tx.send(InstanceEvent::PresetSaveCompleted { name, content });
                        }
                        Err(e) => log::warn!("preset save failed for {name}: {e}"),
                    }
                }
                Err(channel::RecvTimeoutError::Timeout) => {}
            }
        });

        Self { command_tx, event_rx, handle: Some(handle) }
    }

    pub fn request_save(&self, db: Db, patcher_id: i64, name: impl Into<String>, content: serde_json::Value) {
        let _ = self.command_tx.send(PresetSaveCommand::Save { db, patcher_id, name: name.into(), content });
    }

    pub fn try_recv_event(&self) -> Option<InstanceEvent> {
        self.event_rx.try_recv().ok()
    }
}

impl Drop for PresetWorker {
    fn drop(&mut self) {
        let _ = self.command_tx.send(PresetSaveCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rnbo_db::PatcherQuery;
    use serde_json::json;

    #[test]
    fn save_reports_completion_with_the_saved_content() {
        let db = Db::in_memory().unwrap();
        let patcher_id = PatcherQuery::store(&db, "synth", "synth.so", "1.0", "{}", "synth.json").unwrap();

        let worker = PresetWorker::spawn();
        worker.request_save(db.clone(), patcher_id, "lead", json!({"0": 0.5}));

        let mut event = None;
        for _ in 0..50 {
            if let Some(e) = worker.try_recv_event() {
                event = Some(e);
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        match event {
            Some(InstanceEvent::PresetSaveCompleted { name, content }) => {
                assert_eq!(name, "lead");
                assert_eq!(content, json!({"0": 0.5}));
            }
            other => panic!("expected PresetSaveCompleted, got {}", other.is_some()),
        }
    }
}
