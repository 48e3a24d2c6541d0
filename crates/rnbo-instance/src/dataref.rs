//! Datarefs: named buffers loadable from an audio file. A dedicated worker
//! thread owns file decoding; retired buffers are handed off through an
//! SPSC queue so the audio thread never frees one itself.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};

use crate::error::InstanceError;

pub struct DatarefBuffer {
    pub channels: usize,
    pub frames: usize,
    /// Interleaved samples, `frames * channels` long.
    pub samples: Vec<f32>,
}

pub enum DatarefCommand {
    Load { id: String, path: PathBuf },
    Unload { id: String },
    Shutdown,
}

pub enum DatarefEvent {
    Loaded { id: String, buffer: Arc<DatarefBuffer> },
    LoadFailed { id: String, error: String },
    Unloaded { id: String },
}

fn decode_wav(path: &Path) -> Result<DatarefBuffer, InstanceError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| InstanceError::DatarefDecode(e.to_string()))?,
        hound::SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<Result<_, _>>()
                .map_err(|e| InstanceError::DatarefDecode(e.to_string()))?
        }
    };

    let frames = if channels > 0 { samples.len() / channels } else { 0 };
    Ok(DatarefBuffer { channels, frames, samples })
}

/// Owns a FIFO of load/unload commands; suspends on a short timeout.
pub struct DatarefWorker {
    command_tx: Sender<DatarefCommand>,
    event_rx: Receiver<DatarefEvent>,
    handle: Option<JoinHandle<()>>,
}

impl DatarefWorker {
    pub fn spawn() -> Self {
        let (command_tx, command_rx) = channel::unbounded::<DatarefCommand>();
        let (event_tx, event_rx) = channel::unbounded::<DatarefEvent>();

        let handle = std::thread::spawn(move || loop {
            match command_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(DatarefCommand::Shutdown) | Err(channel::RecvTimeoutError::Disconnected) => break,
                Ok(DatarefCommand::Load { id, path }) => {
                    let event = match decode_wav(&path) {
                        Ok(buffer) => DatarefEvent::Loaded { id, buffer: Arc::new(buffer) },
                        Err(e) => DatarefEvent::LoadFailed { id, error: e.to_string() },
                    };
                    let _ = event_tx.send(event);
                }
                Ok(DatarefCommand::Unload { id }) => {
                    let _ = event_tx.send(DatarefEvent::Unloaded { id });
                }
                Err(channel::RecvTimeoutError::Timeout) => {}
            }
        });

        Self { command_tx, event_rx, handle: Some(handle) }
    }

    pub fn request_load(&self, id: impl Into<String>, path: impl Into<PathBuf>) {
        let _ = self.command_tx.send(DatarefCommand::Load { id: id.into(), path: path.into() });
    }

    pub fn request_unload(&self, id: impl Into<String>) {
        let _ = self.command_tx.send(DatarefCommand::Unload { id: id.into() });
    }

    pub fn try_recv_event(&self) -> Option<DatarefEvent> {
        self.event_rx.try_recv().ok()
    }
}

impl Drop for DatarefWorker {
    fn drop(&mut self) {
        let _ = self.command_tx.send(DatarefCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// The audio-thread side of a dataref slot: holds the buffer currently
/// handed to the DSP, and retires the old one into a cleanup queue on swap
/// instead of dropping it in place.
#[derive(Default)]
pub struct AudioDatarefSlot {
    current: Option<Arc<DatarefBuffer>>,
    retiring: VecDeque<Arc<DatarefBuffer>>,
}

impl AudioDatarefSlot {
    pub fn current(&self) -> Option<&Arc<DatarefBuffer>> {
        self.current.as_ref()
    }

    /// Swap in `new`, pushing any previous buffer onto the pending-retire
    /// list. Call `drain_retired` every cycle from the control thread (never
    /// from the audio callback) to actually free them.
    pub fn swap(&mut self, new: Arc<DatarefBuffer>) {
        if let Some(old) = self.current.replace(new) {
            self.retiring.push_back(old);
        }
    }

    /// Hands ownership of every buffer waiting to be freed to the caller.
    /// Must only be invoked off the audio thread.
    pub fn drain_retired(&mut self) -> Vec<Arc<DatarefBuffer>> {
        self.retiring.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_wav(path: &Path) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..100 {
            writer.write_sample((i as i16) * 10).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn worker_decodes_and_reports_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wav");
        write_test_wav(&path);

        let worker = DatarefWorker::spawn();
        worker.request_load("kick", &path);

        let mut event = None;
        for _ in 0..50 {
            if let Some(e) = worker.try_recv_event() {
                event = Some(e);
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        match event {
            Some(DatarefEvent::Loaded { id, buffer }) => {
                assert_eq!(id, "kick");
                assert_eq!(buffer.frames, 100);
            }
            other => panic!("expected Loaded event, got {:?}", other.is_some()),
        }
    }

    #[test]
    fn missing_file_reports_load_failed() {
        let worker = DatarefWorker::spawn();
        worker.request_load("missing", "/nonexistent/file.wav");

        let mut event = None;
        for _ in 0..50 {
            if let Some(e) = worker.try_recv_event() {
                event = Some(e);
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(matches!(event, Some(DatarefEvent::LoadFailed { .. })));
    }

    #[test]
    fn swap_retires_the_old_buffer_for_later_drain() {
        let mut slot = AudioDatarefSlot::default();
        let buf_a = Arc::new(DatarefBuffer { channels: 1, frames: 1, samples: vec![0.0] });
        let buf_b = Arc::new(DatarefBuffer { channels: 1, frames: 1, samples: vec![1.0] });

        slot.swap(buf_a.clone());
        assert!(slot.drain_retired().is_empty());

        slot.swap(buf_b.clone());
        let retired = slot.drain_retired();
        assert_eq!(retired.len(), 1);
        assert!(Arc::ptr_eq(&retired[0], &buf_a));
        assert!(Arc::ptr_eq(slot.current().unwrap(), &buf_b));
    }
}
