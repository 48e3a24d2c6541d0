//! Optional recording subsystem: one SPSC ring per input channel, filled
//! from the realtime callback, drained and interleaved by a writer thread
//! that streams to disk with `hound`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use rtrb::{Consumer, Producer, RingBuffer};

use crate::error::AudioError;
use crate::timestamp::recording_filename_stamp;

const FREE_SPACE_THRESHOLD_BYTES: u64 = 100 * 1024 * 1024;
const REPORT_INTERVAL: Duration = Duration::from_millis(100);

/// Per-channel producer handed to the realtime callback.
pub struct RecorderChannel {
    producer: Producer<f32>,
    full_count: Arc<AtomicUsize>,
}

impl RecorderChannel {
    /// Realtime-safe: pushes one period's worth of samples, or drops the
    /// whole period and bumps `full_count` if the ring doesn't have room.
    pub fn write_period(&mut self, samples: &[f32]) {
        if self.producer.slots() < samples.len() {
            self.full_count.fetch_add(1, Ordering::Relaxed);
            return;
        }
        for &s in samples {
            let _ = self.producer.push(s);
        }
    }
}

struct ChannelRing {
    consumer: Consumer<f32>,
}

pub struct RecorderHandle {
    stop_flag: Arc<AtomicBool>,
    seconds_captured_bits: Arc<AtomicU64>,
    writer: Option<JoinHandle<()>>,
}

impl RecorderHandle {
    pub fn seconds_captured(&self) -> f64 {
        f64::from_bits(self.seconds_captured_bits.load(Ordering::Relaxed))
    }

    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.writer.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RecorderHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn free_space_bytes(path: &Path) -> u64 {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = match CString::new(path.as_os_str().as_bytes()) {
        Ok(p) => p,
        Err(_) => return u64::MAX,
    };
    unsafe {
        let mut stat: libc::statvfs = std::mem::zeroed();
        if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
            return u64::MAX;
        }
        stat.f_bavail as u64 * stat.f_frsize as u64
    }
}

/// Starts the recorder: `channel_count` rings, each sized
/// `period_frames * 8` samples, writing interleaved to `datafile_dir` with a
/// strftime-rendered name. `timeout_secs`, if set, stops recording once that
/// many seconds have been captured.
pub fn start(
    datafile_dir: PathBuf,
    temp_dir: PathBuf,
    channel_count: usize,
    period_frames: usize,
    sample_rate: u32,
    timeout_secs: Option<f64>,
) -> Result<(Vec<RecorderChannel>, RecorderHandle), AudioError> {
    let capacity = period_frames * 8;
    let mut channels = Vec::with_capacity(channel_count);
    let mut rings = Vec::with_capacity(channel_count);

    for _ in 0..channel_count {
        let (producer, consumer) = RingBuffer::<f32>::new(capacity);
        let full_count = Arc::new(AtomicUsize::new(0));
        channels.push(RecorderChannel { producer, full_count: full_count.clone() });
        rings.push(ChannelRing { consumer });
    }

    let stop_flag = Arc::new(AtomicBool::new(false));
    let seconds_captured_bits = Arc::new(AtomicU64::new(0f64.to_bits()));

    let temp_path = temp_dir.join(format!("rnbo-recording-{}.wav.tmp", recording_filename_stamp()));
    let final_path = datafile_dir.join(format!("rnbo-recording-{}.wav", recording_filename_stamp()));

    let spec = hound::WavSpec {
        channels: channel_count.max(1) as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&temp_path, spec)?;

    let stop_flag_writer = stop_flag.clone();
    let seconds_writer = seconds_captured_bits.clone();
    let writer_temp_dir = temp_path.clone();

    let handle = std::thread::spawn(move || {
        let mut frames_written: u64 = 0;
        let mut last_report = std::time::Instant::now();

        loop {
            if free_space_bytes(&writer_temp_dir) < FREE_SPACE_THRESHOLD_BYTES {
                log::warn!("recorder stopping: free space below threshold");
                break;
            }

            let mut wrote_any = false;
            'frame: loop {
                let mut frame = Vec::with_capacity(rings.len());
                for ring in rings.iter_mut() {
                    match ring.consumer.pop() {
                        Ok(s) => frame.push(s),
                        Err(_) => break 'frame,
                    }
                }
                for s in frame {
                    let _ = writer.write_sample(s);
                }
                frames_written += 1;
                wrote_any = true;
            }

            if last_report.elapsed() >= REPORT_INTERVAL {
                let secs = frames_written as f64 / sample_rate.max(1) as f64;
                seconds_writer.store(secs.to_bits(), Ordering::Relaxed);
                last_report = std::time::Instant::now();

                if let Some(timeout) = timeout_secs {
                    if secs >= timeout {
                        break;
                    }
                }
            }

            if stop_flag_writer.load(Ordering::SeqCst) {
                break;
            }
            if !wrote_any {
                std::thread::sleep(Duration::from_millis(5));
            }
        }

        let _ = writer.finalize();
        if let Err(e) = std::fs::rename(&writer_temp_dir, &final_path) {
            log::warn!("failed to finalize recording to {}: {}", final_path.display(), e);
        }
    });

    Ok((
        channels,
        RecorderHandle {
            stop_flag,
            seconds_captured_bits,
            writer: Some(handle),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_period_drops_and_counts_when_ring_is_full() {
        let (producer, _consumer) = RingBuffer::<f32>::new(4);
        let full_count = Arc::new(AtomicUsize::new(0));
        let mut channel = RecorderChannel { producer, full_count: full_count.clone() };

        channel.write_period(&[0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(full_count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn recorder_writes_a_finalized_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let (mut channels, mut handle) = start(
            dir.path().to_path_buf(),
            dir.path().to_path_buf(),
            1,
            64,
            44100,
            None,
        )
        .unwrap();

        for _ in 0..10 {
            channels[0].write_period(&[0.1; 64]);
            std::thread::sleep(Duration::from_millis(5));
        }
        handle.stop();

        let found = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| e.path().extension().map(|ext| ext == "wav").unwrap_or(false));
        assert!(found);
    }
}
