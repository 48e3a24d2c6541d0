//! Realtime-safe linear in/out amplitude fade. `advance` is called once per
//! audio callback with the elapsed block time; it never allocates or locks.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

const INACTIVE: u8 = 0;
const FADING_IN: u8 = 1;
const ACTIVE: u8 = 2;
const FADING_OUT: u8 = 3;
const STOPPED: u8 = 4;

pub struct Fade {
    state: AtomicU8,
    length_ms: AtomicU64,
    elapsed_ms: AtomicU64,
}

impl Default for Fade {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(INACTIVE),
            length_ms: AtomicU64::new(0f64.to_bits()),
            elapsed_ms: AtomicU64::new(0f64.to_bits()),
        }
    }
}

impl Fade {
    pub fn start(&self, fade_ms: f64) {
        self.length_ms.store(fade_ms.max(0.0).to_bits(), Ordering::SeqCst);
        self.elapsed_ms.store(0f64.to_bits(), Ordering::SeqCst);
        self.state.store(FADING_IN, Ordering::SeqCst);
    }

    pub fn stop(&self, fade_ms: f64) {
        self.length_ms.store(fade_ms.max(0.0).to_bits(), Ordering::SeqCst);
        self.elapsed_ms.store(0f64.to_bits(), Ordering::SeqCst);
        self.state.store(FADING_OUT, Ordering::SeqCst);
    }

    /// Advance by `delta_ms` and return the gain to apply this block.
    pub fn advance(&self, delta_ms: f64) -> f32 {
        let state = self.state.load(Ordering::SeqCst);
        match state {
            INACTIVE | STOPPED => 0.0,
            ACTIVE => 1.0,
            FADING_IN | FADING_OUT => {
                let length = f64::from_bits(self.length_ms.load(Ordering::SeqCst));
                let elapsed = f64::from_bits(self.elapsed_ms.load(Ordering::SeqCst)) + delta_ms;
                self.elapsed_ms.store(elapsed.to_bits(), Ordering::SeqCst);

                let progress = if length <= 0.0 { 1.0 } else { (elapsed / length).min(1.0) };
                if state == FADING_IN {
                    if progress >= 1.0 {
                        self.state.store(ACTIVE, Ordering::SeqCst);
                    }
                    progress as f32
                } else {
                    let gain = 1.0 - progress;
                    if progress >= 1.0 {
                        self.state.store(STOPPED, Ordering::SeqCst);
                    }
                    gain.max(0.0) as f32
                }
            }
            _ => unreachable!("invalid fade state"),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.state.load(Ordering::SeqCst) == STOPPED
    }

    pub fn is_fading_out(&self) -> bool {
        self.state.load(Ordering::SeqCst) == FADING_OUT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_in_ramps_to_unity_then_holds() {
        let fade = Fade::default();
        fade.start(10.0);
        assert!(fade.advance(5.0) < 1.0);
        let g = fade.advance(5.0);
        assert!((g - 1.0).abs() < 1e-6);
        assert_eq!(fade.advance(1.0), 1.0);
    }

    #[test]
    fn fade_out_reaches_zero_and_reports_stopped() {
        let fade = Fade::default();
        fade.stop(10.0);
        fade.advance(5.0);
        let g = fade.advance(5.0);
        assert_eq!(g, 0.0);
        assert!(fade.is_stopped());
    }

    #[test]
    fn zero_length_fade_completes_immediately() {
        let fade = Fade::default();
        fade.start(0.0);
        assert_eq!(fade.advance(0.0), 1.0);
    }
}
