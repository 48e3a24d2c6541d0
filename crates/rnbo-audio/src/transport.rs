//! Translates JACK transport state into the DSP-facing snapshot: rolling
//! state, tempo, time signature, and beat time derived from bar/beat/tick
//! with zero-based arithmetic (JACK reports bar/beat as 1-based).

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportSnapshot {
    pub rolling: bool,
    pub tempo_bpm: f64,
    pub time_sig_numerator: i32,
    pub time_sig_denominator: i32,
    pub beat_time: f64,
}

impl Default for TransportSnapshot {
    fn default() -> Self {
        Self {
            rolling: false,
            tempo_bpm: 120.0,
            time_sig_numerator: 4,
            time_sig_denominator: 4,
            beat_time: 0.0,
        }
    }
}

impl TransportSnapshot {
    /// `true` if any field that the DSP cares about actually moved, so the
    /// caller can skip emitting a transport event on unchanged cycles.
    pub fn differs_from(&self, other: &TransportSnapshot) -> bool {
        self.rolling != other.rolling
            || (self.tempo_bpm - other.tempo_bpm).abs() > f64::EPSILON
            || self.time_sig_numerator != other.time_sig_numerator
            || self.time_sig_denominator != other.time_sig_denominator
    }
}

/// Build a snapshot from a JACK transport query. `bar`/`beat` are JACK's
/// 1-based counters; `tick` is 0-based within the beat.
pub fn translate(
    rolling: bool,
    tempo_bpm: f64,
    time_sig_numerator: i32,
    time_sig_denominator: i32,
    bar: i32,
    beat: i32,
    tick: f64,
    ticks_per_beat: f64,
) -> TransportSnapshot {
    let beats_per_bar = time_sig_numerator.max(1) as f64;
    let bar_beats = (bar.max(1) - 1) as f64 * beats_per_bar;
    let beat_in_bar = (beat.max(1) - 1) as f64;
    let tick_fraction = if ticks_per_beat > 0.0 { tick / ticks_per_beat } else { 0.0 };

    TransportSnapshot {
        rolling,
        tempo_bpm,
        time_sig_numerator,
        time_sig_denominator,
        beat_time: bar_beats + beat_in_bar + tick_fraction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_bar_first_beat_is_zero() {
        let snap = translate(true, 120.0, 4, 4, 1, 1, 0.0, 960.0);
        assert_eq!(snap.beat_time, 0.0);
    }

    #[test]
    fn second_bar_second_beat_accounts_for_time_signature() {
        let snap = translate(true, 120.0, 3, 4, 2, 2, 0.0, 960.0);
        // bar 2 => 3 beats elapsed (3/4 time), beat 2 => +1 beat
        assert_eq!(snap.beat_time, 4.0);
    }

    #[test]
    fn tick_contributes_a_fraction_of_a_beat() {
        let snap = translate(true, 120.0, 4, 4, 1, 1, 480.0, 960.0);
        assert_eq!(snap.beat_time, 0.5);
    }

    #[test]
    fn differs_from_ignores_beat_time_churn() {
        let a = TransportSnapshot { beat_time: 1.0, ..TransportSnapshot::default() };
        let b = TransportSnapshot { beat_time: 2.0, ..TransportSnapshot::default() };
        assert!(!a.differs_from(&b));
    }
}
