//! Frame-offset <-> millisecond translation for MIDI crossing the realtime
//! boundary, plus the small raw-event types used on each side.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InboundMidiEvent {
    /// Offset, in ms relative to "now" (the start of the current block).
    pub offset_ms: f64,
    pub status: u8,
    pub data0: u8,
    pub data1: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutboundMidiEvent {
    /// Offset, in ms relative to "now", at which this event should fire.
    pub offset_ms: f64,
    pub status: u8,
    pub data0: u8,
    pub data1: u8,
}

pub fn frame_to_ms(frame_offset: u32, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    frame_offset as f64 * 1000.0 / sample_rate as f64
}

/// Clamped to `[0, block_frames]`, since an outbound event scheduled before
/// "now" or past the end of the current block can't be placed exactly.
pub fn ms_to_frame(offset_ms: f64, sample_rate: u32, block_frames: u32) -> u32 {
    let frame = (offset_ms * sample_rate as f64 / 1000.0).round();
    frame.clamp(0.0, block_frames as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_to_ms_round_trips_through_ms_to_frame() {
        let ms = frame_to_ms(441, 44100);
        assert!((ms - 10.0).abs() < 1e-6);
        assert_eq!(ms_to_frame(ms, 44100, 1024), 441);
    }

    #[test]
    fn ms_to_frame_clamps_to_block_bounds() {
        assert_eq!(ms_to_frame(-5.0, 44100, 512), 0);
        assert_eq!(ms_to_frame(1_000_000.0, 44100, 512), 512);
    }

    #[test]
    fn zero_sample_rate_does_not_divide_by_zero() {
        assert_eq!(frame_to_ms(100, 0), 0.0);
    }
}
