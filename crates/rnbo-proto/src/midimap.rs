//! MIDI message <-> normalized value/key conversions.
//!
//! Ported from the runner's `midimap` namespace: a compact 16-bit key
//! identifies a MIDI message shape (status nibble + channel, plus the first
//! data byte where the message carries no second data byte), and a
//! normalized `f64` value in `[0, 1]` (or `[-1, 1]` for pitch bend) is
//! derived from the message's data bytes.

use serde_json::{json, Value};

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const KEY_PRESSURE: u8 = 0xA0;
const CONTROL_CHANGE: u8 = 0xB0;
const PROGRAM_CHANGE: u8 = 0xC0;
const CHANNEL_PRESSURE: u8 = 0xD0;
const PITCH_BEND_CHANGE: u8 = 0xE0;

const SONG_POSITION_POINTER: u8 = 0xF2;
const QUARTER_FRAME: u8 = 0xF1;
const SONG_SELECT: u8 = 0xF3;
const TUNE_REQUEST: u8 = 0xF6;
const START: u8 = 0xFA;
const CONTINUE: u8 = 0xFB;
const STOP: u8 = 0xFC;
const ACTIVE_SENSING: u8 = 0xFE;
const RESET: u8 = 0xFF;

/// Normalize `(status, data0, data1)` to a value in `[0, 1]` for most
/// message types, or `[-1, 1]` for pitch bend.
pub fn value(status: u8, data0: u8, data1: u8) -> f64 {
    let kind = status & 0xF0;
    match kind {
        NOTE_OFF => 0.0,
        NOTE_ON => f64::from(data1) / 127.0,
        KEY_PRESSURE => f64::from(data1) / 127.0,
        CONTROL_CHANGE => f64::from(data1) / 127.0,
        PROGRAM_CHANGE => f64::from(data0) / 127.0,
        CHANNEL_PRESSURE => f64::from(data0) / 127.0,
        PITCH_BEND_CHANGE => {
            let raw = (u16::from(data1) << 7) | u16::from(data0);
            (f64::from(raw) / 8192.0) - 1.0
        }
        _ => match status {
            SONG_POSITION_POINTER => {
                let raw = (u16::from(data1) << 7) | u16::from(data0);
                f64::from(raw) / 16383.0
            }
            QUARTER_FRAME => f64::from(data0) / 127.0,
            SONG_SELECT => f64::from(data0) / 127.0,
            TUNE_REQUEST | START | CONTINUE | STOP | ACTIVE_SENSING | RESET => 1.0,
            _ => 0.0,
        },
    }
}

/// Pack a message shape into a compact 16-bit key: `(status|chan) << 8 | data0`
/// for channel messages whose `data0` is a discriminator (note/controller
/// number), or `status << 8 | data0` for system messages that carry a data0
/// discriminator, else `status << 8`. Program change, channel pressure, and
/// pitch bend carry their *value* in `data0`, not a discriminator, so it's
/// dropped from the key -- every program change on a channel shares one key.
pub fn is_program_change(status: u8) -> bool {
    status & 0xF0 == PROGRAM_CHANGE
}

pub fn key(status: u8, data0: u8) -> u16 {
    let kind = status & 0xF0;
    let carries_data0 = matches!(kind, NOTE_OFF | NOTE_ON | KEY_PRESSURE | CONTROL_CHANGE)
        || matches!(status, SONG_POSITION_POINTER | QUARTER_FRAME | SONG_SELECT);
    if carries_data0 {
        (u16::from(status) << 8) | u16::from(data0)
    } else {
        u16::from(status) << 8
    }
}

/// Decode a key back into `(status, data0)`.
pub fn unkey(key: u16) -> (u8, u8) {
    ((key >> 8) as u8, (key & 0xFF) as u8)
}

/// Build the JSON description of a key, matching the shape the command
/// stream uses for MIDI map entries (`{"status":.., "data0":.., "chan":..}`).
pub fn json(key: u16) -> Value {
    let (status, data0) = unkey(key);
    let kind = status & 0xF0;
    if kind == 0xF0 {
        json!({ "status": status, "data0": data0 })
    } else {
        json!({ "status": kind, "chan": status & 0x0F, "data0": data0 })
    }
}

/// Parse a key from the same JSON shape `json()` produces.
pub fn key_from_json(v: &Value) -> Option<u16> {
    let status = v.get("status")?.as_u64()? as u8;
    let data0 = v.get("data0").and_then(|d| d.as_u64()).unwrap_or(0) as u8;
    let status = if let Some(chan) = v.get("chan").and_then(|c| c.as_u64()) {
        (status & 0xF0) | (chan as u8 & 0x0F)
    } else {
        status
    };
    Some(key(status, data0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_velocity_normalizes() {
        assert_eq!(value(NOTE_ON, 60, 127), 1.0);
        assert_eq!(value(NOTE_ON, 60, 0), 0.0);
    }

    #[test]
    fn control_change_normalizes() {
        assert!((value(CONTROL_CHANGE | 0x03, 7, 64) - 64.0 / 127.0).abs() < 1e-9);
    }

    #[test]
    fn pitch_bend_centers_at_zero() {
        assert!((value(PITCH_BEND_CHANGE, 0, 64) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn transport_messages_fire_at_one() {
        assert_eq!(value(START, 0, 0), 1.0);
        assert_eq!(value(STOP, 0, 0), 1.0);
    }

    #[test]
    fn key_distinguishes_channel_for_control_change() {
        let k1 = key(CONTROL_CHANGE | 0x00, 7);
        let k2 = key(CONTROL_CHANGE | 0x01, 7);
        assert_ne!(k1, k2);
    }

    #[test]
    fn key_ignores_data0_for_realtime_messages() {
        assert_eq!(key(START, 0), key(START, 0));
        let (status, _) = unkey(key(START, 5));
        assert_eq!(status, START);
    }

    #[test]
    fn json_round_trips_through_key() {
        let k = key(CONTROL_CHANGE | 0x02, 74);
        let v = json(k);
        assert_eq!(key_from_json(&v), Some(k));
    }

    #[test]
    fn key_ignores_data0_for_program_change_and_pressure_and_bend() {
        assert_eq!(key(PROGRAM_CHANGE | 0x01, 2), key(PROGRAM_CHANGE | 0x01, 77));
        assert_eq!(key(CHANNEL_PRESSURE | 0x01, 10), key(CHANNEL_PRESSURE | 0x01, 90));
        assert_eq!(key(PITCH_BEND_CHANGE | 0x01, 0), key(PITCH_BEND_CHANGE | 0x01, 127));
        assert!(is_program_change(PROGRAM_CHANGE | 0x03));
        assert!(!is_program_change(CONTROL_CHANGE | 0x03));
    }
}
