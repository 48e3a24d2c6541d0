//! Well-known config keys and the MIDI program-change channel selector.

pub const SO_BUILD_EXE: &str = "so_build_exe";
pub const RNBO_CPP_DIR: &str = "rnbo_cpp_dir";
pub const CMAKE_PATH: &str = "cmake_path";
pub const SOURCE_CACHE_DIR: &str = "source_cache_dir";
pub const COMPILE_CACHE_DIR: &str = "compile_cache_dir";
pub const DATA_FILE_DIR: &str = "datafile_dir";
pub const SAVE_DIR: &str = "save_dir";
pub const DB_PATH: &str = "db_path";
pub const INSTANCE_AUTO_START_LAST: &str = "instance_auto_start_last";
pub const INSTANCE_AUTO_CONNECT_AUDIO: &str = "instance_auto_connect_audio";
pub const INSTANCE_AUTO_CONNECT_AUDIO_INDEXED: &str = "instance_auto_connect_audio_indexed";
pub const INSTANCE_AUTO_CONNECT_MIDI: &str = "instance_auto_connect_midi";
pub const INSTANCE_AUTO_CONNECT_MIDI_HARDWARE: &str = "instance_auto_connect_midi_hardware";
pub const INSTANCE_AUTO_CONNECT_PORT_GROUP: &str = "instance_auto_connect_port_group";
pub const HOST_NAME_OVERRIDE: &str = "host_name_override";
pub const AUDIO_FADE_IN_MS: &str = "audio_fade_in_ms";
pub const AUDIO_FADE_OUT_MS: &str = "audio_fade_out_ms";

pub const PRESET_MIDI_PROGRAM_CHANGE_CHANNEL_PATCHER: &str = "preset_midi_pgm_channel.patcher";
pub const PRESET_MIDI_PROGRAM_CHANGE_CHANNEL_SET: &str = "preset_midi_pgm_channel.set";
pub const PRESET_MIDI_PROGRAM_CHANGE_CHANNEL_SET_PRESET: &str = "preset_midi_pgm_channel.set_preset";
pub const PRESET_MIDI_PROGRAM_CHANGE_CHANNEL_INSTANCE_PRESET: &str =
    "preset_midi_pgm_channel.instance_preset";

pub const DEFAULT_FADE_IN_MS: u64 = 5;
pub const DEFAULT_FADE_OUT_MS: u64 = 20;

/// `none | omni | 1..16`, selecting which MIDI channel a program-change
/// message must arrive on to trigger a preset switch for a given scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiProgramChangeChannel {
    None,
    Omni,
    Channel(u8),
}

impl MidiProgramChangeChannel {
    pub fn matches(self, channel: u8) -> bool {
        match self {
            MidiProgramChangeChannel::None => false,
            MidiProgramChangeChannel::Omni => true,
            MidiProgramChangeChannel::Channel(c) => c == channel,
        }
    }

    pub fn to_json_number(self) -> i64 {
        match self {
            MidiProgramChangeChannel::None => -1,
            MidiProgramChangeChannel::Omni => 0,
            MidiProgramChangeChannel::Channel(c) => i64::from(c),
        }
    }

    pub fn from_json_number(n: i64) -> Self {
        match n {
            n if n <= -1 => MidiProgramChangeChannel::None,
            0 => MidiProgramChangeChannel::Omni,
            n if (1..=16).contains(&n) => MidiProgramChangeChannel::Channel(n as u8),
            _ => MidiProgramChangeChannel::None,
        }
    }
}

impl Default for MidiProgramChangeChannel {
    fn default() -> Self {
        MidiProgramChangeChannel::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omni_matches_every_channel() {
        assert!(MidiProgramChangeChannel::Omni.matches(0));
        assert!(MidiProgramChangeChannel::Omni.matches(15));
    }

    #[test]
    fn none_matches_nothing() {
        assert!(!MidiProgramChangeChannel::None.matches(0));
    }

    #[test]
    fn specific_channel_matches_only_itself() {
        let sel = MidiProgramChangeChannel::Channel(3);
        assert!(sel.matches(3));
        assert!(!sel.matches(4));
    }

    #[test]
    fn json_number_round_trips() {
        for sel in [
            MidiProgramChangeChannel::None,
            MidiProgramChangeChannel::Omni,
            MidiProgramChangeChannel::Channel(9),
        ] {
            let n = sel.to_json_number();
            assert_eq!(MidiProgramChangeChannel::from_json_number(n), sel);
        }
    }
}
