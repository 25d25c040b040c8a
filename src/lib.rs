/// Keytone - control core for a keypad instrument
///
/// This library turns key-matrix events into tones and provides:
/// - Free play on nine keys with a shiftable scale window and sharp modifier
/// - Recording of timed note sequences
/// - Saving takes under short digit codes and replaying them
/// - Audio (cpal) and MIDI (midir) tone outputs

pub mod audio;
pub mod clock;
pub mod config;
pub mod error;
pub mod instrument;
pub mod keypad;
pub mod midi;
pub mod tone_table;

// Re-export commonly used types
pub use audio::{AudioOutput, ToneDriver, ToneHandle, ToneLog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::DeviceError;
pub use instrument::runner::{Chime, ControlLoop};
pub use instrument::{Instrument, InstrumentSettings, Mode, ModeKind, Report};
pub use keypad::{EventKeypad, Key, KeySnapshot, KeySource, KeyState};
pub use midi::{midi_note_name, MidiToneDriver};
