/// MIDI tone mirror using midir
use midir::{MidiOutput, MidiOutputConnection};

use crate::audio::ToneDriver;
use crate::error::DeviceError;

const CLIENT_NAME: &str = "Keytone MIDI Output";
const VELOCITY: u8 = 100;

/// Sends each tone as a note on the nearest MIDI pitch
pub struct MidiToneDriver {
    connection: Option<MidiOutputConnection>,
    sounding: Option<u8>,
}

impl MidiToneDriver {
    pub fn new() -> Self {
        Self {
            connection: None,
            sounding: None,
        }
    }

    pub fn available_ports() -> Vec<String> {
        if let Ok(midi_out) = MidiOutput::new(CLIENT_NAME) {
            midi_out
                .ports()
                .iter()
                .filter_map(|p| midi_out.port_name(p).ok())
                .collect()
        } else {
            vec![]
        }
    }

    pub fn connect(&mut self, port_index: usize) -> Result<(), DeviceError> {
        let midi_out =
            MidiOutput::new(CLIENT_NAME).map_err(|e| DeviceError::Midi(e.to_string()))?;

        let ports = midi_out.ports();
        let port = ports
            .get(port_index)
            .ok_or(DeviceError::InvalidPort(port_index))?;

        let connection = midi_out
            .connect(port, "keytone")
            .map_err(|e| DeviceError::Midi(e.to_string()))?;

        self.connection = Some(connection);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn send(&mut self, message: &[u8]) {
        if let Some(ref mut conn) = self.connection {
            if let Err(e) = conn.send(message) {
                log::warn!(target: "midi", "failed to send {:02x?}: {}", message, e);
            }
        }
    }
}

impl Default for MidiToneDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ToneDriver for MidiToneDriver {
    fn set_frequency(&mut self, hz: f32) {
        let next = frequency_to_midi_note(hz);
        if next == self.sounding {
            return;
        }
        if let Some(note) = self.sounding.take() {
            self.send(&[0x80, note, 0]);
        }
        if let Some(note) = next {
            self.send(&[0x90, note, VELOCITY]);
            self.sounding = Some(note);
        }
    }
}

/// Nearest MIDI note for a frequency; `None` for silence
pub fn frequency_to_midi_note(hz: f32) -> Option<u8> {
    if hz <= 0.0 {
        return None;
    }
    let note = (69.0 + 12.0 * (hz / 440.0).log2()).round();
    Some(note.clamp(0.0, 127.0) as u8)
}

pub fn midi_note_name(note: u8) -> String {
    let note_names = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
    let octave = (note / 12) as i32 - 1;
    let note_index = (note % 12) as usize;
    format!("{}{}", note_names[note_index], octave)
}

/// Display name for a frequency, e.g. `"A4"`
pub fn frequency_name(hz: f32) -> String {
    match frequency_to_midi_note(hz) {
        Some(note) => midi_note_name(note),
        None => "rest".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_to_note() {
        assert_eq!(frequency_to_midi_note(440.0), Some(69));
        assert_eq!(frequency_to_midi_note(261.6256), Some(60));
        assert_eq!(frequency_to_midi_note(277.1826), Some(61));
        assert_eq!(frequency_to_midi_note(0.0), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(midi_note_name(60), "C4");
        assert_eq!(frequency_name(116.5409), "A#2");
        assert_eq!(frequency_name(0.0), "rest");
    }

    #[test]
    fn test_unconnected_driver_tracks_note() {
        let mut driver = MidiToneDriver::new();
        driver.set_frequency(440.0);
        assert_eq!(driver.sounding, Some(69));
        driver.set_frequency(0.0);
        assert_eq!(driver.sounding, None);
        assert!(!driver.is_connected());
    }
}
