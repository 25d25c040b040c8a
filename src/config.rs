use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::instrument::runner::Chime;
use crate::instrument::InstrumentSettings;
use crate::tone_table::MAX_SCALE_OFFSET;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    keypad: KeypadConfig,
    #[serde(default)]
    output: OutputConfig,
}

#[derive(Deserialize, Default)]
struct KeypadConfig {
    debounce_ms: Option<u64>,
    default_scale_offset: Option<usize>,
    poll_interval_ms: Option<u64>,
}

#[derive(Deserialize, Default)]
struct OutputConfig {
    volume: Option<f32>,
    midi_port: Option<usize>,
    chime: Option<Vec<String>>,
    chime_note_ms: Option<u64>,
}

pub struct Config {
    keypad: KeypadConfig,
    output: OutputConfig,
}

impl Config {
    /// Embedded defaults overlaid with the user's config file, if any
    pub fn load() -> Self {
        let mut config = Self::defaults();

        if let Some(path) = user_config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => {
                        if let Err(e) = config.merge_str(&contents) {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    }
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        config
    }

    pub fn defaults() -> Self {
        let base: ConfigFile = toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
            log::error!(target: "config", "embedded config.toml is invalid: {}", e);
            ConfigFile::default()
        });
        Config {
            keypad: base.keypad,
            output: base.output,
        }
    }

    /// Overlay the values set in a TOML document
    pub fn merge_str(&mut self, contents: &str) -> Result<(), toml::de::Error> {
        let user: ConfigFile = toml::from_str(contents)?;
        merge_keypad(&mut self.keypad, user.keypad);
        merge_output(&mut self.output, user.output);
        Ok(())
    }

    pub fn instrument_settings(&self) -> InstrumentSettings {
        let fallback = InstrumentSettings::default();
        InstrumentSettings {
            debounce_ms: self.keypad.debounce_ms.unwrap_or(fallback.debounce_ms),
            default_scale_offset: self
                .keypad
                .default_scale_offset
                .unwrap_or(fallback.default_scale_offset)
                .min(MAX_SCALE_OFFSET),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.keypad.poll_interval_ms.unwrap_or(5).max(1))
    }

    pub fn volume(&self) -> f32 {
        self.output.volume.unwrap_or(0.2).clamp(0.0, 1.0)
    }

    pub fn midi_port(&self) -> Option<usize> {
        self.output.midi_port
    }

    pub fn chime(&self) -> Chime {
        Chime {
            notes: self.output.chime.clone().unwrap_or_default(),
            note_ms: self.output.chime_note_ms.unwrap_or(250),
        }
    }
}

fn merge_keypad(base: &mut KeypadConfig, user: KeypadConfig) {
    if user.debounce_ms.is_some() {
        base.debounce_ms = user.debounce_ms;
    }
    if user.default_scale_offset.is_some() {
        base.default_scale_offset = user.default_scale_offset;
    }
    if user.poll_interval_ms.is_some() {
        base.poll_interval_ms = user.poll_interval_ms;
    }
}

fn merge_output(base: &mut OutputConfig, user: OutputConfig) {
    if user.volume.is_some() {
        base.volume = user.volume;
    }
    if user.midi_port.is_some() {
        base.midi_port = user.midi_port;
    }
    if user.chime.is_some() {
        base.chime = user.chime;
    }
    if user.chime_note_ms.is_some() {
        base.chime_note_ms = user.chime_note_ms;
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("keytone").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults() {
        let config = Config::defaults();
        let settings = config.instrument_settings();
        assert_eq!(settings.debounce_ms, 10);
        assert_eq!(settings.default_scale_offset, 9);
        assert_eq!(config.poll_interval(), Duration::from_millis(5));
        assert_eq!(config.midi_port(), None);
        assert_eq!(config.chime().notes, vec!["c4", "e4", "g4"]);
        assert_eq!(config.chime().note_ms, 250);
    }

    #[test]
    fn test_user_values_override() {
        let mut config = Config::defaults();
        config
            .merge_str("[keypad]\ndefault_scale_offset = 30\n[output]\nmidi_port = 2\nchime = []\n")
            .unwrap();
        assert_eq!(config.instrument_settings().default_scale_offset, MAX_SCALE_OFFSET);
        assert_eq!(config.instrument_settings().debounce_ms, 10);
        assert_eq!(config.midi_port(), Some(2));
        assert!(config.chime().notes.is_empty());
    }

    #[test]
    fn test_malformed_override_is_rejected() {
        let mut config = Config::defaults();
        assert!(config.merge_str("[keypad]\ndebounce_ms = \"soon\"\n").is_err());
        assert_eq!(config.instrument_settings().debounce_ms, 10);
    }
}
