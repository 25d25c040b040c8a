use std::fmt;

/// Failure to open or talk to a tone output device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    NoOutputDevice,
    UnsupportedFormat(String),
    Stream(String),
    Midi(String),
    InvalidPort(usize),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NoOutputDevice => write!(f, "no audio output device"),
            DeviceError::UnsupportedFormat(format) => {
                write!(f, "unsupported sample format: {}", format)
            }
            DeviceError::Stream(e) => write!(f, "audio stream error: {}", e),
            DeviceError::Midi(e) => write!(f, "MIDI error: {}", e),
            DeviceError::InvalidPort(index) => write!(f, "invalid MIDI port index {}", index),
        }
    }
}

impl std::error::Error for DeviceError {}

impl From<cpal::BuildStreamError> for DeviceError {
    fn from(e: cpal::BuildStreamError) -> Self {
        DeviceError::Stream(e.to_string())
    }
}

impl From<cpal::PlayStreamError> for DeviceError {
    fn from(e: cpal::PlayStreamError) -> Self {
        DeviceError::Stream(e.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for DeviceError {
    fn from(e: cpal::DefaultStreamConfigError) -> Self {
        DeviceError::Stream(e.to_string())
    }
}
