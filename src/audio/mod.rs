/// Tone output - the driver boundary and a square wave output using cpal
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::DeviceError;

/// Single-voice tone output. A frequency of 0 means silence.
pub trait ToneDriver {
    fn set_frequency(&mut self, hz: f32);
}

impl<D: ToneDriver + ?Sized> ToneDriver for Box<D> {
    fn set_frequency(&mut self, hz: f32) {
        (**self).set_frequency(hz);
    }
}

/// A missing device swallows every command
impl<D: ToneDriver> ToneDriver for Option<D> {
    fn set_frequency(&mut self, hz: f32) {
        if let Some(driver) = self {
            driver.set_frequency(hz);
        }
    }
}

/// Mirror every command to two outputs
impl<A: ToneDriver, B: ToneDriver> ToneDriver for (A, B) {
    fn set_frequency(&mut self, hz: f32) {
        self.0.set_frequency(hz);
        self.1.set_frequency(hz);
    }
}

pub struct AudioOutput {
    _stream: cpal::Stream,
    frequency: Arc<Mutex<f32>>,
}

impl AudioOutput {
    pub fn new(volume: f32) -> Result<Self, DeviceError> {
        let frequency = Arc::new(Mutex::new(0.0));
        let stream = Self::setup_audio_stream(Arc::clone(&frequency), volume.clamp(0.0, 1.0))?;

        Ok(Self {
            _stream: stream,
            frequency,
        })
    }

    fn setup_audio_stream(
        frequency: Arc<Mutex<f32>>,
        volume: f32,
    ) -> Result<cpal::Stream, DeviceError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(DeviceError::NoOutputDevice)?;
        let config = device.default_output_config()?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        let mut phase = 0.0_f32;

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let hz = *frequency.lock().unwrap_or_else(PoisonError::into_inner);

                    for frame in data.chunks_mut(channels) {
                        let value = if hz > 0.0 {
                            let sample = if phase < 0.5 { volume } else { -volume };
                            phase += hz / sample_rate;
                            if phase >= 1.0 {
                                phase -= 1.0;
                            }
                            sample
                        } else {
                            phase = 0.0;
                            0.0
                        };
                        for sample in frame.iter_mut() {
                            *sample = value;
                        }
                    }
                },
                |err| log::warn!(target: "audio", "audio stream error: {}", err),
                None,
            )?,
            other => return Err(DeviceError::UnsupportedFormat(format!("{:?}", other))),
        };

        stream.play()?;
        Ok(stream)
    }

    /// A sendable handle that drives this output
    pub fn handle(&self) -> ToneHandle {
        ToneHandle {
            frequency: Arc::clone(&self.frequency),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToneHandle {
    frequency: Arc<Mutex<f32>>,
}

impl ToneDriver for ToneHandle {
    fn set_frequency(&mut self, hz: f32) {
        *self.frequency.lock().unwrap_or_else(PoisonError::into_inner) = hz;
    }
}

/// Driver that keeps every command it receives. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct ToneLog {
    commands: Arc<Mutex<Vec<f32>>>,
}

impl ToneLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<f32> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<f32> {
        self.commands().last().copied()
    }

    pub fn clear(&self) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ToneDriver for ToneLog {
    fn set_frequency(&mut self, hz: f32) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hz);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_log_shares_commands() {
        let log = ToneLog::new();
        let mut driver = log.clone();
        driver.set_frequency(440.0);
        driver.set_frequency(0.0);
        assert_eq!(log.commands(), vec![440.0, 0.0]);
    }

    #[test]
    fn test_mirrored_and_missing_drivers() {
        let left = ToneLog::new();
        let right = ToneLog::new();
        let mut pair = (left.clone(), Some(right.clone()));
        pair.set_frequency(220.0);
        assert_eq!(left.last(), Some(220.0));
        assert_eq!(right.last(), Some(220.0));

        let mut absent: Option<ToneLog> = None;
        absent.set_frequency(220.0);
    }
}
