/// Play engine - maps key presses to tones on a single voice
use crate::audio::ToneDriver;
use crate::clock::Clock;
use crate::keypad::PlayKey;
use crate::midi::frequency_name;
use crate::tone_table;

/// The tone currently sounding and the key that started it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveTone {
    pub key: PlayKey,
    pub frequency: f32,
}

pub struct PlayEngine<D> {
    driver: D,
    active: Option<ActiveTone>,
    interrupted: bool,
}

impl<D: ToneDriver> PlayEngine<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            active: None,
            interrupted: false,
        }
    }

    pub fn active(&self) -> Option<&ActiveTone> {
        self.active.as_ref()
    }

    pub fn is_sounding(&self) -> bool {
        self.active.is_some()
    }

    /// Sound `key` in the current window. Any tone already sounding is
    /// replaced. Returns the frequency, or `None` if the step is off the table.
    pub fn press(&mut self, key: PlayKey, scale_offset: usize, modifier_held: bool) -> Option<f32> {
        let step = scale_offset + key.index();
        let Some(frequency) = tone_table::frequency_for(step, modifier_held) else {
            log::warn!(target: "engine", "step {} is outside the tone table", step);
            return None;
        };

        if modifier_held {
            self.interrupted = true;
        }
        self.active = Some(ActiveTone { key, frequency });
        log::debug!(target: "engine", "key {} -> {:.2} Hz ({})", key.label(), frequency, frequency_name(frequency));
        self.driver.set_frequency(frequency);
        Some(frequency)
    }

    /// Silence the output if `key` is the one sounding
    pub fn release(&mut self, key: PlayKey) {
        match self.active {
            Some(active) if active.key == key => self.mute(),
            _ => log::trace!(target: "engine", "ignoring stale release of {}", key.label()),
        }
    }

    /// Silence the output. Does nothing when already silent.
    pub fn mute(&mut self) {
        if self.active.take().is_some() {
            self.driver.set_frequency(0.0);
        }
    }

    /// Whether a sharped tone has been played since the last call
    pub fn take_interrupted(&mut self) -> bool {
        std::mem::take(&mut self.interrupted)
    }

    /// Sound a named note such as `"e4"` for `duration_ms`, then go quiet
    pub fn play_named<C: Clock>(&mut self, name: &str, duration_ms: u64, clock: &C) -> bool {
        let Some((step, sharp)) = tone_table::parse_note(name) else {
            log::warn!(target: "engine", "unknown note name {:?}", name);
            return false;
        };
        let Some(frequency) = tone_table::frequency_for(step, sharp) else {
            return false;
        };

        self.mute();
        self.driver.set_frequency(frequency);
        clock.sleep_ms(duration_ms);
        self.driver.set_frequency(0.0);
        true
    }

    pub(crate) fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ToneLog;
    use crate::clock::ManualClock;
    use crate::keypad::Key;
    use crate::tone_table::DEFAULT_SCALE_OFFSET;

    fn key(label: char) -> PlayKey {
        Key::from_label(label).and_then(Key::play_key).unwrap()
    }

    #[test]
    fn test_press_uses_window() {
        let log = ToneLog::new();
        let mut engine = PlayEngine::new(log.clone());
        let hz = engine.press(key('1'), DEFAULT_SCALE_OFFSET, false).unwrap();
        assert!((hz - 261.6256).abs() < 1e-3);
        assert_eq!(engine.active().unwrap().key, key('1'));
        assert_eq!(log.commands(), vec![hz]);
    }

    #[test]
    fn test_modifier_selects_sharp() {
        let mut engine = PlayEngine::new(ToneLog::new());
        let hz = engine.press(key('1'), DEFAULT_SCALE_OFFSET, true).unwrap();
        assert!((hz - 277.1826).abs() < 1e-3);
        assert!(engine.take_interrupted());
        assert!(!engine.take_interrupted());
    }

    #[test]
    fn test_single_voice() {
        let mut engine = PlayEngine::new(ToneLog::new());
        engine.press(key('1'), 0, false);
        engine.press(key('2'), 0, false);
        engine.press(key('3'), 0, false);
        assert_eq!(engine.active().unwrap().key, key('3'));
    }

    #[test]
    fn test_stale_release_keeps_tone() {
        let log = ToneLog::new();
        let mut engine = PlayEngine::new(log.clone());
        engine.press(key('4'), 0, false);
        let b = engine.press(key('5'), 0, false).unwrap();
        engine.release(key('4'));
        assert!(engine.is_sounding());
        assert_eq!(log.last(), Some(b));

        engine.release(key('5'));
        assert!(!engine.is_sounding());
        assert_eq!(log.last(), Some(0.0));
    }

    #[test]
    fn test_mute_is_idempotent() {
        let log = ToneLog::new();
        let mut engine = PlayEngine::new(log.clone());
        engine.press(key('9'), 0, false);
        engine.mute();
        engine.mute();
        engine.release(key('9'));
        assert_eq!(log.commands().len(), 2);
    }

    #[test]
    fn test_play_named() {
        let log = ToneLog::new();
        let clock = ManualClock::new();
        let mut engine = PlayEngine::new(log.clone());
        assert!(engine.play_named("a4", 250, &clock));
        assert!(!engine.play_named("z9", 250, &clock));
        assert_eq!(log.commands(), vec![440.0, 0.0]);
        assert_eq!(clock.now_ms(), 250);
    }
}
