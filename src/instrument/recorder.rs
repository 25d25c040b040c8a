/// Recorder - logs note intervals while in recording mode
use super::engine::ActiveTone;
use crate::keypad::PlayKey;

pub const DEFAULT_DEBOUNCE_MS: u64 = 10;

/// One closed interval: the tone that sounded (0 for silence) and how long
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub frequency: f32,
    pub offset_ms: u64,
}

pub type Sequence = Vec<Note>;

#[derive(Debug, Clone)]
pub struct Recorder {
    notes: Sequence,
    last_event_ms: u64,
    debounce_ms: u64,
}

impl Recorder {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            notes: Vec::new(),
            last_event_ms: 0,
            debounce_ms,
        }
    }

    /// Start a fresh take at `now_ms`
    pub fn reset(&mut self, now_ms: u64) {
        self.notes.clear();
        self.last_event_ms = now_ms;
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Hand over the recorded take, leaving the recorder empty
    pub fn take_sequence(&mut self) -> Sequence {
        std::mem::take(&mut self.notes)
    }

    /// Log a key edge. Must be called before the engine acts on the same edge
    /// so `sounding` still describes the interval being closed.
    pub fn record_transition(
        &mut self,
        key: PlayKey,
        pressed: bool,
        now_ms: u64,
        sounding: Option<&ActiveTone>,
    ) {
        let elapsed = now_ms.saturating_sub(self.last_event_ms);

        if pressed {
            // Presses faster than the debounce are dropped, not merged.
            let same_key = sounding.map(|t| t.key) == Some(key);
            if elapsed > self.debounce_ms && !same_key {
                let frequency = sounding.map_or(0.0, |t| t.frequency);
                self.push(frequency, elapsed, now_ms);
            }
        } else if let Some(tone) = sounding.filter(|t| t.key == key) {
            self.push(tone.frequency, elapsed, now_ms);
        }
    }

    fn push(&mut self, frequency: f32, offset_ms: u64, now_ms: u64) {
        self.notes.push(Note {
            frequency,
            offset_ms,
        });
        self.last_event_ms = now_ms;
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypad::Key;

    fn tone(label: char, frequency: f32) -> ActiveTone {
        ActiveTone {
            key: Key::from_label(label).and_then(Key::play_key).unwrap(),
            frequency,
        }
    }

    #[test]
    fn test_two_note_take() {
        let f1 = tone('1', 261.6256);
        let f2 = tone('3', 329.6276);
        let mut recorder = Recorder::default();
        recorder.reset(0);

        recorder.record_transition(f1.key, true, 0, None);
        recorder.record_transition(f1.key, false, 300, Some(&f1));
        recorder.record_transition(f2.key, true, 500, None);
        recorder.record_transition(f2.key, false, 800, Some(&f2));

        assert_eq!(
            recorder.notes(),
            &[
                Note { frequency: f1.frequency, offset_ms: 300 },
                Note { frequency: 0.0, offset_ms: 200 },
                Note { frequency: f2.frequency, offset_ms: 300 },
            ]
        );
        let total: u64 = recorder.notes().iter().map(|n| n.offset_ms).sum();
        assert_eq!(total, 800);
    }

    #[test]
    fn test_press_inside_debounce_is_dropped() {
        let a = tone('1', 220.0);
        let mut recorder = Recorder::default();
        recorder.reset(1000);
        recorder.record_transition(a.key, true, 1005, None);
        assert!(recorder.notes().is_empty());
    }

    #[test]
    fn test_press_closes_previous_tone() {
        let a = tone('1', 220.0);
        let b = tone('2', 246.9417);
        let mut recorder = Recorder::default();
        recorder.reset(0);
        recorder.record_transition(b.key, true, 400, Some(&a));
        assert_eq!(recorder.notes(), &[Note { frequency: 220.0, offset_ms: 400 }]);
    }

    #[test]
    fn test_stale_release_not_logged() {
        let a = tone('1', 220.0);
        let b = tone('2', 246.9417);
        let mut recorder = Recorder::default();
        recorder.reset(0);
        recorder.record_transition(a.key, false, 100, Some(&b));
        recorder.record_transition(a.key, false, 100, None);
        assert!(recorder.notes().is_empty());
    }

    #[test]
    fn test_take_and_reset() {
        let a = tone('1', 220.0);
        let mut recorder = Recorder::default();
        recorder.reset(0);
        recorder.record_transition(a.key, false, 50, Some(&a));
        assert_eq!(recorder.take_sequence().len(), 1);
        assert!(recorder.notes().is_empty());

        recorder.record_transition(a.key, false, 80, Some(&a));
        recorder.reset(90);
        assert!(recorder.notes().is_empty());
    }
}
