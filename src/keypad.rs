/// Keypad labels and the key event source boundary
use std::collections::VecDeque;

/// Labels in scan order, row by row
pub const LAYOUT: [char; 12] = ['1', '2', '3', '4', '5', '6', '7', '8', '9', '*', '0', '#'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Digit(u8),
    Star,
    Hash,
}

impl Key {
    pub const MODIFIER: Key = Key::Digit(0);

    pub fn from_label(label: char) -> Option<Self> {
        match label {
            '*' => Some(Key::Star),
            '#' => Some(Key::Hash),
            c => c.to_digit(10).map(|d| Key::Digit(d as u8)),
        }
    }

    pub fn label(self) -> char {
        match self {
            Key::Digit(d) => char::from(b'0' + d),
            Key::Star => '*',
            Key::Hash => '#',
        }
    }

    /// The tone key for `1`..`9`
    pub fn play_key(self) -> Option<PlayKey> {
        match self {
            Key::Digit(d @ 1..=9) => Some(PlayKey(d - 1)),
            _ => None,
        }
    }

    /// Digit usable in a song code (`1`..`9`)
    pub fn code_digit(self) -> Option<u8> {
        match self {
            Key::Digit(d @ 1..=9) => Some(d),
            _ => None,
        }
    }
}

/// One of the nine tone keys, stored as its zero-based position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayKey(u8);

impl PlayKey {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn label(self) -> char {
        char::from(b'1' + self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Idle,
    Pressed,
    Held,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySnapshot {
    pub label: char,
    pub state: KeyState,
    pub changed: bool,
}

impl KeySnapshot {
    pub fn is_down(&self) -> bool {
        matches!(self.state, KeyState::Pressed | KeyState::Held)
    }
}

/// Anything that can be scanned once per control cycle
pub trait KeySource {
    fn scan(&mut self) -> Vec<KeySnapshot>;
}

/// Turns press/release edges into per-scan key snapshots
#[derive(Debug, Default)]
pub struct EventKeypad {
    keys: Vec<KeySnapshot>,
    pending: VecDeque<(char, bool)>,
}

impl EventKeypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: char, pressed: bool) {
        self.pending.push_back((label, pressed));
    }

    fn slot(&mut self, label: char) -> &mut KeySnapshot {
        let index = match self.keys.iter().position(|k| k.label == label) {
            Some(index) => index,
            None => {
                self.keys.push(KeySnapshot {
                    label,
                    state: KeyState::Idle,
                    changed: false,
                });
                self.keys.len() - 1
            }
        };
        &mut self.keys[index]
    }
}

impl KeySource for EventKeypad {
    fn scan(&mut self) -> Vec<KeySnapshot> {
        for key in &mut self.keys {
            key.changed = false;
            key.state = match key.state {
                KeyState::Pressed | KeyState::Held => KeyState::Held,
                KeyState::Released | KeyState::Idle => KeyState::Idle,
            };
        }

        // One edge per key per scan, the rest wait for the next one.
        let mut deferred = VecDeque::new();
        while let Some((label, pressed)) = self.pending.pop_front() {
            let key = self.slot(label);
            if key.changed {
                deferred.push_back((label, pressed));
                continue;
            }
            let next = if pressed { KeyState::Pressed } else { KeyState::Released };
            let was_down = key.is_down();
            if pressed != was_down {
                key.state = next;
                key.changed = true;
            }
        }
        self.pending = deferred;

        self.keys.clone()
    }
}
