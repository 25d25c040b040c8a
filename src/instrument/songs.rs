/// Song store - saved takes filed under short digit codes
use super::recorder::Sequence;

pub const MAX_CODE_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub code: String,
    pub sequence: Sequence,
}

/// Song code being typed in, capped at four digits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBuffer {
    digits: String,
}

impl CodeBuffer {
    /// Append a digit, dropping it once the buffer is full
    pub fn push(&mut self, digit: u8) -> bool {
        if self.digits.len() >= MAX_CODE_LEN || digit > 9 {
            return false;
        }
        self.digits.push(char::from(b'0' + digit));
        true
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }

    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.digits)
    }
}

/// Song number typed in song select. Song select starts each visit,
/// including the return from playback, with an empty selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SongSelector {
    value: u32,
}

impl SongSelector {
    pub fn push(&mut self, digit: u8) {
        // Digits that would overflow can never match a saved code anyway.
        if let Some(value) = self
            .value
            .checked_mul(10)
            .and_then(|v| v.checked_add(digit as u32))
        {
            self.value = value;
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn code(&self) -> String {
        self.value.to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SongStore {
    songs: Vec<Song>,
}

impl SongStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duplicate codes are kept; lookups return the oldest
    pub fn save(&mut self, code: String, sequence: Sequence) {
        self.songs.push(Song { code, sequence });
    }

    pub fn find(&self, code: &str) -> Option<&Song> {
        self.songs.iter().find(|song| song.code == code)
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::recorder::Note;

    fn take(frequency: f32) -> Sequence {
        vec![Note { frequency, offset_ms: 100 }]
    }

    #[test]
    fn test_save_and_find() {
        let mut store = SongStore::new();
        store.save("12".to_string(), take(220.0));
        assert_eq!(store.find("12").unwrap().sequence, take(220.0));
        assert!(store.find("99").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_codes_oldest_wins() {
        let mut store = SongStore::new();
        store.save("7".to_string(), take(220.0));
        store.save("7".to_string(), take(440.0));
        assert_eq!(store.len(), 2);
        assert_eq!(store.find("7").unwrap().sequence, take(220.0));
    }

    #[test]
    fn test_code_buffer_caps_length() {
        let mut code = CodeBuffer::default();
        for digit in [1, 2, 3, 4, 5, 6] {
            code.push(digit);
        }
        assert_eq!(code.as_str(), "1234");
        assert_eq!(code.take(), "1234");
        assert_eq!(code.as_str(), "");
    }

    #[test]
    fn test_selector_reads_left_to_right() {
        let mut selector = SongSelector::default();
        selector.push(1);
        selector.push(2);
        assert_eq!(selector.code(), "12");
        assert_eq!(selector.value(), 12);
    }

    #[test]
    fn test_selector_ignores_overflow() {
        let mut selector = SongSelector::default();
        for _ in 0..12 {
            selector.push(9);
        }
        assert_eq!(selector.value(), 999_999_999);
    }
}
