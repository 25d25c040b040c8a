//! Fixed tone table - natural and sharped frequencies from A2 to G5
//!
//! Step 0 is A2 and each following step is the next natural note. The sharp
//! table holds the note one semitone above the natural at the same step.

pub const TONE_COUNT: usize = 21;
pub const PLAY_KEYS: usize = 9;

/// Largest scale offset that still keeps all play keys inside the table
pub const MAX_SCALE_OFFSET: usize = TONE_COUNT - PLAY_KEYS;

/// Scale offset that maps key 1 to C4
pub const DEFAULT_SCALE_OFFSET: usize = 9;

const NATURAL_TONES: [f32; TONE_COUNT] = [
    110.0, 123.4708, 130.8128, 146.8324, 164.8138, 174.6141, 195.9977,
    220.0, 246.9417, 261.6256, 293.6648, 329.6276, 349.2282, 391.9954,
    440.0, 493.8833, 523.2511, 587.3295, 659.2551, 698.4565, 783.9909,
];

const SHARP_TONES: [f32; TONE_COUNT] = [
    116.5409, 130.8128, 138.5913, 155.5635, 174.6141, 184.9972, 207.6523,
    233.0819, 261.6256, 277.1826, 311.127, 349.2282, 369.9944, 415.3047,
    466.1638, 523.2511, 554.3653, 622.254, 698.4565, 739.9888, 830.6094,
];

// Position of each letter inside an octave starting at C.
const LETTERS: [char; 7] = ['c', 'd', 'e', 'f', 'g', 'a', 'b'];

// Step of C3; A2 and B2 sit below it.
const C3_STEP: i32 = 2;

/// Frequency for a table step, or `None` when the step is outside the table
pub fn frequency_for(step: usize, sharp: bool) -> Option<f32> {
    let table = if sharp { &SHARP_TONES } else { &NATURAL_TONES };
    table.get(step).copied()
}

/// Parse a note name such as `"c4"` or `"f#3"` into its table step and
/// whether it is sharped. Names outside A2..G5 are rejected.
pub fn parse_note(name: &str) -> Option<(usize, bool)> {
    let mut chars = name.trim().chars();
    let letter = chars.next()?.to_ascii_lowercase();
    let position = LETTERS.iter().position(|&l| l == letter)? as i32;

    let rest: String = chars.collect();
    let (sharp, octave) = match rest.strip_prefix('#') {
        Some(octave) => (true, octave),
        None => (false, rest.as_str()),
    };
    let octave: i32 = octave.parse().ok()?;
    if !(2..=5).contains(&octave) {
        return None;
    }

    let step = C3_STEP + (octave - 3) * LETTERS.len() as i32 + position;
    if step < 0 || step as usize >= TONE_COUNT {
        return None;
    }
    Some((step as usize, sharp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_window_stays_in_table() {
        for offset in 0..=MAX_SCALE_OFFSET {
            for key in 0..PLAY_KEYS {
                assert!(frequency_for(offset + key, false).is_some());
                assert!(frequency_for(offset + key, true).is_some());
            }
        }
        assert!(frequency_for(TONE_COUNT, false).is_none());
    }

    #[test]
    fn test_default_offset_is_middle_c() {
        let c4 = frequency_for(DEFAULT_SCALE_OFFSET, false).unwrap();
        assert!((c4 - 261.6256).abs() < 1e-3);
    }

    #[test]
    fn test_sharp_is_above_natural() {
        for step in 0..TONE_COUNT {
            assert!(frequency_for(step, true).unwrap() > frequency_for(step, false).unwrap());
        }
    }

    #[test]
    fn test_parse_note() {
        assert_eq!(parse_note("a2"), Some((0, false)));
        assert_eq!(parse_note("C4"), Some((DEFAULT_SCALE_OFFSET, false)));
        assert_eq!(parse_note("a4"), Some((14, false)));
        assert_eq!(parse_note("f#3"), Some((5, true)));
        assert_eq!(parse_note("g5"), Some((20, false)));
        assert_eq!(parse_note("a5"), None);
        assert_eq!(parse_note("g2"), None);
        assert_eq!(parse_note("h4"), None);
        assert_eq!(parse_note("c"), None);
    }

    #[test]
    fn test_parse_note_rejects_far_octaves() {
        assert_eq!(parse_note("c999999999"), None);
        assert_eq!(parse_note("c-999999999"), None);
        assert_eq!(parse_note("c99999999999"), None);
        assert_eq!(parse_note("c6"), None);
    }
}
