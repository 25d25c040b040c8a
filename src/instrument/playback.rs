/// Song playback - replays a recorded take on the tone output
use super::recorder::Note;
use crate::audio::ToneDriver;
use crate::clock::Clock;

/// Play every note for its duration, then silence the output. Blocks
/// for the whole take.
pub fn replay<D, C>(notes: &[Note], driver: &mut D, clock: &C)
where
    D: ToneDriver + ?Sized,
    C: Clock + ?Sized,
{
    for note in notes {
        driver.set_frequency(note.frequency);
        clock.sleep_ms(note.offset_ms);
    }
    driver.set_frequency(0.0);
}

/// Total length of a take in milliseconds
pub fn duration_ms(notes: &[Note]) -> u64 {
    notes.iter().map(|n| n.offset_ms).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ToneLog;
    use crate::clock::ManualClock;

    #[test]
    fn test_replay_holds_each_note() {
        let notes = vec![
            Note { frequency: 261.6256, offset_ms: 300 },
            Note { frequency: 0.0, offset_ms: 200 },
            Note { frequency: 329.6276, offset_ms: 300 },
        ];
        let mut log = ToneLog::new();
        let clock = ManualClock::new();

        replay(&notes, &mut log, &clock);

        assert_eq!(log.commands(), vec![261.6256, 0.0, 329.6276, 0.0]);
        assert_eq!(clock.now_ms(), 800);
        assert_eq!(duration_ms(&notes), 800);
    }

    #[test]
    fn test_empty_take_still_silences() {
        let mut log = ToneLog::new();
        replay(&[], &mut log, &ManualClock::new());
        assert_eq!(log.commands(), vec![0.0]);
    }
}
