/// Core instrument logic - the mode state machine that routes key events
/// to the play engine, recorder and song store
use std::collections::HashSet;
use std::fmt;

use crate::audio::ToneDriver;
use crate::clock::Clock;
use crate::keypad::{Key, KeySnapshot, KeySource, KeyState, PlayKey};
use crate::tone_table::{DEFAULT_SCALE_OFFSET, MAX_SCALE_OFFSET};

pub mod engine;
pub mod playback;
pub mod recorder;
pub mod runner;
pub mod songs;

use engine::PlayEngine;
use recorder::{Recorder, DEFAULT_DEBOUNCE_MS};
use songs::{CodeBuffer, SongSelector, SongStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    FreePlay,
    Recording,
    Saving,
    SongSelectWait,
    SongPlayback,
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModeKind::FreePlay => "play",
            ModeKind::Recording => "recording",
            ModeKind::Saving => "saving",
            ModeKind::SongSelectWait => "song select",
            ModeKind::SongPlayback => "song playback",
        };
        f.write_str(name)
    }
}

/// Active mode together with the data only that mode uses
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    FreePlay,
    Recording,
    Saving { code: CodeBuffer },
    SongSelectWait { selector: SongSelector },
    SongPlayback { code: String },
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::FreePlay => ModeKind::FreePlay,
            Mode::Recording => ModeKind::Recording,
            Mode::Saving { .. } => ModeKind::Saving,
            Mode::SongSelectWait { .. } => ModeKind::SongSelectWait,
            Mode::SongPlayback { .. } => ModeKind::SongPlayback,
        }
    }

    fn song_select() -> Self {
        Mode::SongSelectWait {
            selector: SongSelector::default(),
        }
    }
}

/// Tap tracking for the `0` key in free play and recording
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DualKeyState {
    #[default]
    Idle,
    WasPlaying,
    Switching,
}

/// Notifications for whoever is watching the instrument
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    ModeEntered(ModeKind),
    ScaleChanged(usize),
    SongSaved { code: String, notes: usize },
    SaveAbandoned,
    Playing { code: String },
    SongNotFound { code: String },
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::ModeEntered(kind) => write!(f, "Mode: {}", kind),
            Report::ScaleChanged(offset) => write!(f, "Scale offset: {}", offset),
            Report::SongSaved { code, notes } => write!(f, "Saved {} ({} notes)", code, notes),
            Report::SaveAbandoned => write!(f, "Save abandoned"),
            Report::Playing { code } => write!(f, "Playing: {}", code),
            Report::SongNotFound { code } => write!(f, "No song with code {}", code),
        }
    }
}

fn emit(reports: &mut Vec<Report>, report: Report) {
    log::info!(target: "instrument", "{}", report);
    reports.push(report);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrumentSettings {
    pub debounce_ms: u64,
    pub default_scale_offset: usize,
}

impl Default for InstrumentSettings {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            default_scale_offset: DEFAULT_SCALE_OFFSET,
        }
    }
}

pub struct Instrument<D, C> {
    mode: Mode,
    engine: PlayEngine<D>,
    recorder: Recorder,
    songs: SongStore,
    clock: C,
    scale_offset: usize,
    default_scale_offset: usize,
    dual_key: DualKeyState,
    // Keys that were down when the current mode was entered.
    held_at_entry: HashSet<Key>,
    reports: Vec<Report>,
}

impl<D: ToneDriver, C: Clock> Instrument<D, C> {
    pub fn new(driver: D, clock: C, settings: InstrumentSettings) -> Self {
        let default_scale_offset = settings.default_scale_offset.min(MAX_SCALE_OFFSET);

        Self {
            mode: Mode::FreePlay,
            engine: PlayEngine::new(driver),
            recorder: Recorder::new(settings.debounce_ms),
            songs: SongStore::new(),
            clock,
            scale_offset: default_scale_offset,
            default_scale_offset,
            dual_key: DualKeyState::Idle,
            held_at_entry: HashSet::new(),
            reports: Vec::new(),
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn scale_offset(&self) -> usize {
        self.scale_offset
    }

    pub fn dual_key_state(&self) -> DualKeyState {
        self.dual_key
    }

    pub fn engine(&self) -> &PlayEngine<D> {
        &self.engine
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn songs(&self) -> &SongStore {
        &self.songs
    }

    pub fn drain_reports(&mut self) -> Vec<Report> {
        std::mem::take(&mut self.reports)
    }

    /// Sound a named note for `duration_ms`; blocks like playback does
    pub fn play_named(&mut self, name: &str, duration_ms: u64) -> bool {
        self.engine.play_named(name, duration_ms, &self.clock)
    }

    pub fn mute(&mut self) {
        self.engine.mute();
    }

    /// Run one control cycle against a key source
    pub fn poll<S: KeySource + ?Sized>(&mut self, source: &mut S) {
        let keys = source.scan();
        self.handle_keys(&keys);
    }

    /// Dispatch the changed keys of one scan. A mode change drops the rest
    /// of the scan.
    pub fn handle_keys(&mut self, keys: &[KeySnapshot]) {
        let modifier_held = keys
            .iter()
            .any(|k| k.is_down() && Key::from_label(k.label) == Some(Key::MODIFIER));

        for snapshot in keys.iter().filter(|k| k.changed) {
            let Some(key) = Key::from_label(snapshot.label) else {
                log::trace!(target: "instrument", "ignoring unknown key {:?}", snapshot.label);
                continue;
            };
            let released = snapshot.state == KeyState::Released;

            // A key held through a mode change is spent until pressed again.
            if self.held_at_entry.remove(&key) && released {
                log::trace!(target: "instrument", "ignoring release of {} held across mode change", key.label());
                continue;
            }

            let next = match self.mode.kind() {
                ModeKind::FreePlay | ModeKind::Recording => {
                    self.handle_play_mode_key(key, snapshot.state, modifier_held)
                }
                ModeKind::Saving if released => self.handle_saving_key(key),
                ModeKind::SongSelectWait if released => self.handle_select_key(key),
                _ => None,
            };

            if let Some(next) = next {
                self.enter(next);
                self.held_at_entry = keys
                    .iter()
                    .filter(|k| k.is_down())
                    .filter_map(|k| Key::from_label(k.label))
                    .collect();
                break;
            }
        }
    }

    fn enter(&mut self, next: Mode) {
        self.engine.mute();
        match next {
            Mode::FreePlay => {
                self.scale_offset = self.default_scale_offset;
                self.dual_key = DualKeyState::Idle;
            }
            Mode::Recording => {
                self.recorder.reset(self.clock.now_ms());
                self.dual_key = DualKeyState::Idle;
            }
            Mode::Saving { .. } | Mode::SongSelectWait { .. } | Mode::SongPlayback { .. } => {}
        }
        let kind = next.kind();
        self.mode = next;
        emit(&mut self.reports, Report::ModeEntered(kind));
    }

    fn handle_play_mode_key(
        &mut self,
        key: Key,
        state: KeyState,
        modifier_held: bool,
    ) -> Option<Mode> {
        // Any other key between taps of `0` cancels a pending switch.
        if key != Key::MODIFIER && self.dual_key == DualKeyState::Switching {
            self.dual_key = DualKeyState::Idle;
        }

        match key {
            Key::MODIFIER => return self.handle_dual_key(state),
            Key::Star | Key::Hash => {
                if state == KeyState::Released {
                    self.shift_scale(key == Key::Hash);
                }
            }
            _ => {
                if let Some(play_key) = key.play_key() {
                    self.handle_tone_key(play_key, state, modifier_held);
                }
            }
        }
        None
    }

    fn handle_dual_key(&mut self, state: KeyState) -> Option<Mode> {
        match state {
            KeyState::Pressed => {
                if self.engine.is_sounding() {
                    self.dual_key = DualKeyState::WasPlaying;
                }
                None
            }
            KeyState::Released => match self.dual_key {
                DualKeyState::WasPlaying => {
                    self.dual_key = DualKeyState::Idle;
                    None
                }
                DualKeyState::Idle => {
                    self.dual_key = DualKeyState::Switching;
                    None
                }
                DualKeyState::Switching => {
                    self.dual_key = DualKeyState::Idle;
                    match self.mode {
                        Mode::Recording => Some(Mode::Saving {
                            code: CodeBuffer::default(),
                        }),
                        _ => Some(Mode::song_select()),
                    }
                }
            },
            KeyState::Held | KeyState::Idle => None,
        }
    }

    fn shift_scale(&mut self, up: bool) {
        let next = if up {
            (self.scale_offset < MAX_SCALE_OFFSET).then(|| self.scale_offset + 1)
        } else {
            self.scale_offset.checked_sub(1)
        };
        if let Some(offset) = next {
            self.scale_offset = offset;
            emit(&mut self.reports, Report::ScaleChanged(offset));
        }
    }

    fn handle_tone_key(&mut self, key: PlayKey, state: KeyState, modifier_held: bool) {
        let pressed = match state {
            KeyState::Pressed => true,
            KeyState::Released => false,
            KeyState::Held | KeyState::Idle => return,
        };

        if self.mode == Mode::Recording {
            let now = self.clock.now_ms();
            self.recorder
                .record_transition(key, pressed, now, self.engine.active());
        }

        if pressed {
            self.engine.press(key, self.scale_offset, modifier_held);
            if self.engine.take_interrupted() {
                self.dual_key = DualKeyState::WasPlaying;
            }
        } else {
            self.engine.release(key);
        }
    }

    fn handle_saving_key(&mut self, key: Key) -> Option<Mode> {
        let Mode::Saving { code } = &mut self.mode else {
            return None;
        };

        if key == Key::Star {
            let code = code.take();
            let sequence = self.recorder.take_sequence();
            let notes = sequence.len();
            self.songs.save(code.clone(), sequence);
            emit(&mut self.reports, Report::SongSaved { code, notes });
            return Some(Mode::song_select());
        }

        match key.code_digit() {
            Some(digit) => {
                if !code.push(digit) {
                    log::trace!(target: "instrument", "code full, dropping {}", digit);
                }
                None
            }
            None => {
                emit(&mut self.reports, Report::SaveAbandoned);
                Some(Mode::song_select())
            }
        }
    }

    fn handle_select_key(&mut self, key: Key) -> Option<Mode> {
        match key {
            Key::MODIFIER => Some(Mode::FreePlay),
            Key::Star => Some(Mode::Recording),
            Key::Hash => {
                self.play_selected();
                Some(Mode::song_select())
            }
            _ => {
                if let (Some(digit), Mode::SongSelectWait { selector }) =
                    (key.code_digit(), &mut self.mode)
                {
                    selector.push(digit);
                }
                None
            }
        }
    }

    fn play_selected(&mut self) {
        let Mode::SongSelectWait { selector } = &mut self.mode else {
            return;
        };
        let code = selector.code();

        self.enter(Mode::SongPlayback { code: code.clone() });

        match self.songs.find(&code) {
            Some(song) => {
                emit(&mut self.reports, Report::Playing { code });
                log::debug!(
                    target: "instrument",
                    "replaying {} notes over {} ms",
                    song.sequence.len(),
                    playback::duration_ms(&song.sequence)
                );
                playback::replay(&song.sequence, self.engine.driver_mut(), &self.clock);
            }
            None => emit(&mut self.reports, Report::SongNotFound { code }),
        }
    }
}
