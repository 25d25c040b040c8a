/// Control loop - runs the instrument on its own thread and polls key edges
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{Instrument, Report};
use crate::audio::ToneDriver;
use crate::clock::Clock;
use crate::keypad::EventKeypad;

/// Notes played once when the loop starts
#[derive(Debug, Clone, Default)]
pub struct Chime {
    pub notes: Vec<String>,
    pub note_ms: u64,
}

pub struct ControlLoop {
    key_sender: Sender<(char, bool)>,
    report_receiver: Receiver<Report>,
    is_running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ControlLoop {
    pub fn start<D, C>(mut instrument: Instrument<D, C>, poll_interval: Duration, chime: Chime) -> Self
    where
        D: ToneDriver + Send + 'static,
        C: Clock + Send + 'static,
    {
        let (key_sender, key_receiver) = channel::<(char, bool)>();
        let (report_sender, report_receiver) = channel();
        let is_running = Arc::new(AtomicBool::new(true));
        let running = Arc::clone(&is_running);

        let handle = thread::spawn(move || {
            for note in &chime.notes {
                instrument.play_named(note, chime.note_ms);
            }

            let mut keypad = EventKeypad::new();
            while running.load(Ordering::SeqCst) {
                while let Ok((label, pressed)) = key_receiver.try_recv() {
                    keypad.push(label, pressed);
                }

                instrument.poll(&mut keypad);

                for report in instrument.drain_reports() {
                    let _ = report_sender.send(report);
                }

                thread::sleep(poll_interval);
            }

            instrument.mute();
            log::debug!(target: "runner", "control loop stopped");
        });

        Self {
            key_sender,
            report_receiver,
            is_running,
            handle: Some(handle),
        }
    }

    /// Queue a press (`true`) or release (`false`) of a keypad label
    pub fn send_key(&self, label: char, pressed: bool) {
        if self.key_sender.send((label, pressed)).is_err() {
            log::warn!(target: "runner", "control loop is gone, dropping key {}", label);
        }
    }

    pub fn poll_reports(&self) -> Vec<Report> {
        let mut reports = Vec::new();
        while let Ok(report) = self.report_receiver.try_recv() {
            reports.push(report);
        }
        reports
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Stop the loop and wait for the thread. A song that is playing
    /// finishes first.
    pub fn stop(&mut self) {
        self.is_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!(target: "runner", "control loop panicked");
            }
        }
    }
}

impl Drop for ControlLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
