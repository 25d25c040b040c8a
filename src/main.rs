#[cfg(feature = "gui")]
use eframe::egui;

#[cfg(feature = "gui")]
use keytone::{
    keypad::LAYOUT, AudioOutput, Config, ControlLoop, Instrument, MidiToneDriver, ModeKind,
    Report, SystemClock,
};

#[cfg(feature = "gui")]
const MAX_LOG_LINES: usize = 12;

#[cfg(feature = "gui")]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config::load();

    let audio = match AudioOutput::new(config.volume()) {
        Ok(audio) => Some(audio),
        Err(e) => {
            log::warn!("audio output unavailable: {}", e);
            None
        }
    };

    let midi = config.midi_port().and_then(|port| {
        let mut midi = MidiToneDriver::new();
        match midi.connect(port) {
            Ok(()) => Some(midi),
            Err(e) => {
                log::warn!(
                    "MIDI output unavailable: {} (ports: {:?})",
                    e,
                    MidiToneDriver::available_ports()
                );
                None
            }
        }
    });

    let driver = (audio.as_ref().map(AudioOutput::handle), midi);
    let instrument = Instrument::new(driver, SystemClock::new(), config.instrument_settings());
    let control = ControlLoop::start(instrument, config.poll_interval(), config.chime());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([320.0, 520.0])
            .with_title("Keytone"),
        ..Default::default()
    };

    eframe::run_native(
        "Keytone",
        options,
        Box::new(move |_cc| Ok(Box::new(KeypadApp::new(control, audio)))),
    )
    .map_err(|e| anyhow::anyhow!("application error: {}", e))
}

#[cfg(not(feature = "gui"))]
fn main() {
    eprintln!("This binary requires the 'gui' feature to be enabled");
    std::process::exit(1);
}

#[cfg(feature = "gui")]
struct KeypadApp {
    control: ControlLoop,
    // Keeps the stream alive; the control loop only holds a handle.
    _audio: Option<AudioOutput>,

    // UI state
    down: [bool; LAYOUT.len()],
    mode: ModeKind,
    messages: Vec<String>,
}

#[cfg(feature = "gui")]
impl KeypadApp {
    fn new(control: ControlLoop, audio: Option<AudioOutput>) -> Self {
        Self {
            control,
            _audio: audio,
            down: [false; LAYOUT.len()],
            mode: ModeKind::FreePlay,
            messages: Vec::new(),
        }
    }

    fn handle_reports(&mut self) {
        for report in self.control.poll_reports() {
            if let Report::ModeEntered(kind) = report {
                self.mode = kind;
            }
            self.messages.push(report.to_string());
        }
        if self.messages.len() > MAX_LOG_LINES {
            let excess = self.messages.len() - MAX_LOG_LINES;
            self.messages.drain(..excess);
        }
    }
}

/// Computer keyboard stand-ins for the keypad
#[cfg(feature = "gui")]
fn keyboard_key(label: char) -> Option<egui::Key> {
    use egui::Key;
    Some(match label {
        '0' => Key::Num0,
        '1' => Key::Num1,
        '2' => Key::Num2,
        '3' => Key::Num3,
        '4' => Key::Num4,
        '5' => Key::Num5,
        '6' => Key::Num6,
        '7' => Key::Num7,
        '8' => Key::Num8,
        '9' => Key::Num9,
        '*' => Key::Minus,
        '#' => Key::Equals,
        _ => return None,
    })
}

#[cfg(feature = "gui")]
impl eframe::App for KeypadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint();

        self.handle_reports();

        let keyboard = ctx.input(|i| {
            LAYOUT.map(|label| keyboard_key(label).map_or(false, |key| i.key_down(key)))
        });
        let mut pointer = [false; LAYOUT.len()];

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Keytone");
            ui.label(format!("Mode: {}", self.mode));
            ui.add_space(10.0);

            for (row, labels) in LAYOUT.chunks(3).enumerate() {
                ui.horizontal(|ui| {
                    for (col, label) in labels.iter().enumerate() {
                        let index = row * 3 + col;
                        let button = egui::Button::new(label.to_string())
                            .min_size(egui::vec2(90.0, 70.0))
                            .fill(if self.down[index] {
                                egui::Color32::from_rgb(100, 200, 100)
                            } else {
                                egui::Color32::from_rgb(40, 40, 40)
                            });
                        pointer[index] = ui.add(button).is_pointer_button_down_on();
                    }
                });
            }

            ui.separator();
            ui.label("Keys 0-9, '-' for * and '=' for #");
            ui.add_space(5.0);
            for message in &self.messages {
                ui.label(message);
            }
        });

        for (index, label) in LAYOUT.iter().enumerate() {
            let down = pointer[index] || keyboard[index];
            if down != self.down[index] {
                self.control.send_key(*label, down);
                self.down[index] = down;
            }
        }
    }
}
