// src/gui.rs
use eframe::egui;
use egui::Color32;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use crate::canvas::GridCanvas;
use crate::config::ViewerConfig;
use crate::engine;
use crate::grid::{Axis, DimensionInput, GridLayout};
use crate::types::*;
use crate::visualizer;

const MAX_LOG_LINES: usize = 8;
// keep repainting for a while after each command so engine replies show up without input
const REPLY_POLL: Duration = Duration::from_millis(50);
const REPLY_WINDOW: Duration = Duration::from_secs(1);

pub struct GridViewerApp {
    // stream state
    streams: Vec<StreamInfo>,
    selected: usize,
    active_stream: Option<StreamInfo>,
    effective_rate_hz: f32,
    is_acquiring: bool,
    show_grid: bool,

    // grid
    canvas: GridCanvas,
    x_input: DimensionInput,
    y_input: DimensionInput,

    log_messages: Vec<String>,

    // engine plumbing
    rx: Receiver<EngineMessage>,
    tx_cmd: Sender<EngineCommand>,
    engine: Option<JoinHandle<()>>,
    poll_until: Option<Instant>,
}

impl GridViewerApp {
    pub fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let (columns, rows) = config.grid_dimensions()?;
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();
        let streams = config.streams.clone();
        let canvas = GridCanvas::new(
            GridLayout::new(columns, rows),
            config.refresh_rate_hz,
            config.activity_scale,
        );
        let engine = engine::spawn_thread(config, tx, rx_cmd)?;

        let mut app = Self {
            streams,
            selected: 0,
            active_stream: None,
            effective_rate_hz: 0.0,
            is_acquiring: false,
            show_grid: true,
            canvas,
            x_input: DimensionInput::new(columns),
            y_input: DimensionInput::new(rows),
            log_messages: vec!["Grid Viewer ready.".to_owned()],
            rx,
            tx_cmd,
            engine: Some(engine),
            poll_until: None,
        };
        app.request_stream(0);
        Ok(app)
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > MAX_LOG_LINES {
            self.log_messages.remove(0);
        }
    }

    fn send(&mut self, cmd: EngineCommand) {
        if self.tx_cmd.send(cmd).is_ok() {
            self.poll_until = Some(Instant::now() + REPLY_WINDOW);
        } else {
            let err = crate::drivers::GridViewerError::EngineDisconnected;
            log::error!("{err}");
            self.log(&err.to_string());
        }
    }

    // the selector only follows streams the engine has actually switched to
    fn request_stream(&mut self, index: usize) {
        if let Some(stream) = self.streams.get(index).cloned() {
            self.send(EngineCommand::SelectStream(stream));
        }
    }

    fn reply_poll(&mut self, now: Instant) -> Option<Duration> {
        match self.poll_until {
            Some(until) if now < until => Some(REPLY_POLL),
            _ => {
                self.poll_until = None;
                None
            }
        }
    }

    fn handle_message(&mut self, msg: EngineMessage) {
        match msg {
            EngineMessage::Log(s) => self.log(&s),
            EngineMessage::StreamChanged { stream, num_channels, effective_rate_hz, reader } => {
                self.canvas.update_data_stream(num_channels, reader);
                self.effective_rate_hz = effective_rate_hz;
                if let Some(i) = self.streams.iter().position(|s| s.id == stream.id) {
                    self.selected = i;
                }
                self.active_stream = Some(stream);
            }
            EngineMessage::Acquiring(on) => {
                self.is_acquiring = on;
                self.sync_animation();
            }
        }
    }

    // animation runs only while acquiring and the grid is visible
    fn sync_animation(&mut self) {
        let want = self.is_acquiring && self.show_grid;
        if want && !self.canvas.timer().is_running() {
            self.canvas.begin_animation(Instant::now());
        } else if !want && self.canvas.timer().is_running() {
            self.canvas.end_animation();
        }
    }

    fn commit_dimension(&mut self, axis: Axis) {
        let input = match axis {
            Axis::X => &mut self.x_input,
            Axis::Y => &mut self.y_input,
        };
        match input.commit() {
            Ok(Some(value)) => {
                self.canvas.set_dimension(axis, value);
            }
            Ok(None) => {}
            Err(err) => {
                log::warn!("Rejected grid dimension: {err}");
                self.log(&format!("Invalid {:?} dimension: {err}", axis));
            }
        }
    }

    fn stream_panel(&mut self, ui: &mut egui::Ui) {
        ui.label("STREAM");
        let mut pick = None;
        ui.add_enabled_ui(!self.is_acquiring, |ui| {
            let current = self
                .streams
                .get(self.selected)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "(none)".to_owned());
            egui::ComboBox::from_id_source("stream_select")
                .selected_text(current)
                .show_ui(ui, |ui| {
                    for (i, stream) in self.streams.iter().enumerate() {
                        if ui.selectable_label(i == self.selected, &stream.name).clicked() && i != self.selected {
                            pick = Some(i);
                        }
                    }
                });
        });
        if let Some(i) = pick {
            self.request_stream(i);
        }

        match &self.active_stream {
            Some(stream) => {
                ui.label(format!(
                    "Sample rate: {} Hz (displayed at {:.0} Hz)",
                    stream.sample_rate_hz, self.effective_rate_hz
                ));
                ui.label(format!("Channels: {} (showing {})", stream.channel_count, self.canvas.num_channels()));
            }
            None => {
                ui.label(egui::RichText::new("No stream").color(Color32::YELLOW).small());
            }
        }

        ui.add_space(10.0);
        let btn_txt = if self.is_acquiring { "⏹ STOP" } else { "▶ START" };
        if ui.add_enabled(self.active_stream.is_some(), egui::Button::new(btn_txt)).clicked() {
            if self.is_acquiring {
                self.send(EngineCommand::StopAcquisition);
            } else {
                self.send(EngineCommand::StartAcquisition);
            }
        }

        if ui.checkbox(&mut self.show_grid, "Show grid").changed() {
            self.sync_animation();
        }
    }
}

impl eframe::App for GridViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 1. engine messages
        while let Ok(msg) = self.rx.try_recv() {
            self.handle_message(msg);
        }

        // 2. render tick
        let now = Instant::now();
        self.canvas.tick(now);
        self.canvas.clear_dirty();
        if let Some(wait) = self.canvas.timer().time_until_next(now) {
            ctx.request_repaint_after(wait);
        }

        // 3. UI
        egui::SidePanel::left("controls").min_width(240.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("Grid Viewer");
            ui.label("Channel activity (peak-to-peak)");
            ui.separator();

            self.stream_panel(ui);

            ui.add_space(10.0);
            ui.separator();
            egui::ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
                for m in &self.log_messages {
                    ui.monospace(m);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let mut commit_x = false;
            let mut commit_y = false;
            ui.horizontal(|ui| {
                ui.label("X");
                let x = ui.add(egui::TextEdit::singleline(self.x_input.text_mut()).desired_width(40.0));
                commit_x = x.lost_focus();
                ui.label("Y");
                let y = ui.add(egui::TextEdit::singleline(self.y_input.text_mut()).desired_width(40.0));
                commit_y = y.lost_focus();
                ui.label(format!("{} cells", self.canvas.layout().cell_count()));
            });
            if commit_x {
                self.commit_dimension(Axis::X);
            }
            if commit_y {
                self.commit_dimension(Axis::Y);
            }

            ui.separator();
            if self.show_grid {
                egui::ScrollArea::both().show(ui, |ui| {
                    visualizer::draw_grid(ui, &self.canvas);
                });
            } else {
                ui.label("Grid hidden.");
            }
        });

        // 4. pick up replies to commands sent this frame
        if let Some(wait) = self.reply_poll(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
    }
}

impl Drop for GridViewerApp {
    fn drop(&mut self) {
        self.tx_cmd.send(EngineCommand::Shutdown).ok();
        if let Some(handle) = self.engine.take() {
            if handle.join().is_err() {
                log::error!("acquisition thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{ActivityAggregator, ActivityConfig};

    fn app() -> GridViewerApp {
        GridViewerApp::new(ViewerConfig::default()).unwrap()
    }

    fn changed(stream: &StreamInfo) -> EngineMessage {
        let config = ActivityConfig::new(stream.channel_count, 10).unwrap();
        EngineMessage::StreamChanged {
            stream: stream.clone(),
            num_channels: config.num_channels(),
            effective_rate_hz: 500.0,
            reader: ActivityAggregator::new(config).reader(),
        }
    }

    #[test]
    fn selector_follows_the_engine_not_the_click() {
        let mut app = app();
        app.request_stream(1);
        assert_eq!(app.selected, 0);

        let stream = app.streams[1].clone();
        app.handle_message(changed(&stream));
        assert_eq!(app.selected, 1);
        assert_eq!(app.active_stream.as_ref().map(|s| s.id), Some(stream.id));
        assert_eq!(app.effective_rate_hz, 500.0);
    }

    #[test]
    fn refused_switch_keeps_the_active_stream_selected() {
        let mut app = app();
        let first = app.streams[0].clone();
        app.handle_message(changed(&first));
        app.handle_message(EngineMessage::Acquiring(true));

        app.request_stream(2);
        app.handle_message(EngineMessage::Log("Stop acquisition before switching streams.".into()));
        assert_eq!(app.selected, 0);
        assert_eq!(app.active_stream.as_ref().map(|s| s.id), Some(first.id));
    }

    #[test]
    fn repaints_continue_after_a_command() {
        let mut app = app();
        let now = Instant::now();
        // initial stream selection is already in flight
        assert_eq!(app.reply_poll(now), Some(REPLY_POLL));
        assert_eq!(app.reply_poll(now + REPLY_WINDOW + REPLY_POLL), None);
        assert_eq!(app.reply_poll(now), None);

        app.send(EngineCommand::StopAcquisition);
        assert_eq!(app.reply_poll(Instant::now()), Some(REPLY_POLL));
    }
}
