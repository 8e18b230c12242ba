//! App — event loop tying the controller, visualizer, and terminal together.
//!
//! Architecture:
//! - A `tokio::mpsc` channel carries terminal events in from a blocking
//!   reader task; element events arrive on their own channel.
//! - A frame interval drives dial animation and visualizer rendering.
//! - Key handling produces `Action`s; the app dispatches each one against
//!   the controller.

use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use wradio_core::{
    config::Config, ControllerState, ElementEvent, FrameClock, MonotonicClock, PipelineState,
    PlaybackController, SimulatedBackend, StatusLine, ThreadRngSource, Visualizer, VizFrame,
    VizSource,
};

use crate::action::Action;
use crate::components::{
    eq_bars::EqBars,
    scope_panel::ScopePanel,
    station_panel::{StationPanel, StationView},
    status_bar::{StatusBar, StatusView},
};
use crate::dial::StationDial;

enum AppMessage {
    Event(Event),
}

type Controller = PlaybackController<SimulatedBackend, ThreadRngSource>;

pub struct App {
    /// `None` when the catalog is empty; the UI then stays inert apart from
    /// the idle animation.
    controller: Option<Controller>,
    visualizer: Visualizer,
    dial: StationDial,
    clock: MonotonicClock,
    frame: VizFrame,
    empty_status: StatusLine,

    scope: ScopePanel,
    eq: EqBars,
    stations_panel: StationPanel,
    status_bar: StatusBar,

    frame_rate: u32,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, controller: Option<Controller>) -> Self {
        let station_count = controller.as_ref().map_or(0, |c| c.stations().len());
        Self {
            controller,
            visualizer: Visualizer::new(
                config.ui.scope_width,
                config.ui.scope_height,
                config.ui.eq_bar_count,
            ),
            dial: StationDial::new(station_count),
            clock: MonotonicClock::new(),
            frame: VizFrame::default(),
            empty_status: StatusLine::no_stations(),
            scope: ScopePanel::default(),
            eq: EqBars,
            stations_panel: StationPanel,
            status_bar: StatusBar,
            frame_rate: config.ui.frame_rate.clamp(1, 120),
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self, mut element_rx: mpsc::Receiver<ElementEvent>) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(256);

        // ── Background task: keyboard events ──────────────────────────────────
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Frame timer ───────────────────────────────────────────────────────
        let mut frame_tick =
            tokio::time::interval(Duration::from_millis(1000 / self.frame_rate as u64));
        frame_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(AppMessage::Event(ev)) = rx.recv() => {
                    if let Event::Key(key) = ev {
                        if let Some(action) = self.map_key(key) {
                            self.dispatch(action).await;
                            needs_redraw = true;
                        }
                    }
                }

                Some(ev) = element_rx.recv() => {
                    self.handle_element_event(ev).await;
                    needs_redraw = true;
                }

                _ = frame_tick.tick() => {
                    self.on_frame().await;
                    needs_redraw = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        info!("wradio exiting");
        Ok(())
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    fn map_key(&self, key: KeyEvent) -> Option<Action> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char(' ') | KeyCode::Char('p') => Some(Action::TogglePower),
            KeyCode::Char('n') => Some(Action::NextTrack),
            KeyCode::Char('s') => Some(Action::ToggleShuffle),
            KeyCode::Left => Some(Action::DialLeft),
            KeyCode::Right => Some(Action::DialRight),
            KeyCode::Up => Some(Action::VolumeDelta(5)),
            KeyCode::Down => Some(Action::VolumeDelta(-5)),
            KeyCode::Char('[') => Some(Action::ToneDelta(-5)),
            KeyCode::Char(']') => Some(Action::ToneDelta(5)),
            KeyCode::Char('e') => Some(Action::SimulateTrackError),
            KeyCode::Char(c @ '1'..='9') => {
                Some(Action::TuneTo(c as usize - '1' as usize))
            }
            _ => None,
        }
    }

    async fn dispatch(&mut self, action: Action) {
        if action == Action::Quit {
            self.should_quit = true;
            return;
        }
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        match action {
            Action::TogglePower => controller.toggle_power().await,
            Action::NextTrack => controller.next_track().await,
            Action::ToggleShuffle => {
                let shuffle = controller.toggle_shuffle();
                info!("shuffle {}", if shuffle { "on" } else { "off" });
            }
            Action::DialLeft => {
                let target = self.dial.preview_index().saturating_sub(1);
                self.dial.snap_to(target, &self.clock);
            }
            Action::DialRight => {
                let target = self.dial.preview_index() + 1;
                self.dial.snap_to(target, &self.clock);
            }
            Action::TuneTo(index) => {
                self.dial.snap_to(index, &self.clock);
            }
            Action::VolumeDelta(delta) => {
                let pct = step_pct(controller.pipeline().volume_pct(), delta);
                controller.set_volume(pct);
            }
            Action::ToneDelta(delta) => {
                let pct = step_pct(controller.pipeline().tone_pct(), delta);
                controller.set_tone(pct);
            }
            Action::SimulateTrackError => {
                controller.on_playback_failure("simulated failure").await;
            }
            Action::Quit => {}
        }
    }

    async fn handle_element_event(&mut self, ev: ElementEvent) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        match ev {
            ElementEvent::Ended => controller.on_track_ended().await,
            ElementEvent::Failed(reason) => controller.on_playback_failure(&reason).await,
        }
    }

    // ── Frame advance ─────────────────────────────────────────────────────────

    async fn on_frame(&mut self) {
        if let Some(committed) = self.dial.tick(&self.clock) {
            if let Some(controller) = self.controller.as_mut() {
                controller.set_station(committed).await;
            }
        }
        self.frame = self.render_frame();
    }

    /// Pick the render path from pipeline data availability and power state.
    fn render_frame(&mut self) -> VizFrame {
        let Some(controller) = self.controller.as_mut() else {
            return self.visualizer.render(VizSource::Idle);
        };

        let audible = controller.session().is_powered_on
            && controller.state() == ControllerState::Live;
        if !audible {
            return self.visualizer.render(VizSource::Idle);
        }

        if controller.pipeline().state() == PipelineState::GraphActive {
            let pipeline = controller.pipeline_mut();
            if let (Some(waveform), Some(frequency)) =
                (pipeline.sample_waveform(), pipeline.sample_frequency())
            {
                return self.visualizer.render(VizSource::Live {
                    waveform: &waveform,
                    frequency: &frequency,
                });
            }
        }

        self.visualizer.render(VizSource::Playing {
            elapsed_secs: self.clock.now().as_secs_f64(),
        })
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(2)])
            .split(frame.area());

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(outer[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(4)])
            .split(panels[1]);

        self.scope
            .draw(frame, panels[0], &self.frame, self.visualizer.size());
        self.eq.draw(frame, right[0], &self.frame.bars);

        match self.controller.as_ref() {
            Some(controller) => {
                let session = controller.session();
                let now_playing = session
                    .current_track
                    .as_ref()
                    .map(|t| t.display_title().to_string());
                self.stations_panel.draw(
                    frame,
                    right[1],
                    &StationView {
                        stations: controller.stations(),
                        dial_pos: self.dial.pos(),
                        preview_index: self.dial.preview_index(),
                        is_shuffle: session.is_shuffle,
                        now_playing: now_playing.as_deref(),
                    },
                );
                self.status_bar.draw(
                    frame,
                    outer[1],
                    &StatusView {
                        status: controller.status(),
                        helper: controller.helper(),
                        volume_pct: controller.pipeline().volume_pct(),
                        tone_pct: controller.pipeline().tone_pct(),
                        powered: session.is_powered_on,
                    },
                );
            }
            None => {
                self.status_bar.draw(
                    frame,
                    outer[1],
                    &StatusView {
                        status: &self.empty_status,
                        helper: Some("Add stations to stations.json and restart."),
                        volume_pct: 0,
                        tone_pct: 0,
                        powered: false,
                    },
                );
            }
        }
    }
}

fn step_pct(current: u8, delta: i8) -> u8 {
    (current as i16 + delta as i16).clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_stepping_saturates_at_both_ends() {
        assert_eq!(step_pct(98, 5), 100);
        assert_eq!(step_pct(3, -5), 0);
        assert_eq!(step_pct(50, 5), 55);
    }
}
