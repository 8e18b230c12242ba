//! Playback controller — the state machine orchestrating power, station
//! changes, natural advancement, and bounded error recovery.  This is the
//! only component that mutates cross-cutting session state.

use tracing::{info, warn};

use crate::catalog::{Station, Track};
use crate::pipeline::{AudioBackend, AudioPipeline, PlaybackError};
use crate::selector::{RandomSource, SelectionMode, TrackSelector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    PoweredOff,
    /// A play attempt is in flight.
    Starting,
    /// Playback is running.
    Live,
    /// A runtime failure is being absorbed by the skip policy.
    RecoveringError,
}

/// Lower/upper bounds on the consecutive-failure skip budget.
const MIN_SKIPS: u32 = 2;
const MAX_SKIPS: u32 = 6;

/// Cross-cutting session state owned by the controller.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub station_index: usize,
    pub current_track: Option<Track>,
    pub is_shuffle: bool,
    pub is_powered_on: bool,
    pub consecutive_errors: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Idle,
    Live,
    Warn,
}

/// One-line status surface plus an optional helper line, consumed by the UI.
#[derive(Debug, Clone)]
pub struct StatusLine {
    pub text: String,
    pub level: StatusLevel,
}

impl StatusLine {
    fn idle(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: StatusLevel::Idle,
        }
    }

    fn live(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: StatusLevel::Live,
        }
    }

    fn warn(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: StatusLevel::Warn,
        }
    }

    /// Status shown when the catalog is empty and no controller exists.
    pub fn no_stations() -> Self {
        Self::warn("No stations available.")
    }
}

pub struct PlaybackController<B: AudioBackend, R: RandomSource> {
    stations: Vec<Station>,
    selector: TrackSelector<R>,
    pipeline: AudioPipeline<B>,
    session: PlaybackSession,
    state: ControllerState,
    /// Generation token: a completion observed after a supersede (power-off,
    /// station change) must not mutate session state.
    attempt: u64,
    status: StatusLine,
    helper: Option<String>,
}

impl<B: AudioBackend, R: RandomSource> PlaybackController<B, R> {
    /// Stations must be non-empty — with zero stations the core stays inert
    /// and the controller is never constructed.
    pub fn new(
        stations: Vec<Station>,
        selector: TrackSelector<R>,
        pipeline: AudioPipeline<B>,
    ) -> Self {
        assert!(
            !stations.is_empty(),
            "PlaybackController requires at least one station"
        );
        let status = StatusLine::idle(format!("Ready: {} stations loaded.", stations.len()));
        Self {
            stations,
            selector,
            pipeline,
            session: PlaybackSession {
                station_index: 0,
                current_track: None,
                is_shuffle: true,
                is_powered_on: false,
                consecutive_errors: 0,
            },
            state: ControllerState::PoweredOff,
            attempt: 0,
            status,
            helper: Some("Press Power On to start the receiver.".to_string()),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn helper(&self) -> Option<&str> {
        self.helper.as_deref()
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn current_station(&self) -> &Station {
        &self.stations[self.session.station_index]
    }

    pub fn pipeline(&self) -> &AudioPipeline<B> {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut AudioPipeline<B> {
        &mut self.pipeline
    }

    fn selection_mode(&self) -> SelectionMode {
        if self.session.is_shuffle {
            SelectionMode::Shuffle
        } else {
            SelectionMode::Sequential
        }
    }

    // ── User actions ──────────────────────────────────────────────────────────

    /// Power toggle.  Off → on resumes the current track if one is loaded,
    /// otherwise starts selection; on → off pauses without teardown so the
    /// same element resumes later.
    pub async fn toggle_power(&mut self) {
        if self.session.is_powered_on {
            self.attempt += 1; // supersede any in-flight start
            self.pipeline.pause();
            self.session.is_powered_on = false;
            self.state = ControllerState::PoweredOff;
            self.status = StatusLine::idle("Paused.");
            return;
        }

        if self.session.current_track.is_none() {
            self.play_from_current_station().await;
            return;
        }

        self.state = ControllerState::Starting;
        match self.pipeline.resume().await {
            Ok(()) => {
                self.session.is_powered_on = true;
                self.session.consecutive_errors = 0;
                self.state = ControllerState::Live;
                self.status = StatusLine::live(format!("Live: {}", self.current_station().name));
            }
            Err(err) => {
                warn!("resume refused: {err}");
                self.state = ControllerState::PoweredOff;
                self.status = StatusLine::warn("Unable to start playback.");
            }
        }
    }

    /// User "next": re-select on the current station and start playing.
    pub async fn next_track(&mut self) {
        self.play_from_current_station().await;
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.session.is_shuffle = !self.session.is_shuffle;
        self.session.is_shuffle
    }

    /// Station navigation.  Clamps the index and only starts playback when
    /// already powered on; while off it updates the displayed selection only.
    pub async fn set_station(&mut self, index: usize) {
        let clamped = index.min(self.stations.len() - 1);
        self.session.station_index = clamped;
        if self.session.is_powered_on {
            self.play_from_current_station().await;
        } else {
            let name = self.current_station().name.clone();
            self.status = StatusLine::idle(format!("{name} selected. Press Power On."));
        }
    }

    pub fn set_volume(&mut self, pct: u8) {
        self.pipeline.set_volume(pct);
    }

    pub fn set_tone(&mut self, pct: u8) {
        self.pipeline.set_tone(pct);
    }

    // ── Element events ────────────────────────────────────────────────────────

    /// Natural end of track: auto-advance on the current station.
    pub async fn on_track_ended(&mut self) {
        if self.state != ControllerState::Live {
            return;
        }
        self.play_from_current_station().await;
    }

    /// Runtime playback failure.  Feeds the bounded skip policy: retry with a
    /// fresh selection until the per-station budget is exhausted, then power
    /// off with a persistent warning.
    pub async fn on_playback_failure(&mut self, reason: &str) {
        if !matches!(self.state, ControllerState::Live | ControllerState::Starting) {
            return;
        }
        if self.absorb_failure(reason) {
            self.play_from_current_station().await;
        }
    }

    /// Count one failure against the station budget.  Returns true when a
    /// retry is still allowed, false when the budget is spent and the
    /// controller has powered off.
    fn absorb_failure(&mut self, reason: &str) -> bool {
        self.session.consecutive_errors += 1;
        self.state = ControllerState::RecoveringError;
        warn!(
            "playback failure #{} on '{}': {reason}",
            self.session.consecutive_errors,
            self.current_station().name
        );

        if self.session.consecutive_errors >= self.max_skips() {
            self.attempt += 1;
            self.pipeline.stop();
            self.session.is_powered_on = false;
            self.state = ControllerState::PoweredOff;
            self.status = StatusLine::warn("Playback failed repeatedly for this station.");
            // Tracks resolve but refuse to play: points away from the network.
            self.helper = Some(
                "Tracks are reachable, so this is likely a playback or cross-origin \
                 restriction. Try another station or power on again."
                    .to_string(),
            );
            return false;
        }

        self.status = StatusLine::warn("Track failed to play. Scanning next...");
        true
    }

    /// Consecutive-failure budget for the current station:
    /// `clamp(validTrackCount, 2, 6)`.
    pub fn max_skips(&self) -> u32 {
        (self.current_station().valid_track_count() as u32).clamp(MIN_SKIPS, MAX_SKIPS)
    }

    // ── Core start path ───────────────────────────────────────────────────────

    async fn play_from_current_station(&mut self) {
        self.attempt += 1;
        let token = self.attempt;

        loop {
            self.state = ControllerState::Starting;
            let station = self.current_station().clone();
            let mode = self.selection_mode();
            let Some(track) = self.selector.select_next(&station, mode) else {
                // Soft condition: status only, history untouched, no error count.
                self.status = StatusLine::warn("No valid tracks in this station.");
                self.helper = Some(format!("{} has no valid URLs yet.", station.name));
                self.state = if self.session.is_powered_on {
                    ControllerState::Live
                } else {
                    ControllerState::PoweredOff
                };
                return;
            };

            info!("starting '{}' on {}", track.display_title(), station.name);
            self.session.current_track = Some(track.clone());

            let outcome = self.pipeline.play(&track).await;
            if token != self.attempt {
                // Superseded while suspended: a late success must not
                // resurrect the old track, and a late failure must not flip
                // state.
                self.pipeline.stop();
                return;
            }

            match outcome {
                Ok(()) => {
                    self.session.consecutive_errors = 0;
                    self.session.is_powered_on = true;
                    self.state = ControllerState::Live;
                    self.status = StatusLine::live(format!("Live: {}", station.name));
                    if self.pipeline.sample_waveform().is_none() {
                        self.helper = Some(
                            "Audio graph unavailable for this track source. Using fallback visuals."
                                .to_string(),
                        );
                    } else {
                        self.helper = None;
                    }
                    return;
                }
                Err(PlaybackError::Blocked(reason)) => {
                    // No automatic retry: restarting requires explicit user
                    // action.
                    warn!("playback blocked: {reason}");
                    self.session.is_powered_on = false;
                    self.state = ControllerState::PoweredOff;
                    self.status = StatusLine::warn("Click Power On to start audio.");
                    self.helper = Some(
                        "Playback was blocked before it could start. Press Power On again."
                            .to_string(),
                    );
                    return;
                }
                Err(PlaybackError::Failed(reason)) => {
                    if !self.absorb_failure(&reason) {
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{AnalysisGraph, GraphBuildError};
    use crate::selector::SeededSource;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct NullGraph;

    impl AnalysisGraph for NullGraph {
        fn set_gain(&mut self, _gain: f32) {}
        fn set_cutoff_hz(&mut self, _hz: f32) {}
        fn waveform(&mut self) -> Vec<u8> {
            vec![128; 16]
        }
        fn frequency(&mut self) -> Vec<u8> {
            vec![0; 8]
        }
    }

    /// Element whose play outcomes follow a script shared with the test.
    #[derive(Clone, Default)]
    struct ScriptedBackend {
        script: Rc<RefCell<Vec<Result<(), PlaybackError>>>>,
        played_urls: Rc<RefCell<Vec<String>>>,
        source: Rc<RefCell<Option<String>>>,
        graph_fails: bool,
    }

    impl AudioBackend for ScriptedBackend {
        type Graph = NullGraph;

        fn set_source(&mut self, url: &str) {
            *self.source.borrow_mut() = Some(url.to_string());
        }
        async fn play(&mut self) -> Result<(), PlaybackError> {
            if let Some(url) = self.source.borrow().clone() {
                self.played_urls.borrow_mut().push(url);
            }
            let mut script = self.script.borrow_mut();
            if script.is_empty() {
                Ok(())
            } else {
                script.remove(0)
            }
        }
        fn pause(&mut self) {}
        fn set_element_volume(&mut self, _volume: f32) {}
        fn build_graph(&mut self) -> Result<Self::Graph, GraphBuildError> {
            if self.graph_fails {
                Err(GraphBuildError("blocked".into()))
            } else {
                Ok(NullGraph)
            }
        }
    }

    fn station(id: &str, urls: &[&str]) -> Station {
        Station {
            id: id.to_string(),
            name: format!("Station {id}"),
            tracks: urls
                .iter()
                .map(|u| Track {
                    title: None,
                    url: u.to_string(),
                })
                .collect(),
        }
    }

    fn controller(
        stations: Vec<Station>,
        backend: ScriptedBackend,
    ) -> PlaybackController<ScriptedBackend, SeededSource> {
        PlaybackController::new(
            stations,
            TrackSelector::new(SeededSource::new(9)),
            AudioPipeline::new(backend),
        )
    }

    #[tokio::test]
    async fn power_on_starts_playback_and_goes_live() {
        let be = ScriptedBackend::default();
        let mut c = controller(vec![station("a", &["https://a/0", "https://a/1"])], be);
        assert_eq!(c.state(), ControllerState::PoweredOff);
        c.toggle_power().await;
        assert_eq!(c.state(), ControllerState::Live);
        assert!(c.session().is_powered_on);
        assert_eq!(c.session().consecutive_errors, 0);
        assert_eq!(c.status().level, StatusLevel::Live);
    }

    #[tokio::test]
    async fn power_off_pauses_and_power_on_resumes_same_track() {
        let be = ScriptedBackend::default();
        let played = Rc::clone(&be.played_urls);
        let mut c = controller(vec![station("a", &["https://a/0", "https://a/1"])], be);
        c.toggle_power().await;
        let first = c.session().current_track.clone().unwrap();
        c.toggle_power().await;
        assert_eq!(c.state(), ControllerState::PoweredOff);
        assert_eq!(c.status().text, "Paused.");
        c.toggle_power().await;
        // Same element resumed, no re-selection.
        assert_eq!(c.session().current_track.as_ref(), Some(&first));
        assert_eq!(played.borrow().len(), 2);
    }

    #[tokio::test]
    async fn blocked_start_returns_to_powered_off_without_retry() {
        let be = ScriptedBackend::default();
        // Both the graph attempt and the torn-down retry are refused.
        *be.script.borrow_mut() = vec![
            Err(PlaybackError::Blocked("autoplay".into())),
            Err(PlaybackError::Blocked("autoplay".into())),
        ];
        let played = Rc::clone(&be.played_urls);
        let mut c = controller(vec![station("a", &["https://a/0", "https://a/1"])], be);
        c.toggle_power().await;
        assert_eq!(c.state(), ControllerState::PoweredOff);
        assert!(!c.session().is_powered_on);
        assert_eq!(c.status().level, StatusLevel::Warn);
        // Exactly the pipeline-internal retry happened; no controller retry.
        assert_eq!(played.borrow().len(), 2);
    }

    #[tokio::test]
    async fn consecutive_start_failures_exhaust_budget_and_power_off() {
        // Station with 2 valid tracks: clamp(2, 2, 6) = 2 failures allowed.
        // graph_fails keeps the pipeline on the direct path so every play
        // call consumes exactly one scripted outcome.
        let be = ScriptedBackend {
            graph_fails: true,
            ..Default::default()
        };
        *be.script.borrow_mut() = vec![
            Err(PlaybackError::Failed("404".into())),
            Err(PlaybackError::Failed("404".into())),
        ];
        let played = Rc::clone(&be.played_urls);
        let mut c = controller(vec![station("a", &["https://a/0", "https://a/1"])], be);
        assert_eq!(c.max_skips(), 2);
        c.toggle_power().await;

        assert_eq!(c.session().consecutive_errors, 2);
        assert_eq!(c.state(), ControllerState::PoweredOff);
        assert!(!c.session().is_powered_on);
        assert_eq!(c.status().text, "Playback failed repeatedly for this station.");
        assert!(c.helper().unwrap().contains("cross-origin"));
        // Exactly the budgeted attempts, then no further retry.
        assert_eq!(played.borrow().len(), 2);
    }

    #[tokio::test]
    async fn runtime_failure_scans_to_next_track() {
        let be = ScriptedBackend::default();
        let played = Rc::clone(&be.played_urls);
        let mut c = controller(
            vec![station("a", &["https://a/0", "https://a/1", "https://a/2"])],
            be,
        );
        c.toggle_power().await;
        let before = c.session().current_track.clone();
        c.on_playback_failure("decode error").await;
        assert_eq!(c.state(), ControllerState::Live);
        assert_eq!(played.borrow().len(), 2);
        assert_ne!(c.session().current_track, before);
    }

    #[tokio::test]
    async fn successful_restart_resets_error_counter() {
        let be = ScriptedBackend::default();
        let mut c = controller(
            vec![station("a", &["https://a/0", "https://a/1", "https://a/2"])],
            be,
        );
        c.toggle_power().await;
        c.on_playback_failure("hiccup").await;
        assert_eq!(c.state(), ControllerState::Live);
        assert_eq!(c.session().consecutive_errors, 0);
    }

    #[tokio::test]
    async fn navigation_while_off_never_autoplays() {
        let be = ScriptedBackend::default();
        let played = Rc::clone(&be.played_urls);
        let mut c = controller(
            vec![
                station("a", &["https://a/0"]),
                station("b", &["https://b/0"]),
            ],
            be,
        );
        c.set_station(1).await;
        assert_eq!(c.session().station_index, 1);
        assert!(played.borrow().is_empty());
        assert!(c.status().text.contains("selected"));
        assert_eq!(c.state(), ControllerState::PoweredOff);
    }

    #[tokio::test]
    async fn station_change_while_live_restarts_on_new_station() {
        let be = ScriptedBackend::default();
        let played = Rc::clone(&be.played_urls);
        let mut c = controller(
            vec![
                station("a", &["https://a/0"]),
                station("b", &["https://b/0"]),
            ],
            be,
        );
        c.toggle_power().await;
        c.set_station(1).await;
        assert_eq!(c.state(), ControllerState::Live);
        assert!(played.borrow().last().unwrap().starts_with("https://b/"));
    }

    #[tokio::test]
    async fn station_index_clamps_to_catalog_bounds() {
        let be = ScriptedBackend::default();
        let mut c = controller(
            vec![
                station("a", &["https://a/0"]),
                station("b", &["https://b/0"]),
            ],
            be,
        );
        c.set_station(99).await;
        assert_eq!(c.session().station_index, 1);
    }

    #[tokio::test]
    async fn no_valid_tracks_is_soft_and_counts_no_errors() {
        let be = ScriptedBackend::default();
        let mut c = controller(vec![station("a", &["not-a-url", "file:///x"])], be);
        c.toggle_power().await;
        assert_eq!(c.state(), ControllerState::PoweredOff);
        assert_eq!(c.session().consecutive_errors, 0);
        assert_eq!(c.status().text, "No valid tracks in this station.");
        assert!(c.session().current_track.is_none());
    }

    #[tokio::test]
    async fn natural_end_advances_to_a_fresh_selection() {
        let be = ScriptedBackend::default();
        let played = Rc::clone(&be.played_urls);
        let mut c = controller(
            vec![station("a", &["https://a/0", "https://a/1", "https://a/2"])],
            be,
        );
        c.toggle_power().await;
        let first = played.borrow().last().unwrap().clone();
        c.on_track_ended().await;
        assert_eq!(c.state(), ControllerState::Live);
        let second = played.borrow().last().unwrap().clone();
        // Shuffle mode: the immediate repeat is excluded.
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn events_while_powered_off_are_ignored() {
        let be = ScriptedBackend::default();
        let played = Rc::clone(&be.played_urls);
        let mut c = controller(vec![station("a", &["https://a/0"])], be);
        c.on_track_ended().await;
        c.on_playback_failure("stale").await;
        assert!(played.borrow().is_empty());
        assert_eq!(c.session().consecutive_errors, 0);
        assert_eq!(c.state(), ControllerState::PoweredOff);
    }

    #[tokio::test]
    async fn graph_unavailable_sets_fallback_helper() {
        let be = ScriptedBackend {
            graph_fails: true,
            ..Default::default()
        };
        let mut c = controller(vec![station("a", &["https://a/0"])], be);
        c.toggle_power().await;
        assert_eq!(c.state(), ControllerState::Live);
        assert!(c.helper().unwrap().contains("fallback visuals"));
    }
}
