//! Simulated playback element and analysis graph.  Stands in for a real
//! audio device so the receiver can run end to end, with URL-prefix hooks
//! for injecting the failure modes a real element exhibits.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::pipeline::{
    AnalysisGraph, AudioBackend, ElementEvent, GraphBuildError, PlaybackError, FFT_SIZE,
};

/// Delay before an injected mid-stream failure is reported.
const RUNTIME_FAIL_DELAY: Duration = Duration::from_millis(250);

/// Playback element that "plays" a source by running a timer for the track
/// length and emitting [`ElementEvent`]s on the application channel.
pub struct SimulatedBackend {
    events: mpsc::Sender<ElementEvent>,
    track_len: Duration,
    source: Option<String>,
    paused: bool,
    element_volume: f32,
    /// Timer for the pending `Ended` or injected `Failed` event.  A new
    /// source or a pause supersedes it.
    timer: Option<AbortHandle>,
    deny_play_prefixes: Vec<String>,
    fail_start_prefixes: Vec<String>,
    fail_during_prefixes: Vec<String>,
    deny_graph_prefixes: Vec<String>,
}

impl SimulatedBackend {
    pub fn new(events: mpsc::Sender<ElementEvent>, track_len: Duration) -> Self {
        Self {
            events,
            track_len,
            source: None,
            paused: false,
            element_volume: 1.0,
            timer: None,
            deny_play_prefixes: Vec::new(),
            fail_start_prefixes: Vec::new(),
            fail_during_prefixes: Vec::new(),
            deny_graph_prefixes: Vec::new(),
        }
    }

    /// Sources matching this prefix refuse to start, like an autoplay policy.
    pub fn deny_play(mut self, prefix: impl Into<String>) -> Self {
        self.deny_play_prefixes.push(prefix.into());
        self
    }

    /// Sources matching this prefix fail at start, like unreachable media.
    pub fn fail_start(mut self, prefix: impl Into<String>) -> Self {
        self.fail_start_prefixes.push(prefix.into());
        self
    }

    /// Sources matching this prefix start, then fail mid-stream.
    pub fn fail_during(mut self, prefix: impl Into<String>) -> Self {
        self.fail_during_prefixes.push(prefix.into());
        self
    }

    /// Sources matching this prefix refuse analysis-graph construction,
    /// like a cross-origin restriction.
    pub fn deny_graph(mut self, prefix: impl Into<String>) -> Self {
        self.deny_graph_prefixes.push(prefix.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn element_volume(&self) -> f32 {
        self.element_volume
    }

    fn source_matches(&self, prefixes: &[String]) -> bool {
        match &self.source {
            Some(src) => prefixes.iter().any(|p| src.starts_with(p.as_str())),
            None => false,
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(h) = self.timer.take() {
            h.abort();
        }
    }

    fn arm_timer(&mut self, delay: Duration, event: ElementEvent) {
        self.cancel_timer();
        let tx = self.events.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event).await;
        });
        self.timer = Some(handle.abort_handle());
    }
}

impl AudioBackend for SimulatedBackend {
    type Graph = SimulatedGraph;

    fn set_source(&mut self, url: &str) {
        self.cancel_timer();
        self.source = Some(url.to_string());
        self.paused = false;
    }

    async fn play(&mut self) -> Result<(), PlaybackError> {
        let Some(src) = self.source.clone() else {
            return Err(PlaybackError::Failed("no source loaded".into()));
        };
        if self.source_matches(&self.deny_play_prefixes) {
            return Err(PlaybackError::Blocked(format!("policy refused {src}")));
        }
        if self.source_matches(&self.fail_start_prefixes) {
            return Err(PlaybackError::Failed(format!("cannot load {src}")));
        }

        self.paused = false;
        if self.source_matches(&self.fail_during_prefixes) {
            self.arm_timer(
                RUNTIME_FAIL_DELAY,
                ElementEvent::Failed(format!("stream dropped: {src}")),
            );
        } else {
            self.arm_timer(self.track_len, ElementEvent::Ended);
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.cancel_timer();
        self.paused = true;
    }

    fn set_element_volume(&mut self, volume: f32) {
        self.element_volume = volume.clamp(0.0, 1.0);
    }

    fn build_graph(&mut self) -> Result<Self::Graph, GraphBuildError> {
        if self.source.is_none() {
            return Err(GraphBuildError("no source loaded".into()));
        }
        if self.source_matches(&self.deny_graph_prefixes) {
            return Err(GraphBuildError("cross-origin source".into()));
        }
        Ok(SimulatedGraph::new())
    }
}

/// Analysis graph over synthetic program material.  Waveform and spectrum
/// are phase-stepped sine mixtures shaped by the gain and filter settings,
/// so the visualizer's live path has plausible data to chew on.
pub struct SimulatedGraph {
    gain: f32,
    cutoff_hz: f32,
    phase: f32,
}

/// Upper end of the tone filter range, used to normalize the spectral tilt.
const MAX_CUTOFF_HZ: f32 = 12_000.0;

impl SimulatedGraph {
    fn new() -> Self {
        Self {
            gain: 1.0,
            cutoff_hz: MAX_CUTOFF_HZ,
            phase: 0.0,
        }
    }
}

impl AnalysisGraph for SimulatedGraph {
    fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
    }

    fn set_cutoff_hz(&mut self, hz: f32) {
        self.cutoff_hz = hz.max(0.0);
    }

    fn waveform(&mut self) -> Vec<u8> {
        self.phase += 0.09;
        let amp = 110.0 * self.gain;
        (0..FFT_SIZE)
            .map(|i| {
                let x = i as f32;
                let s = (x * 0.02 + self.phase).sin() * 0.7 + (x * 0.005 + self.phase * 0.6).sin() * 0.3;
                (128.0 + s * amp).clamp(0.0, 255.0) as u8
            })
            .collect()
    }

    fn frequency(&mut self) -> Vec<u8> {
        let bins = FFT_SIZE / 2;
        // Bins above the cutoff roll off toward zero.
        let knee = (self.cutoff_hz / MAX_CUTOFF_HZ).clamp(0.0, 1.0) * bins as f32;
        (0..bins)
            .map(|i| {
                let x = i as f32;
                let body = 200.0 * (1.0 - x / bins as f32);
                let ripple = (x * 0.3 + self.phase).sin() * 25.0;
                let rolloff = if x <= knee {
                    1.0
                } else {
                    (1.0 - (x - knee) / (bins as f32 * 0.1)).max(0.0)
                };
                ((body + ripple) * rolloff * self.gain).clamp(0.0, 255.0) as u8
            })
            .collect()
    }
}
