//! Audio pipeline — owns the always-present playback element plus the
//! optional analysis graph (tone filter → analyser → gain), and mediates
//! volume and tone across both.
//!
//! Graph construction failure is an expected outcome on cross-origin-
//! restricted sources: the chain is discarded and playback continues without
//! analysis data.  Only a playback refusal with no remaining fallback is
//! reported upward.

use std::future::Future;

use thiserror::Error;
use tracing::debug;

use crate::catalog::{is_http_url, Track};

/// Analyser FFT size — waveform sample count per read.
pub const FFT_SIZE: usize = 2048;
/// Analyser temporal smoothing constant.
pub const SMOOTHING: f32 = 0.86;
/// Low-pass resonance for the tone filter.
pub const FILTER_Q: f32 = 0.7;

const TONE_MIN_HZ: f32 = 500.0;
const TONE_MAX_HZ: f32 = 12_000.0;

/// Linear map from a 0–100 tone percentage to the low-pass cutoff.
/// 500 Hz to 12 kHz gives an audible shaping range.
pub fn tone_frequency(pct: u8) -> f32 {
    let pct = pct.min(100) as f32 / 100.0;
    TONE_MIN_HZ + pct * (TONE_MAX_HZ - TONE_MIN_HZ)
}

/// True iff the URL qualifies for the analysis graph: absolute http/https
/// resources only.  Matches track validity exactly, so a track that is never
/// selected is also never attempted against the graph.
pub fn is_graph_eligible(url: &str) -> bool {
    is_http_url(url)
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The playback attempt itself was refused (e.g. an autoplay policy).
    #[error("playback blocked: {0}")]
    Blocked(String),
    /// The source could not start playing (bad or unreachable media).
    #[error("playback failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
#[error("analysis graph construction failed: {0}")]
pub struct GraphBuildError(pub String);

/// Runtime signals from the playback element, delivered to the controller
/// through the application's event channel.
#[derive(Debug, Clone)]
pub enum ElementEvent {
    /// Natural end of the current track.
    Ended,
    /// Playback started but failed during playback.
    Failed(String),
}

/// Live analysis chain: tone filter and gain setters, plus byte-array reads
/// the visualizer consumes.  The analyser sits before the gain node, so
/// sample data is unaffected by the volume setting.
pub trait AnalysisGraph {
    fn set_gain(&mut self, gain: f32);
    fn set_cutoff_hz(&mut self, hz: f32);
    /// Time-domain samples, `FFT_SIZE` bytes centred on 128.
    fn waveform(&mut self) -> Vec<u8>;
    /// Frequency-bin magnitudes, `FFT_SIZE / 2` bytes.
    fn frequency(&mut self) -> Vec<u8>;
}

/// Seam to the host playback resource.  `play` is the only operation that
/// suspends awaiting an external outcome; everything else is synchronous.
pub trait AudioBackend {
    type Graph: AnalysisGraph;

    fn set_source(&mut self, url: &str);
    fn play(&mut self) -> impl Future<Output = Result<(), PlaybackError>>;
    fn pause(&mut self);
    fn set_element_volume(&mut self, volume: f32);
    /// One construction attempt for the analysis chain on the current source.
    fn build_graph(&mut self) -> Result<Self::Graph, GraphBuildError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    /// source → tone filter → analyser → gain → output chain is live.
    GraphActive,
    /// Construction failed or the URL was ineligible; direct playback only.
    GraphUnavailable,
}

pub struct AudioPipeline<B: AudioBackend> {
    backend: B,
    graph: Option<B::Graph>,
    state: PipelineState,
    graph_attempted: bool,
    volume_pct: u8,
    tone_pct: u8,
}

impl<B: AudioBackend> AudioPipeline<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            graph: None,
            state: PipelineState::Uninitialized,
            graph_attempted: false,
            volume_pct: 100,
            tone_pct: 50,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Load and start a track.  Re-arms the pipeline, attempts the graph when
    /// the URL is eligible, and on a blocked start retries once with the
    /// graph torn down — some hosts refuse graph construction but allow plain
    /// playback.  Only a second refusal propagates.
    pub async fn play(&mut self, track: &Track) -> Result<(), PlaybackError> {
        self.rearm();
        self.backend.set_source(&track.url);

        if is_graph_eligible(&track.url) {
            self.ensure_graph();
        } else {
            self.state = PipelineState::GraphUnavailable;
        }
        self.apply_volume();
        self.apply_tone();

        match self.backend.play().await {
            Ok(()) => Ok(()),
            Err(err) => {
                if self.state == PipelineState::GraphActive {
                    debug!("playback blocked with graph active, retrying without graph: {err}");
                    self.discard_graph();
                    self.apply_volume();
                    self.backend.play().await
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Restart the current source without re-arming (power-on after pause).
    pub async fn resume(&mut self) -> Result<(), PlaybackError> {
        self.backend.play().await
    }

    pub fn pause(&mut self) {
        self.backend.pause();
    }

    /// Full teardown: pause the element and drop the chain.
    pub fn stop(&mut self) {
        self.backend.pause();
        self.rearm();
    }

    /// Attempt graph construction, once per armed pipeline.  Failure lands in
    /// `GraphUnavailable` with every node discarded — an expected outcome,
    /// never surfaced as a user error.  Returns whether the graph is live.
    pub fn ensure_graph(&mut self) -> bool {
        if self.graph_attempted {
            return self.state == PipelineState::GraphActive;
        }
        self.graph_attempted = true;
        match self.backend.build_graph() {
            Ok(graph) => {
                self.graph = Some(graph);
                self.state = PipelineState::GraphActive;
                true
            }
            Err(err) => {
                debug!("analysis graph unavailable: {err}");
                self.discard_graph();
                false
            }
        }
    }

    /// Set volume as a 0–100 percentage.  With a live graph the gain node is
    /// the sole determinant of loudness and the element stays pinned at 1.0;
    /// without one the element volume is set directly.  Both paths produce
    /// the same effective loudness.
    pub fn set_volume(&mut self, pct: u8) {
        self.volume_pct = pct.min(100);
        self.apply_volume();
    }

    pub fn volume_pct(&self) -> u8 {
        self.volume_pct
    }

    /// Set tone as a 0–100 percentage mapped onto the low-pass cutoff.
    /// No-op without a graph.
    pub fn set_tone(&mut self, pct: u8) {
        self.tone_pct = pct.min(100);
        self.apply_tone();
    }

    pub fn tone_pct(&self) -> u8 {
        self.tone_pct
    }

    /// Live time-domain samples, or `None` when the visualizer should fall
    /// back to synthetic rendering.
    pub fn sample_waveform(&mut self) -> Option<Vec<u8>> {
        self.graph.as_mut().map(|g| g.waveform())
    }

    /// Live frequency-bin magnitudes, or `None` without a graph.
    pub fn sample_frequency(&mut self) -> Option<Vec<u8>> {
        self.graph.as_mut().map(|g| g.frequency())
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn rearm(&mut self) {
        self.graph = None;
        self.state = PipelineState::Uninitialized;
        self.graph_attempted = false;
    }

    fn discard_graph(&mut self) {
        self.graph = None;
        self.state = PipelineState::GraphUnavailable;
    }

    fn apply_volume(&mut self) {
        let level = self.volume_pct as f32 / 100.0;
        if let Some(graph) = self.graph.as_mut() {
            graph.set_gain(level);
            self.backend.set_element_volume(1.0);
        } else {
            self.backend.set_element_volume(level);
        }
    }

    fn apply_tone(&mut self) {
        let hz = tone_frequency(self.tone_pct);
        if let Some(graph) = self.graph.as_mut() {
            graph.set_cutoff_hz(hz);
        }
    }
}
