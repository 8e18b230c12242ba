//! Core of the simulated multi-station receiver: station catalog, track
//! selection, the mediated audio pipeline, the playback state machine, and
//! the dual-mode visualizer.  UI crates drive these types; nothing in here
//! draws or reads input.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod controller;
pub mod pipeline;
pub mod selector;
pub mod sim;
pub mod visualizer;

pub use catalog::{parse_catalog_json, parse_catalog_toml, CatalogError, Station, Track};
pub use clock::{FrameClock, ManualClock, MonotonicClock};
pub use config::Config;
pub use controller::{
    ControllerState, PlaybackController, PlaybackSession, StatusLevel, StatusLine,
};
pub use pipeline::{
    AnalysisGraph, AudioBackend, AudioPipeline, ElementEvent, PipelineState, PlaybackError,
};
pub use selector::{RandomSource, SeededSource, SelectionMode, ThreadRngSource, TrackSelector};
pub use sim::{SimulatedBackend, SimulatedGraph};
pub use visualizer::{DrawOp, Paint, Visualizer, VizFrame, VizSource};
