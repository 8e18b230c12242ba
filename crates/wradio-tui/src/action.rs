//! Action enum — all user-initiated intents dispatched by the app loop.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    // ── Playback ─────────────────────────────────────────────────────────────
    TogglePower,
    NextTrack,
    ToggleShuffle,

    // ── Tuning ───────────────────────────────────────────────────────────────
    /// Snap the dial one station left/right.
    DialLeft,
    DialRight,
    /// Jump the dial straight to a station index.
    TuneTo(usize),

    // ── Levels ───────────────────────────────────────────────────────────────
    VolumeDelta(i8),
    ToneDelta(i8),

    /// Inject a runtime failure on the current element, to watch the skip
    /// policy work.
    SimulateTrackError,

    Quit,
}
