//! Scope + equalizer renderer.  Runs every display frame regardless of power
//! state and emits backend-agnostic draw instructions; the terminal binding
//! (or any 2D surface) replays them.
//!
//! Three render paths, chosen per frame by data availability:
//! live (real waveform/frequency bytes), playing-synthetic (audible but no
//! graph data), and idle (powered off or paused).  The display is never
//! blank.

/// Paint roles the drawing surface maps onto concrete colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Background,
    Grid,
    Trace,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    FillRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        paint: Paint,
    },
    Polyline {
        points: Vec<(f32, f32)>,
        paint: Paint,
    },
}

/// One frame of output: draw instructions for the scope surface plus
/// equalizer bar heights in percent.
#[derive(Debug, Clone, Default)]
pub struct VizFrame {
    pub ops: Vec<DrawOp>,
    pub bars: Vec<f32>,
}

/// What the current frame has to work with.
#[derive(Debug)]
pub enum VizSource<'a> {
    /// Graph data available: render the real signal.
    Live {
        waveform: &'a [u8],
        frequency: &'a [u8],
    },
    /// Audible but no analysable data; deterministic motion driven by
    /// elapsed playback time.
    Playing { elapsed_secs: f64 },
    /// Powered off or paused.
    Idle,
}

/// Minimum live equalizer bar height in percent.
const BAR_FLOOR_PCT: f32 = 8.0;
/// Idle phase advance per frame.
const IDLE_PHASE_STEP: f64 = 0.025;

pub struct Visualizer {
    width: f32,
    height: f32,
    bar_count: usize,
    /// Idle-animation phase accumulator, advanced once per idle frame.
    phase: f64,
}

impl Visualizer {
    pub fn new(width: u32, height: u32, bar_count: usize) -> Self {
        Self {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
            bar_count,
            phase: 0.0,
        }
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn render(&mut self, source: VizSource) -> VizFrame {
        match source {
            VizSource::Live {
                waveform,
                frequency,
            } => self.render_live(waveform, frequency),
            VizSource::Playing { elapsed_secs } => self.render_playing(elapsed_secs),
            VizSource::Idle => self.render_idle(),
        }
    }

    // ── Live path ─────────────────────────────────────────────────────────────

    fn render_live(&mut self, waveform: &[u8], frequency: &[u8]) -> VizFrame {
        let (w, h) = (self.width, self.height);
        let mut ops = self.backdrop(24.0);

        // Waveform trace: sample index maps over width, amplitude over height.
        let mut points = Vec::with_capacity(w as usize);
        if !waveform.is_empty() {
            let step = waveform.len() as f32 / w;
            for x in 0..w as usize {
                let idx = ((x as f32 * step) as usize).min(waveform.len() - 1);
                let y = waveform[idx] as f32 / 255.0 * h;
                points.push((x as f32, y));
            }
        }
        ops.push(DrawOp::Polyline {
            points,
            paint: Paint::Trace,
        });

        VizFrame {
            ops,
            bars: self.live_bars(frequency),
        }
    }

    /// Partition frequency bins into contiguous buckets, average each, and
    /// normalize `[0,255]` onto `[floor, 100]` percent.
    fn live_bars(&self, frequency: &[u8]) -> Vec<f32> {
        if self.bar_count == 0 {
            return Vec::new();
        }
        let bucket = (frequency.len() / self.bar_count).max(1);
        (0..self.bar_count)
            .map(|i| {
                let total: u32 = (0..bucket)
                    .map(|j| frequency.get(i * bucket + j).copied().unwrap_or(0) as u32)
                    .sum();
                let average = total as f32 / bucket as f32;
                (average / 255.0 * 100.0).clamp(BAR_FLOOR_PCT, 100.0)
            })
            .collect()
    }

    // ── Playing-synthetic path ────────────────────────────────────────────────

    fn render_playing(&mut self, t: f64) -> VizFrame {
        let (w, h) = (self.width, self.height);
        let mut ops = self.backdrop(24.0);

        let mid = h as f64 / 2.0;
        let mut points = Vec::new();
        let mut x = 0.0_f64;
        while x <= w as f64 {
            let y = mid + (x * 0.02 + t * 4.8).sin() * 12.0 + (x * 0.008 + t * 1.8).sin() * 7.0;
            points.push((x as f32, y as f32));
            x += 2.0;
        }
        ops.push(DrawOp::Polyline {
            points,
            paint: Paint::Trace,
        });

        let bars = (0..self.bar_count)
            .map(|i| {
                let i = i as f64;
                let movement = 30.0 + (t * 4.0 + i * 0.8).sin() * 24.0 + (t * 1.6 + i).sin() * 10.0;
                movement.clamp(10.0, 100.0) as f32
            })
            .collect();

        VizFrame { ops, bars }
    }

    // ── Idle path ─────────────────────────────────────────────────────────────

    fn render_idle(&mut self) -> VizFrame {
        self.phase += IDLE_PHASE_STEP;
        let (w, h) = (self.width, self.height);
        let mut ops = self.backdrop(26.0);

        let mid = h as f64 / 2.0;
        let mut points = Vec::new();
        let mut x = 0.0_f64;
        while x <= w as f64 {
            let y = mid + (x * 0.015 + self.phase).sin() * 8.0;
            points.push((x as f32, y as f32));
            x += 2.0;
        }
        ops.push(DrawOp::Polyline {
            points,
            paint: Paint::Trace,
        });

        let bars = (0..self.bar_count)
            .map(|i| {
                let idle = 14.0 + (self.phase + i as f64 * 0.7).sin() * 6.0;
                idle.max(8.0) as f32
            })
            .collect();

        VizFrame { ops, bars }
    }

    /// Clear, background fill, and horizontal grid lines.
    fn backdrop(&self, grid_step: f32) -> Vec<DrawOp> {
        let (w, h) = (self.width, self.height);
        let mut ops = vec![
            DrawOp::Clear,
            DrawOp::FillRect {
                x: 0.0,
                y: 0.0,
                w,
                h,
                paint: Paint::Background,
            },
        ];
        let mut y = 0.0;
        while y < h {
            ops.push(DrawOp::Polyline {
                points: vec![(0.0, y), (w, y)],
                paint: Paint::Grid,
            });
            y += grid_step;
        }
        ops
    }
}
