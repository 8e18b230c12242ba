//! Station dial with a short eased snap animation.  The needle glides from
//! its current position to the target detent; the selection commits only
//! when the snap completes.

use std::time::Duration;

use wradio_core::FrameClock;

const SNAP_DURATION: Duration = Duration::from_millis(220);

pub struct StationDial {
    station_count: usize,
    /// Needle position in station units.
    pos: f64,
    snap: Option<Snap>,
}

struct Snap {
    from: f64,
    target: usize,
    started: Duration,
}

fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

impl StationDial {
    pub fn new(station_count: usize) -> Self {
        Self {
            station_count: station_count.max(1),
            pos: 0.0,
            snap: None,
        }
    }

    pub fn pos(&self) -> f64 {
        self.pos
    }

    pub fn is_snapping(&self) -> bool {
        self.snap.is_some()
    }

    /// Station the needle currently points closest to, for label preview
    /// while the snap is still moving.
    pub fn preview_index(&self) -> usize {
        (self.pos.round().max(0.0) as usize).min(self.station_count - 1)
    }

    /// Begin a snap toward `target`.  A commit mid-snap is rejected, matching
    /// the dial's physical feel of one detent at a time.
    pub fn snap_to(&mut self, target: usize, clock: &impl FrameClock) -> bool {
        if self.snap.is_some() {
            return false;
        }
        let target = target.min(self.station_count - 1);
        self.snap = Some(Snap {
            from: self.pos,
            target,
            started: clock.now(),
        });
        true
    }

    /// Place the needle directly on a detent without animating.
    pub fn set(&mut self, index: usize) {
        self.snap = None;
        self.pos = index.min(self.station_count - 1) as f64;
    }

    /// Advance the snap.  Returns the committed station index on the frame
    /// the needle lands.
    pub fn tick(&mut self, clock: &impl FrameClock) -> Option<usize> {
        let snap = self.snap.as_ref()?;
        let elapsed = clock.now().saturating_sub(snap.started);
        let t = (elapsed.as_secs_f64() / SNAP_DURATION.as_secs_f64()).min(1.0);
        let eased = ease_out_cubic(t);
        self.pos = snap.from + (snap.target as f64 - snap.from) * eased;
        if t < 1.0 {
            return None;
        }
        let target = snap.target;
        self.pos = target as f64;
        self.snap = None;
        Some(target)
    }
}
