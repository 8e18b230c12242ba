//! Track selection policy — shuffle without immediate repeat, or sequential
//! round-robin, tracked per station for the lifetime of the session.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::{Station, Track};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Random selection, never repeating the immediately preceding pick.
    Shuffle,
    /// Round-robin cycling through valid tracks in catalog order.
    Sequential,
}

/// Injectable randomness so shuffle sequences are reproducible under test.
pub trait RandomSource {
    /// Uniform draw in `[0, bound)`.  `bound` is always >= 1.
    fn index(&mut self, bound: usize) -> usize;
}

/// Default source backed by the thread-local generator.
#[derive(Debug, Default)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn index(&mut self, bound: usize) -> usize {
        rand::thread_rng().gen_range(0..bound)
    }
}

/// Seedable source for deterministic tests.
#[derive(Debug)]
pub struct SeededSource(StdRng);

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededSource {
    fn index(&mut self, bound: usize) -> usize {
        self.0.gen_range(0..bound)
    }
}

/// Chooses the next track for a station.  The per-station history maps
/// station id to the index of the last pick within that station's
/// valid-track list; it is created lazily and survives catalog reloads.
#[derive(Debug)]
pub struct TrackSelector<R: RandomSource> {
    rng: R,
    history: HashMap<String, usize>,
}

impl<R: RandomSource> TrackSelector<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            history: HashMap::new(),
        }
    }

    /// Select the next valid track, or `None` when the station has no valid
    /// tracks.  History is only written on a successful selection.
    pub fn select_next(&mut self, station: &Station, mode: SelectionMode) -> Option<Track> {
        let valid = station.valid_tracks();
        if valid.is_empty() {
            return None;
        }

        let last = self.history.get(&station.id).copied();
        let next = match mode {
            SelectionMode::Sequential => match last {
                Some(i) => (i + 1) % valid.len(),
                None => 0,
            },
            SelectionMode::Shuffle => {
                if valid.len() == 1 {
                    0
                } else {
                    // Resample until the draw differs from the previous pick.
                    // Only the never-immediately-repeat guarantee is promised.
                    let mut draw = self.rng.index(valid.len());
                    while Some(draw) == last {
                        draw = self.rng.index(valid.len());
                    }
                    draw
                }
            }
        };

        self.history.insert(station.id.clone(), next);
        Some(valid[next].clone())
    }

    /// Index of the most recent pick for a station, if any.
    pub fn last_index(&self, station_id: &str) -> Option<usize> {
        self.history.get(station_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Track;

    fn station(id: &str, urls: &[&str]) -> Station {
        Station {
            id: id.to_string(),
            name: id.to_string(),
            tracks: urls
                .iter()
                .map(|u| Track {
                    title: None,
                    url: u.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn sequential_visits_every_valid_track_in_order() {
        let s = station(
            "s1",
            &["https://a/0", "bad-url", "https://a/1", "https://a/2"],
        );
        let mut sel = TrackSelector::new(SeededSource::new(1));
        let picked: Vec<String> = (0..6)
            .map(|_| sel.select_next(&s, SelectionMode::Sequential).unwrap().url)
            .collect();
        // Cycles the three valid tracks in original order, then repeats.
        assert_eq!(
            picked,
            vec![
                "https://a/0",
                "https://a/1",
                "https://a/2",
                "https://a/0",
                "https://a/1",
                "https://a/2"
            ]
        );
    }

    #[test]
    fn shuffle_never_repeats_the_previous_pick() {
        let s = station("s1", &["https://a/0", "https://a/1", "https://a/2"]);
        let mut sel = TrackSelector::new(SeededSource::new(42));
        let mut prev: Option<String> = None;
        for _ in 0..100 {
            let url = sel.select_next(&s, SelectionMode::Shuffle).unwrap().url;
            assert_ne!(Some(&url), prev.as_ref());
            prev = Some(url);
        }
    }

    #[test]
    fn shuffle_with_single_valid_track_repeats_it() {
        let s = station("only", &["https://a/solo", "nope"]);
        let mut sel = TrackSelector::new(SeededSource::new(7));
        for _ in 0..5 {
            let t = sel.select_next(&s, SelectionMode::Shuffle).unwrap();
            assert_eq!(t.url, "https://a/solo");
        }
        assert_eq!(sel.last_index("only"), Some(0));
    }

    #[test]
    fn no_valid_tracks_returns_none_and_leaves_history_alone() {
        let s = station("empty", &["file:///x", "relative/path"]);
        let mut sel = TrackSelector::new(SeededSource::new(0));
        assert!(sel.select_next(&s, SelectionMode::Shuffle).is_none());
        assert!(sel.select_next(&s, SelectionMode::Sequential).is_none());
        assert_eq!(sel.last_index("empty"), None);
    }

    #[test]
    fn history_is_tracked_per_station() {
        let a = station("a", &["https://a/0", "https://a/1"]);
        let b = station("b", &["https://b/0", "https://b/1", "https://b/2"]);
        let mut sel = TrackSelector::new(SeededSource::new(3));
        sel.select_next(&a, SelectionMode::Sequential);
        sel.select_next(&b, SelectionMode::Sequential);
        sel.select_next(&a, SelectionMode::Sequential);
        assert_eq!(sel.last_index("a"), Some(1));
        assert_eq!(sel.last_index("b"), Some(0));
    }
}
