//! End-to-end receiver scenarios driven through the simulated playback
//! element, exercising the controller, pipeline, and visualizer together.

use std::time::Duration;

use tokio::sync::mpsc;

use wradio_core::{
    AudioPipeline, ControllerState, ElementEvent, PipelineState, PlaybackController,
    SeededSource, SimulatedBackend, Station, StatusLevel, Track, TrackSelector, Visualizer,
    VizSource,
};

fn station(id: &str, name: &str, urls: &[&str]) -> Station {
    Station {
        id: id.to_string(),
        name: name.to_string(),
        tracks: urls
            .iter()
            .map(|u| Track {
                title: None,
                url: u.to_string(),
            })
            .collect(),
    }
}

fn receiver(
    stations: Vec<Station>,
    backend: SimulatedBackend,
) -> PlaybackController<SimulatedBackend, SeededSource> {
    PlaybackController::new(
        stations,
        TrackSelector::new(SeededSource::new(42)),
        AudioPipeline::new(backend),
    )
}

#[tokio::test]
async fn two_track_station_with_dead_sources_powers_off() {
    let (tx, _rx) = mpsc::channel(8);
    let backend = SimulatedBackend::new(tx, Duration::from_secs(30)).fail_start("https://dead/");
    let mut rcv = receiver(
        vec![station("s1", "Night Static", &["https://dead/a.mp3", "https://dead/b.mp3"])],
        backend,
    );

    rcv.toggle_power().await;

    // clamp(2, 2, 6) = 2 failures, then off with a persistent warning.
    assert_eq!(rcv.state(), ControllerState::PoweredOff);
    assert!(!rcv.session().is_powered_on);
    assert_eq!(rcv.session().consecutive_errors, 2);
    assert_eq!(rcv.status().level, StatusLevel::Warn);
    assert_eq!(rcv.status().text, "Playback failed repeatedly for this station.");
}

#[tokio::test]
async fn graph_denied_source_still_plays_with_synthetic_visuals() {
    let (tx, _rx) = mpsc::channel(8);
    let backend = SimulatedBackend::new(tx, Duration::from_secs(30)).deny_graph("https://nocors/");
    let mut rcv = receiver(
        vec![station("s1", "Far Signal", &["https://nocors/live.mp3"])],
        backend,
    );

    rcv.toggle_power().await;

    assert_eq!(rcv.state(), ControllerState::Live);
    assert_eq!(rcv.pipeline().state(), PipelineState::GraphUnavailable);
    assert!(rcv.pipeline_mut().sample_waveform().is_none());
    assert!(rcv.helper().unwrap().contains("fallback visuals"));

    // With no graph data the frame comes from the synthetic playing path
    // and is never blank.
    let mut viz = Visualizer::new(320, 120, 20);
    let frame = viz.render(VizSource::Playing { elapsed_secs: 1.5 });
    assert!(!frame.ops.is_empty());
    assert_eq!(frame.bars.len(), 20);
    assert!(frame.bars.iter().all(|b| *b >= 10.0));
}

#[tokio::test]
async fn graph_backed_source_feeds_live_visuals() {
    let (tx, _rx) = mpsc::channel(8);
    let backend = SimulatedBackend::new(tx, Duration::from_secs(30));
    let mut rcv = receiver(
        vec![station("s1", "Clear Channel", &["https://open/live.mp3"])],
        backend,
    );

    rcv.toggle_power().await;
    assert_eq!(rcv.pipeline().state(), PipelineState::GraphActive);

    let waveform = rcv.pipeline_mut().sample_waveform().unwrap();
    let frequency = rcv.pipeline_mut().sample_frequency().unwrap();
    let mut viz = Visualizer::new(320, 120, 20);
    let frame = viz.render(VizSource::Live {
        waveform: &waveform,
        frequency: &frequency,
    });
    assert_eq!(frame.bars.len(), 20);
    assert!(frame.bars.iter().all(|b| (8.0..=100.0).contains(b)));
}

#[tokio::test]
async fn station_browsing_while_off_never_starts_audio() {
    let (tx, mut rx) = mpsc::channel(8);
    let backend = SimulatedBackend::new(tx, Duration::from_millis(10));
    let mut rcv = receiver(
        vec![
            station("s1", "One", &["https://open/1.mp3"]),
            station("s2", "Two", &["https://open/2.mp3"]),
            station("s3", "Three", &["https://open/3.mp3"]),
        ],
        backend,
    );

    rcv.set_station(2).await;
    rcv.set_station(0).await;

    assert_eq!(rcv.state(), ControllerState::PoweredOff);
    assert!(rcv.session().current_track.is_none());
    assert!(rcv.status().text.contains("selected"));
    // No element timers were armed, so no events ever arrive.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn natural_track_end_advances_within_the_station() {
    let (tx, mut rx) = mpsc::channel(8);
    let backend = SimulatedBackend::new(tx, Duration::from_secs(30));
    let mut rcv = receiver(
        vec![station(
            "s1",
            "Rotation",
            &["https://open/a.mp3", "https://open/b.mp3", "https://open/c.mp3"],
        )],
        backend,
    );

    rcv.toggle_power().await;
    let first = rcv.session().current_track.clone().unwrap();

    // The element finishes the track and reports it.
    let ev = rx.recv().await.unwrap();
    assert!(matches!(ev, ElementEvent::Ended));
    rcv.on_track_ended().await;

    assert_eq!(rcv.state(), ControllerState::Live);
    let second = rcv.session().current_track.clone().unwrap();
    assert_ne!(first, second, "shuffle never repeats the previous track");
}

#[tokio::test(start_paused = true)]
async fn mid_stream_failure_scans_and_recovers() {
    let (tx, mut rx) = mpsc::channel(8);
    let backend = SimulatedBackend::new(tx, Duration::from_secs(30)).fail_during("https://flaky/");
    let mut rcv = receiver(
        vec![station(
            "s1",
            "Patchy",
            &["https://flaky/a.mp3", "https://open/b.mp3", "https://open/c.mp3"],
        )],
        backend,
    );

    // Keep powering through failures until a stable track is live.
    rcv.toggle_power().await;
    for _ in 0..4 {
        let stable = rcv
            .session()
            .current_track
            .as_ref()
            .is_some_and(|t| t.url.starts_with("https://open/"));
        if stable {
            break;
        }
        match rx.recv().await.unwrap() {
            ElementEvent::Failed(reason) => rcv.on_playback_failure(&reason).await,
            ElementEvent::Ended => rcv.on_track_ended().await,
        }
    }

    assert_eq!(rcv.state(), ControllerState::Live);
    assert!(rcv
        .session()
        .current_track
        .as_ref()
        .unwrap()
        .url
        .starts_with("https://open/"));
    assert_eq!(rcv.session().consecutive_errors, 0);
}

#[tokio::test]
async fn power_cycle_resumes_the_same_track() {
    let (tx, _rx) = mpsc::channel(8);
    let backend = SimulatedBackend::new(tx, Duration::from_secs(30));
    let mut rcv = receiver(
        vec![station("s1", "Steady", &["https://open/a.mp3", "https://open/b.mp3"])],
        backend,
    );

    rcv.toggle_power().await;
    let playing = rcv.session().current_track.clone();

    rcv.toggle_power().await;
    assert_eq!(rcv.state(), ControllerState::PoweredOff);
    assert_eq!(rcv.status().text, "Paused.");
    // Pausing keeps the element loaded.
    assert_eq!(rcv.session().current_track, playing);

    rcv.toggle_power().await;
    assert_eq!(rcv.state(), ControllerState::Live);
    assert_eq!(rcv.session().current_track, playing);
}

#[tokio::test]
async fn station_with_no_valid_tracks_leaves_other_station_playable() {
    let (tx, _rx) = mpsc::channel(8);
    let backend = SimulatedBackend::new(tx, Duration::from_secs(30));
    let mut rcv = receiver(
        vec![
            station("s1", "Good", &["https://open/a.mp3"]),
            station("s2", "Empty", &["not-a-url", "ftp://nope/x"]),
        ],
        backend,
    );

    rcv.toggle_power().await;
    assert_eq!(rcv.state(), ControllerState::Live);

    rcv.set_station(1).await;
    assert_eq!(rcv.status().text, "No valid tracks in this station.");
    assert_eq!(rcv.session().consecutive_errors, 0);
    // Still live on the old element; switching back recovers fully.
    assert_eq!(rcv.state(), ControllerState::Live);

    rcv.set_station(0).await;
    assert_eq!(rcv.state(), ControllerState::Live);
    assert_eq!(rcv.status().text, "Live: Good");
}
