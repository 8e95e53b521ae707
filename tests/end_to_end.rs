use std::time::Duration;
use timeline_capture::capture::{EventKind, InputClass, ManualSource};
use timeline_capture::processing::timeline::read_event_log;
use timeline_capture::processing::{SyncEngine, VideoProperties};
use timeline_capture::recorder::{RecorderState, SessionAnchors, EVENTS_FILENAME, METADATA_FILENAME};
use timeline_capture::{CaptureConfig, LocalClockRecorder, RecordingState, SessionController};

fn config_in(dir: &std::path::Path) -> CaptureConfig {
    CaptureConfig {
        recordings_dir: dir.to_path_buf(),
        stop_confirmation_timeout_ms: 500,
        ..CaptureConfig::default()
    }
}

fn video_30fps() -> VideoProperties {
    VideoProperties {
        fps: 30.0,
        width: 1920,
        height: 1080,
        total_frames: 300,
    }
}

fn engine() -> SyncEngine {
    SyncEngine {
        output_fps: 30.0,
        persistence_frames: 1,
    }
}

#[tokio::test]
async fn test_capture_then_playback_merges_click() {
    let root = tempfile::tempdir().unwrap();
    let (pointer, handle) = ManualSource::new(InputClass::Pointer);
    let mut controller = SessionController::new(
        config_in(root.path()),
        Box::new(LocalClockRecorder::new()),
        vec![Box::new(pointer)],
    );

    let dir = controller.start().await.unwrap();
    assert_eq!(controller.state(), RecordingState::Recording);
    assert!(handle.move_to(10.0, 10.0));
    assert!(handle.move_to(20.0, 20.0));
    assert!(handle.move_to(30.0, 30.0));
    assert!(handle.click(30.0, 30.0, "left", true));
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(handle.click(30.0, 30.0, "left", false));

    let summary = controller.stop().await.unwrap().unwrap();
    assert_eq!(summary.events_written, 5);
    assert!(!summary.degraded);
    assert!(!handle.is_registered());

    // Raw log: the five events, in capture order.
    let log = read_event_log(&dir.join(EVENTS_FILENAME)).unwrap();
    let actions: Vec<&str> = log.events.iter().map(|e| e.kind.action()).collect();
    assert_eq!(actions, vec!["move", "move", "move", "click", "click"]);
    assert!(log.events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    let anchors = SessionAnchors::load(&dir.join(METADATA_FILENAME)).unwrap();
    assert!(anchors.started_anchor().is_some());
    assert_eq!(anchors.state_timings(RecorderState::Stopped).len(), 1);

    // Playback over the session directory, aligned to the recorder's start.
    let run = engine().run_recording(&dir, &video_30fps()).unwrap();
    assert!(!run.is_degraded());
    let all: Vec<_> = run.annotations.frames.values().flat_map(|f| f.events.iter()).collect();
    assert_eq!(all.len(), 4);
    assert!(!all.iter().any(|e| matches!(e.kind(), EventKind::Click { .. })));
    let complete = all
        .iter()
        .find_map(|e| match e.kind() {
            EventKind::ClickComplete { duration, .. } => Some(*duration),
            _ => None,
        })
        .unwrap();
    assert!(complete >= 0.4);
}

#[test]
fn test_scripted_timeline_at_30fps() {
    // Same scenario with exact capture times and the recorder started at t=0.
    let root = tempfile::tempdir().unwrap();
    let log_path = root.path().join(EVENTS_FILENAME);
    std::fs::write(
        &log_path,
        concat!(
            "{\"time_stamp\":0.1,\"action\":\"move\",\"x\":1,\"y\":1}\n",
            "{\"time_stamp\":0.2,\"action\":\"move\",\"x\":2,\"y\":2}\n",
            "{\"time_stamp\":0.3,\"action\":\"move\",\"x\":3,\"y\":3}\n",
            "{\"time_stamp\":0.5,\"action\":\"click\",\"x\":3,\"y\":3,\"button\":\"left\",\"pressed\":true}\n",
            "{\"time_stamp\":0.9,\"action\":\"click\",\"x\":3,\"y\":3,\"button\":\"left\",\"pressed\":false}\n",
        ),
    )
    .unwrap();

    let mut anchors = SessionAnchors::default();
    anchors
        .recorder_state_events
        .insert(RecorderState::Started.as_str().to_string(), vec![0.0]);
    std::fs::write(
        root.path().join(METADATA_FILENAME),
        serde_json::to_vec(&anchors).unwrap(),
    )
    .unwrap();

    let run = engine().run_recording(root.path(), &video_30fps()).unwrap();
    assert_eq!(run.baseline.timestamp, 0.0);

    // 0.9s * 30fps = frame 27.
    let at_release = run.annotations.events_at(27);
    assert_eq!(at_release.len(), 1);
    match at_release[0].kind() {
        EventKind::ClickComplete {
            button,
            press_time,
            release_time,
            duration,
            ..
        } => {
            assert_eq!(button, "left");
            assert_eq!(*press_time, 0.5);
            assert_eq!(*release_time, 0.9);
            assert!((duration - 0.4).abs() < 1e-9);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(run.annotations.events_at(15).is_empty());
    let moves: Vec<u64> = [3, 6, 9]
        .into_iter()
        .filter(|frame| run.annotations.events_at(*frame).len() == 1)
        .collect();
    assert_eq!(moves, vec![3, 6, 9]);

    // A second run over the same inputs gives the same map.
    let again = engine().run_recording(root.path(), &video_30fps()).unwrap();
    assert_eq!(again.annotations, run.annotations);
}

#[tokio::test]
async fn test_pause_window_is_bracketed_and_empty() {
    let root = tempfile::tempdir().unwrap();
    let (keyboard, handle) = ManualSource::new(InputClass::Keyboard);
    let mut controller = SessionController::new(
        config_in(root.path()),
        Box::new(LocalClockRecorder::new()),
        vec![Box::new(keyboard)],
    );

    let dir = controller.start().await.unwrap();
    handle.press("a");
    assert!(controller.pause().await.unwrap());
    assert!(!handle.press("b"));
    assert!(controller.resume().await.unwrap());
    handle.release("a");
    controller.stop().await.unwrap();

    let log = read_event_log(&dir.join(EVENTS_FILENAME)).unwrap();
    let actions: Vec<&str> = log.events.iter().map(|e| e.kind.action()).collect();
    assert_eq!(actions, vec!["press", "pause", "resume", "release"]);
}
