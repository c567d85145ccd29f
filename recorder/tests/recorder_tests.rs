//! Controller lifecycle tests against the in-memory pipe device.

use std::sync::Arc;
use std::time::Duration;

use voxid_recorder::{
    PipeDevice, PipeOutcome, Recorder, RecorderError, RecorderState, RecordingConfig,
};

fn short_config(max_secs: u64) -> RecordingConfig {
    RecordingConfig {
        max_duration: Duration::from_secs(max_secs),
        ..Default::default()
    }
}

/// Polls until the controller reaches the wanted state or the timeout
/// elapses.
async fn wait_for_state(recorder: &Recorder, wanted: RecorderState, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if recorder.state() == wanted {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!(
                "timed out waiting for state {}, still {}",
                wanted,
                recorder.state()
            );
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_start_while_recording_fails_fast() {
    let device = Arc::new(PipeDevice::new());
    let recorder = Recorder::new(device.clone());

    recorder.start(short_config(30)).await.unwrap();
    wait_for_state(&recorder, RecorderState::Recording, Duration::from_secs(1)).await;

    // the second start fails and the live session is untouched
    match recorder.start(short_config(30)).await {
        Err(RecorderError::AlreadyRecording) => {}
        other => panic!("expected AlreadyRecording, got {:?}", other.err()),
    }
    assert_eq!(recorder.state(), RecorderState::Recording);

    recorder.stop().await.unwrap();
    let artifact = recorder.take_artifact(Duration::from_millis(50)).await.unwrap();
    assert!(artifact.path.to_string_lossy().ends_with(".mp3"));
    assert_eq!(recorder.state(), RecorderState::Idle);
}

#[tokio::test]
async fn test_stop_outside_recording_is_noop() {
    let device = Arc::new(PipeDevice::new());
    let recorder = Recorder::new(device);

    recorder.stop().await.unwrap();
    assert_eq!(recorder.state(), RecorderState::Idle);
}

#[tokio::test]
async fn test_ceiling_auto_stop() {
    let device = Arc::new(PipeDevice::new());
    let recorder = Recorder::new(device);

    recorder.start(short_config(1)).await.unwrap();
    wait_for_state(&recorder, RecorderState::Recording, Duration::from_secs(1)).await;

    // the controller stops at the ceiling without any caller involvement
    wait_for_state(&recorder, RecorderState::Stopped, Duration::from_secs(3)).await;

    let artifact = recorder.take_artifact(Duration::from_millis(50)).await.unwrap();
    // duration is bounded by the ceiling plus one tick interval
    assert!(artifact.duration <= Duration::from_secs(2));
}

#[tokio::test]
async fn test_no_tick_observed_after_stop() {
    let device = Arc::new(PipeDevice::new());
    let recorder = Recorder::new(device);

    recorder.start(short_config(30)).await.unwrap();
    wait_for_state(&recorder, RecorderState::Recording, Duration::from_secs(1)).await;

    recorder.stop().await.unwrap();
    wait_for_state(&recorder, RecorderState::Stopped, Duration::from_secs(1)).await;

    let elapsed_at_stop = recorder.session().elapsed_secs;
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(recorder.session().elapsed_secs, elapsed_at_stop);
    assert_eq!(recorder.state(), RecorderState::Stopped);
}

#[tokio::test]
async fn test_hardware_error_mid_recording() {
    let device = Arc::new(PipeDevice::new());
    let recorder = Recorder::new(device.clone());

    recorder.start(short_config(30)).await.unwrap();
    wait_for_state(&recorder, RecorderState::Recording, Duration::from_secs(1)).await;

    device.emit_error("microphone unplugged").await;
    wait_for_state(&recorder, RecorderState::Error, Duration::from_secs(1)).await;

    match recorder.take_artifact(Duration::from_millis(20)).await {
        Err(RecorderError::Hardware(msg)) => assert_eq!(msg, "microphone unplugged"),
        other => panic!("expected hardware error, got {:?}", other),
    }
    // consuming the failure resets the controller for an explicit retry
    assert_eq!(recorder.state(), RecorderState::Idle);
}

#[tokio::test]
async fn test_scripted_stop_error() {
    let device = Arc::new(PipeDevice::new());
    device.script(PipeOutcome::Error("encoder failed".to_string()));
    let recorder = Recorder::new(device);

    recorder.start(short_config(30)).await.unwrap();
    wait_for_state(&recorder, RecorderState::Recording, Duration::from_secs(1)).await;

    recorder.stop().await.unwrap();
    wait_for_state(&recorder, RecorderState::Error, Duration::from_secs(1)).await;
}

#[tokio::test]
async fn test_permission_denied_stays_idle() {
    let device = Arc::new(
        PipeDevice::new()
            .with_permission(false)
            .with_grant_on_request(false),
    );
    let recorder = Recorder::new(device);

    match recorder.start(short_config(30)).await {
        Err(RecorderError::PermissionDenied) => {}
        other => panic!("expected PermissionDenied, got {:?}", other.err()),
    }
    assert_eq!(recorder.state(), RecorderState::Idle);
}

#[tokio::test]
async fn test_interactive_grant_allows_start() {
    let device = Arc::new(PipeDevice::new().with_permission(false));
    let recorder = Recorder::new(device);

    recorder.start(short_config(30)).await.unwrap();
    wait_for_state(&recorder, RecorderState::Recording, Duration::from_secs(1)).await;
    recorder.stop().await.unwrap();
}

#[tokio::test]
async fn test_artifact_delivered_after_settling_delay() {
    let device = Arc::new(PipeDevice::new().with_stop_delay(Duration::from_millis(300)));
    device.script(PipeOutcome::Artifact(Duration::from_secs(5)));
    let recorder = Recorder::new(device);

    recorder.start(short_config(30)).await.unwrap();
    wait_for_state(&recorder, RecorderState::Recording, Duration::from_secs(1)).await;
    recorder.stop().await.unwrap();

    // the settling delay covers the device's late artifact delivery
    let artifact = recorder
        .take_artifact(Duration::from_millis(600))
        .await
        .unwrap();
    assert_eq!(artifact.duration, Duration::from_secs(5));
}

#[tokio::test]
async fn test_silent_stop_yields_no_artifact() {
    let device = Arc::new(PipeDevice::new());
    device.script(PipeOutcome::Silent);
    let recorder = Recorder::new(device);

    recorder.start(short_config(30)).await.unwrap();
    wait_for_state(&recorder, RecorderState::Recording, Duration::from_secs(1)).await;
    recorder.stop().await.unwrap();

    match recorder.take_artifact(Duration::from_millis(100)).await {
        Err(RecorderError::NoArtifact) => {}
        other => panic!("expected NoArtifact, got {:?}", other),
    }
}

#[tokio::test]
async fn test_shutdown_during_recording() {
    let device = Arc::new(PipeDevice::new());
    let recorder = Recorder::new(device);

    recorder.start(short_config(30)).await.unwrap();
    wait_for_state(&recorder, RecorderState::Recording, Duration::from_secs(1)).await;

    recorder.shutdown().await;
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(recorder.session().elapsed_secs, 0);
    assert!(recorder.session().last_artifact.is_none());
}

#[tokio::test]
async fn test_restart_after_artifact_consumed() {
    let device = Arc::new(PipeDevice::new());
    device.script(PipeOutcome::Artifact(Duration::from_secs(3)));
    device.script(PipeOutcome::Artifact(Duration::from_secs(4)));
    let recorder = Recorder::new(device);

    recorder.start(short_config(30)).await.unwrap();
    wait_for_state(&recorder, RecorderState::Recording, Duration::from_secs(1)).await;
    recorder.stop().await.unwrap();
    let first = recorder.take_artifact(Duration::from_millis(50)).await.unwrap();
    assert_eq!(first.duration, Duration::from_secs(3));

    recorder.start(short_config(30)).await.unwrap();
    wait_for_state(&recorder, RecorderState::Recording, Duration::from_secs(1)).await;
    recorder.stop().await.unwrap();
    let second = recorder.take_artifact(Duration::from_millis(50)).await.unwrap();
    assert_eq!(second.duration, Duration::from_secs(4));
}
