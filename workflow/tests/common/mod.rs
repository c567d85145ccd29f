//! Shared fixture: pipe transport + pipe device + signed-in client.

use std::sync::Arc;
use std::time::Duration;

use voxid_api::{Client, Identity, PipeTransport};
use voxid_recorder::{PipeDevice, Recorder, RecorderState};
use voxid_store::MemoryStore;

pub struct Fixture {
    pub transport: Arc<PipeTransport>,
    pub device: Arc<PipeDevice>,
    pub client: Arc<Client>,
    pub recorder: Arc<Recorder>,
}

pub fn fixture() -> Fixture {
    let transport = PipeTransport::new();
    let client = Client::builder("http://svc.test/api")
        .transport(transport.clone())
        .store(Arc::new(MemoryStore::new()))
        .build()
        .unwrap();
    client
        .session()
        .set(
            "tok-flow".to_string(),
            Identity {
                id: Some("u-1".to_string()),
                nick_name: "Ada".to_string(),
                avatar_url: None,
            },
        )
        .unwrap();

    let device = Arc::new(PipeDevice::new());
    let recorder = Arc::new(Recorder::new(device.clone()));

    Fixture {
        transport,
        device,
        client: Arc::new(client),
        recorder,
    }
}

/// Waits until the controller reports an active recording.
pub async fn wait_recording(recorder: &Recorder) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while recorder.state() != RecorderState::Recording {
        if tokio::time::Instant::now() >= deadline {
            panic!("recorder never reached recording state");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub const TEST_SETTLE: Duration = Duration::from_millis(50);
