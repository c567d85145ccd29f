//! Shared command plumbing.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};

use voxid_api::{Client, DEFAULT_BASE_URL};
use voxid_recorder::{Recorder, RecorderState, WavFileDevice};
use voxid_store::RedbStore;

use crate::Cli;

/// Resolves the data directory (default ~/.voxid).
pub(crate) fn home_dir(cli: &Cli) -> anyhow::Result<PathBuf> {
    match &cli.home {
        Some(home) => Ok(PathBuf::from(home)),
        None => dirs::home_dir()
            .map(|home| home.join(".voxid"))
            .ok_or_else(|| anyhow!("cannot determine home directory")),
    }
}

/// Builds a client with a persistent session store under the data
/// directory.
pub(crate) fn build_client(cli: &Cli) -> anyhow::Result<Arc<Client>> {
    let home = home_dir(cli)?;
    std::fs::create_dir_all(&home)
        .with_context(|| format!("creating {}", home.display()))?;

    let store = RedbStore::open(home.join("session.redb"))?;
    let base_url = cli
        .base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let client = Client::builder(base_url).store(Arc::new(store)).build()?;
    Ok(Arc::new(client))
}

/// Builds a recorder that replays the given WAV files in order.
pub(crate) fn wav_recorder(sources: Vec<PathBuf>) -> Arc<Recorder> {
    Arc::new(Recorder::new(Arc::new(WavFileDevice::playlist(sources))))
}

/// Waits until the controller reports an active recording.
pub(crate) async fn wait_recording(recorder: &Recorder) -> anyhow::Result<()> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while recorder.state() != RecorderState::Recording {
        if recorder.state() == RecorderState::Error {
            return Err(anyhow!("recording failed to start"));
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(anyhow!("recording never started"));
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    Ok(())
}
