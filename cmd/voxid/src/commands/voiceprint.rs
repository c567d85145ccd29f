//! Voiceprint commands: enroll, verify, history.

use std::path::PathBuf;

use anyhow::bail;
use clap::Args;

use voxid_workflow::{
    EnrollmentFlow, StartOutcome, VerificationFlow, VerifyResolution, SAMPLE_COUNT,
};

use super::{build_client, wait_recording, wav_recorder};
use crate::Cli;

/// Register a voiceprint from three audio samples.
#[derive(Args)]
pub struct EnrollCommand {
    /// WAV sample, one per enrollment slot (pass three times, in order)
    #[arg(long = "audio")]
    pub audio: Vec<PathBuf>,
}

impl EnrollCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        if self.audio.len() != SAMPLE_COUNT {
            bail!(
                "enrollment needs exactly {} samples, got {}",
                SAMPLE_COUNT,
                self.audio.len()
            );
        }

        let client = build_client(cli)?;
        let recorder = wav_recorder(self.audio.clone());
        let flow = EnrollmentFlow::new(client, recorder.clone());

        for index in 0..SAMPLE_COUNT {
            println!("sample {}: \"{}\"", index + 1, flow.current_prompt());

            flow.start_sample().await?;
            wait_recording(&recorder).await?;
            let sample = flow.finish_sample().await?;
            println!(
                "  uploaded {} ({:.1} s)",
                sample.file_path,
                sample.duration.as_secs_f64()
            );

            flow.advance().await?;
        }

        println!("voiceprint registered");
        Ok(())
    }
}

/// Verify a recording against the registered voiceprint.
#[derive(Args)]
pub struct VerifyCommand {
    /// WAV recording to verify
    #[arg(long)]
    pub audio: PathBuf,
}

impl VerifyCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let client = build_client(cli)?;
        let recorder = wav_recorder(vec![self.audio.clone()]);
        let flow = VerificationFlow::new(client, recorder.clone());

        match flow.start().await? {
            StartOutcome::NotEnrolled => {
                println!("no voiceprint registered; run `voxid enroll` first");
                return Ok(());
            }
            StartOutcome::Recording => {}
        }
        wait_recording(&recorder).await?;

        match flow.finish().await? {
            VerifyResolution::Matched {
                user_name,
                confidence,
                ..
            } => {
                println!(
                    "verified: {} (confidence {:.1}%)",
                    user_name.as_deref().unwrap_or("unknown user"),
                    confidence * 100.0
                );
            }
            VerifyResolution::Rejected { reason } => {
                println!("verification failed: {}", reason);
            }
        }
        Ok(())
    }
}

/// Show recent verification history.
#[derive(Args)]
pub struct HistoryCommand {
    /// Maximum entries to show
    #[arg(long, default_value_t = 5)]
    pub limit: usize,
}

impl HistoryCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let client = build_client(cli)?;
        let history = client.voiceprint().history().await?;

        if history.is_empty() {
            println!("no verification history");
            return Ok(());
        }
        for entry in history.iter().take(self.limit) {
            println!(
                "{}  {}  confidence {:.1}%",
                entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                if entry.matched { "matched" } else { "no match" },
                entry.confidence * 100.0
            );
        }
        Ok(())
    }
}
