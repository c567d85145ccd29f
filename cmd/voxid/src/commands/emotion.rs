//! Emotion analysis command.

use std::path::PathBuf;

use clap::Args;

use voxid_workflow::EmotionFlow;

use super::{build_client, wait_recording, wav_recorder};
use crate::Cli;

/// Run emotion analysis on a recording.
#[derive(Args)]
pub struct EmotionCommand {
    /// WAV recording to analyze
    #[arg(long)]
    pub audio: PathBuf,

    /// Subject identifier to tag the submission with
    #[arg(long)]
    pub subject: Option<String>,
}

impl EmotionCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let client = build_client(cli)?;
        let recorder = wav_recorder(vec![self.audio.clone()]);

        let mut flow = EmotionFlow::new(client, recorder.clone());
        if let Some(subject) = &self.subject {
            flow = flow.with_subject(subject.clone());
        }

        flow.start().await?;
        wait_recording(&recorder).await?;

        match flow.finish().await? {
            Some(report) => {
                println!(
                    "dominant emotion: {} (confidence {:.1}%)",
                    report.dominant_emotion,
                    report.confidence * 100.0
                );
                for (emotion, probability) in report.ranked_probabilities() {
                    println!("  {:<10} {:>5.1}%", emotion, probability * 100.0);
                }
                println!("audio quality: {:.0}%", report.quality_score * 100.0);
            }
            None => {
                println!(
                    "analysis failed: {}",
                    flow.failure().unwrap_or_else(|| "unknown error".to_string())
                );
            }
        }
        Ok(())
    }
}
