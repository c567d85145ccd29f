//! voxid CLI - voiceprint enrollment, verification, and emotion
//! analysis from the command line.

use clap::{Parser, Subcommand};

mod commands;

use commands::{
    EmotionCommand, EnrollCommand, HistoryCommand, LoginCommand, VerifyCommand,
};

/// voxid CLI - voiceprint identity and emotion analysis client.
///
/// Audio is supplied as prepared WAV files in place of a microphone.
/// Session state is stored in ~/.voxid/ so a login survives restarts.
#[derive(Parser)]
#[command(name = "voxid")]
#[command(about = "voxid voiceprint identity CLI")]
#[command(version)]
pub struct Cli {
    /// Service base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Data directory (default is ~/.voxid)
    #[arg(long, global = true)]
    pub home: Option<String>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with a platform login code
    Login(LoginCommand),
    /// Drop the stored session
    Logout,
    /// Show session and enrollment status
    Status,
    /// Register a voiceprint from three audio samples
    Enroll(EnrollCommand),
    /// Verify a recording against the registered voiceprint
    Verify(VerifyCommand),
    /// Run emotion analysis on a recording
    Emotion(EmotionCommand),
    /// Show recent verification history
    History(HistoryCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .init();
    }

    match &cli.command {
        Commands::Login(cmd) => cmd.run(&cli).await,
        Commands::Logout => commands::logout(&cli).await,
        Commands::Status => commands::status(&cli).await,
        Commands::Enroll(cmd) => cmd.run(&cli).await,
        Commands::Verify(cmd) => cmd.run(&cli).await,
        Commands::Emotion(cmd) => cmd.run(&cli).await,
        Commands::History(cmd) => cmd.run(&cli).await,
    }
}
