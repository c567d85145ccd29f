//! Session commands: login, logout, status.

use clap::Args;

use voxid_api::WxProfile;

use super::build_client;
use crate::Cli;

/// Sign in with a platform login code.
#[derive(Args)]
pub struct LoginCommand {
    /// Platform login code
    #[arg(long)]
    pub code: String,

    /// Display name for the profile
    #[arg(long)]
    pub name: String,

    /// Avatar URL
    #[arg(long)]
    pub avatar: Option<String>,
}

impl LoginCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let client = build_client(cli)?;
        let profile = WxProfile {
            nick_name: self.name.clone(),
            avatar_url: self.avatar.clone(),
        };
        let identity = client.auth().login(&self.code, &profile).await?;
        println!("signed in as {}", identity.nick_name);
        Ok(())
    }
}

pub async fn logout(cli: &Cli) -> anyhow::Result<()> {
    let client = build_client(cli)?;
    client.auth().logout();
    println!("signed out");
    Ok(())
}

pub async fn status(cli: &Cli) -> anyhow::Result<()> {
    let client = build_client(cli)?;

    let session = client.session().snapshot();
    match &session.identity {
        Some(identity) => println!("signed in as {}", identity.nick_name),
        None if session.is_authenticated() => println!("signed in"),
        None => {
            println!("not signed in");
            return Ok(());
        }
    }

    if !client.auth().validate().await? {
        println!("session expired, sign in again");
        return Ok(());
    }

    let status = client.voiceprint().status().await?;
    if status.registered {
        println!("voiceprint: registered");
    } else {
        println!("voiceprint: not registered");
    }
    Ok(())
}
