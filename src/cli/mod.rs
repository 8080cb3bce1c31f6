use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};

use crate::config;
use crate::domain::ids::{GroupId, UserId};
use crate::engine::facade::Aggregator;
use crate::source::{Credential, export::LibraryExport};
use crate::storage::db::i64_seconds_to_local_time;
use crate::storage::sqlite::SqliteRepository;

#[derive(Parser)]
#[command(name = "commontracks")]
#[command(version = "0.1")]
#[command(about = "Find the saved tracks a group of listeners has in common")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register the user behind a credential
    Register {
        #[arg(long)]
        credential: String,
    },
    /// Re-collect the saved tracks of the user behind a credential
    Refresh {
        #[arg(long)]
        credential: String,
    },
    /// Create a group with the credential's user as first member
    CreateGroup {
        #[arg(long)]
        credential: String,
        #[arg(long)]
        name: String,
    },
    /// Add a user to a group
    Join {
        #[arg(long)]
        user: String,
        #[arg(long)]
        group: String,
    },
    /// Print the tracks every member of a group has saved
    Common {
        #[arg(long)]
        group: String,
    },
    /// Show a user record
    User {
        #[arg(long)]
        user: String,
    },
    /// Show a group record
    Group {
        #[arg(long)]
        group: String,
    },
}

fn open_export(cfg: &config::Config, credential: &Credential) -> anyhow::Result<LibraryExport> {
    LibraryExport::load(&cfg.source.exports_dir, credential)
        .with_context(|| "failed to open library export")
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::Config::load(&cli.config.to_string_lossy())?;
    let repo = SqliteRepository::new(&cfg.database).with_context(|| "failed to open database")?;
    let aggregator = Aggregator::from_config(Arc::new(repo), &cfg);

    match &cli.command {
        Commands::Register { credential } => {
            let credential = Credential::new(credential.as_str());
            let export = open_export(&cfg, &credential)?;
            let user = aggregator.register(&credential, &export)?;
            println!("Registered {user}");
        }

        Commands::Refresh { credential } => {
            let credential = Credential::new(credential.as_str());
            let export = open_export(&cfg, &credential)?;
            let count = aggregator.refresh_library(&credential, &export, &export)?;
            println!("Collected {count} saved tracks");
        }

        Commands::CreateGroup { credential, name } => {
            let credential = Credential::new(credential.as_str());
            let export = open_export(&cfg, &credential)?;
            let group = aggregator.create_group(&credential, &export, name)?;
            println!("{group}");
        }

        Commands::Join { user, group } => {
            let (user, group) = (UserId::from(user.as_str()), GroupId::from(group.as_str()));
            aggregator.join_group(&user, &group)?;
            println!("{user} is a member of {group}");
        }

        Commands::Common { group } => {
            let playlist = aggregator.combined_playlist(&GroupId::from(group.as_str()))?;

            println!(
                "{} ({}): {} common tracks",
                playlist.name,
                playlist.group_id,
                playlist.tracks.len()
            );
            for track in &playlist.tracks {
                println!("    - {} [{}]", track.display_name(), track.id);
            }
        }

        Commands::User { user } => {
            let user = aggregator.user(&UserId::from(user.as_str()))?;

            println!("User: {}", user.id);
            match user.refreshed_at {
                Some(secs) => println!(
                    "  {} saved tracks, refreshed {}",
                    user.saved_tracks.len(),
                    i64_seconds_to_local_time(secs)?
                ),
                None => println!("  library never collected"),
            }

            let mut groups = user.groups.iter().collect::<Vec<_>>();
            groups.sort();
            for group in groups {
                println!("    - group {group}");
            }
        }

        Commands::Group { group } => {
            let group = aggregator.group(&GroupId::from(group.as_str()))?;

            println!("Group: {} ({})", group.name, group.id);
            let mut members = group.members.iter().collect::<Vec<_>>();
            members.sort();
            for member in members {
                println!("    - {member}");
            }
        }
    }

    Ok(())
}
