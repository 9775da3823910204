// SPDX-FileCopyrightText: The cratedigger authors
// SPDX-License-Identifier: MPL-2.0

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use cratedigger::{
    Backend as _, BuilderSession, CrateId, CrateStore, Criteria, LibraryClient,
};

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8416/api";

const DEFAULT_COLOR: &str = "#3366ff";

const DEFAULT_ICON: &str = "disc";

#[derive(Debug, Subcommand)]
enum Command {
    /// List all crates with their track counts.
    List,
    /// List the tracks currently matching a crate.
    Tracks(TracksArgs),
    /// Count the tracks matching a criteria file without saving anything.
    Preview(PreviewArgs),
    /// Create a new smart crate from a criteria file.
    Create(CreateArgs),
    /// Update an existing smart crate.
    Update(UpdateArgs),
    /// Delete a crate.
    Delete(DeleteArgs),
    /// Re-evaluate a smart crate's membership.
    Refresh(RefreshArgs),
}

#[derive(Debug, Parser)]
struct TracksArgs {
    /// Crate identifier.
    #[arg(long)]
    crate_id: String,
}

#[derive(Debug, Parser)]
struct PreviewArgs {
    /// Path of a JSON file with the criteria payload.
    ///
    /// Example: {"logic":"AND","rules":[{"field":"tempo","operator":"range","value":[120,130]}]}
    #[arg(long)]
    criteria_file: PathBuf,
}

#[derive(Debug, Parser)]
struct CreateArgs {
    /// Display name of the new crate.
    #[arg(long)]
    name: String,

    #[arg(long)]
    description: Option<String>,

    #[arg(long, default_value = DEFAULT_COLOR)]
    color: String,

    #[arg(long, default_value = DEFAULT_ICON)]
    icon: String,

    /// Path of a JSON file with the criteria payload.
    #[arg(long)]
    criteria_file: PathBuf,
}

#[derive(Debug, Parser)]
struct UpdateArgs {
    /// Crate identifier.
    #[arg(long)]
    crate_id: String,

    /// New display name.
    #[arg(long)]
    name: Option<String>,

    /// Path of a JSON file with the new criteria payload.
    #[arg(long)]
    criteria_file: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct DeleteArgs {
    /// Crate identifier.
    #[arg(long)]
    crate_id: String,
}

#[derive(Debug, Parser)]
struct RefreshArgs {
    /// Crate identifier.
    #[arg(long)]
    crate_id: String,
}

#[derive(Debug, Parser)]
struct Args {
    /// Base URL of the music-library server.
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    server_url: String,

    #[clap(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let Args {
        server_url,
        command,
    } = Args::parse();

    let client = LibraryClient::new(server_url).context("Failed to create client")?;
    log::info!("Server: {base_url}", base_url = client.base_url());

    match command {
        Command::List => {
            list_crates(&client).await?;
        }
        Command::Tracks(TracksArgs { crate_id }) => {
            list_crate_tracks(&client, &CrateId::new(crate_id)).await?;
        }
        Command::Preview(PreviewArgs { criteria_file }) => {
            preview_criteria(&client, &criteria_file).await?;
        }
        Command::Create(args) => {
            create_crate(&client, args).await?;
        }
        Command::Update(args) => {
            update_crate(&client, args).await?;
        }
        Command::Delete(DeleteArgs { crate_id }) => {
            let store = CrateStore::new();
            store.refresh(&client).await?;
            store.delete(&client, &CrateId::new(crate_id)).await?;
            log::info!(
                "Deleted crate: {remaining} crate(s) remaining",
                remaining = store.snapshot().crates.len()
            );
        }
        Command::Refresh(RefreshArgs { crate_id }) => {
            let id = CrateId::new(crate_id);
            let store = CrateStore::new();
            store.refresh_smart(&client, &id).await?;
            store.select(Some(id));
            let snapshot = store.snapshot();
            if let Some(refreshed) = snapshot.selected_crate() {
                log::info!(
                    "Refreshed crate \"{name}\": {track_count} track(s)",
                    name = refreshed.name,
                    track_count = refreshed.track_count
                );
            }
        }
    }

    Ok(())
}

fn load_criteria(file_path: &Path) -> anyhow::Result<Criteria> {
    let payload = std::fs::read_to_string(file_path).with_context(|| {
        format!(
            "Failed to read criteria file \"{file_path}\"",
            file_path = file_path.display()
        )
    })?;
    let payload = serde_json::from_str(&payload).context("Malformed criteria file")?;
    Criteria::from_payload(payload).context("Malformed criteria payload")
}

async fn list_crates(client: &LibraryClient) -> anyhow::Result<()> {
    let store = CrateStore::new();
    store.refresh(client).await?;
    let snapshot = store.snapshot();
    log::info!("{count} crate(s)", count = snapshot.crates.len());
    for persisted in &snapshot.crates {
        log::info!(
            "{id}: \"{name}\" ({track_count} track(s), {rule_count} rule(s))",
            id = persisted.id,
            name = persisted.name,
            track_count = persisted.track_count,
            rule_count = persisted.criteria.rules.len()
        );
    }
    Ok(())
}

async fn list_crate_tracks(client: &LibraryClient, id: &CrateId) -> anyhow::Result<()> {
    let tracks = client.crate_tracks(id).await?;
    log::info!("{count} track(s) in crate {id}", count = tracks.len());
    for track in &tracks {
        log::info!(
            "{id}: \"{title}\" by \"{artist}\"",
            id = track.id,
            title = track.title.as_deref().unwrap_or_default(),
            artist = track.artist.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}

async fn preview_criteria(client: &LibraryClient, criteria_file: &Path) -> anyhow::Result<()> {
    let criteria = load_criteria(criteria_file)?;
    // Mirror the builder session's short circuit for empty criteria.
    let count = if criteria.is_empty() {
        0
    } else {
        client.preview_count(&criteria).await?
    };
    log::info!("{count} track(s) match");
    Ok(())
}

async fn create_crate(client: &LibraryClient, args: CreateArgs) -> anyhow::Result<()> {
    let CreateArgs {
        name,
        description,
        color,
        icon,
        criteria_file,
    } = args;
    let criteria = load_criteria(&criteria_file)?;

    let mut session = BuilderSession::open();
    session.set_name(name);
    session.set_description(description);
    session.set_color(color);
    session.set_icon(icon);
    session.replace_criteria(criteria);

    let saved = session.save(client).await?;
    log::info!(
        "Created crate {id}: \"{name}\"",
        id = saved.id,
        name = saved.name
    );
    Ok(())
}

async fn update_crate(client: &LibraryClient, args: UpdateArgs) -> anyhow::Result<()> {
    let UpdateArgs {
        crate_id,
        name,
        criteria_file,
    } = args;
    let id = CrateId::new(crate_id);

    let crates = client.list_crates().await?;
    let persisted = crates
        .iter()
        .find(|persisted| persisted.id == id)
        .with_context(|| format!("No crate with id {id}"))?;

    let mut session = BuilderSession::edit(persisted);
    if let Some(name) = name {
        session.set_name(name);
    }
    if let Some(criteria_file) = criteria_file {
        session.replace_criteria(load_criteria(&criteria_file)?);
    }

    let saved = session.save(client).await?;
    log::info!(
        "Updated crate {id}: \"{name}\"",
        id = saved.id,
        name = saved.name
    );
    Ok(())
}
