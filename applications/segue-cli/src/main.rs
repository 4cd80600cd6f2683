/// Segue - queue playback from the command line
use anyhow::Context;
use clap::{Parser, Subcommand};
use segue_core::{format_time, AutoplayRule, EndOfItemRule, PlaybackState, QueueItem};
use segue_cli::{CliConfig, CliError, SimulatedBackground, SimulatedEngine};
use segue_playback::{Player, PlayerEvent, RemoteCommand};
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "segue")]
#[command(about = "Sequential media queue player", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "SEGUE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play locations in order through the simulated engine
    Play {
        /// Media locations (URLs or absolute file paths)
        #[arg(required = true)]
        locations: Vec<String>,

        /// Autoplay rule: auto or manual
        #[arg(long)]
        autoplay: Option<String>,

        /// End-of-item rule: play_next, stop or repeat
        #[arg(long)]
        end_rule: Option<String>,

        /// Remote command to send once playback starts (repeatable)
        #[arg(long = "remote")]
        remotes: Vec<String>,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Format a number of seconds as M:SS
    FormatTime {
        /// Seconds
        seconds: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "segue=info,segue_playback=info,segue_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            locations,
            autoplay,
            end_rule,
            remotes,
            json,
        } => {
            let mut config = CliConfig::load(cli.config.as_deref())?;
            apply_overrides(&mut config, autoplay.as_deref(), end_rule.as_deref())?;

            let remotes = remotes
                .iter()
                .map(|command| command.parse::<RemoteCommand>())
                .collect::<Result<Vec<_>, _>>()?;

            play(config, &locations, remotes, json).await?;
        }
        Commands::FormatTime { seconds } => {
            println!("{}", format_time(seconds));
        }
    }

    Ok(())
}

fn apply_overrides(
    config: &mut CliConfig,
    autoplay: Option<&str>,
    end_rule: Option<&str>,
) -> Result<(), CliError> {
    if let Some(value) = autoplay {
        config.playback.autoplay_rule = AutoplayRule::from_str(value)
            .ok_or_else(|| CliError::InvalidArgument(format!("unknown autoplay rule: {}", value)))?;
    }

    if let Some(value) = end_rule {
        config.playback.end_of_item_rule = EndOfItemRule::from_str(value).ok_or_else(|| {
            CliError::InvalidArgument(format!("unknown end-of-item rule: {}", value))
        })?;
    }

    Ok(())
}

async fn play(
    config: CliConfig,
    locations: &[String],
    mut remotes: Vec<RemoteCommand>,
    json: bool,
) -> anyhow::Result<()> {
    let items = locations
        .iter()
        .map(|location| QueueItem::new(location, display_name(location)))
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid media location")?;

    tracing::info!(
        items = items.len(),
        autoplay = config.playback.autoplay_rule.as_str(),
        end_rule = %config.playback.end_of_item_rule,
        "Starting playback"
    );

    let engine = SimulatedEngine::new(config.simulation.clone());
    let background = SimulatedBackground::new(config.simulation.grant_expiry());
    let (player, task) = Player::spawn(
        config.playback.clone(),
        Box::new(engine),
        Box::new(background),
    );
    let mut events = player.subscribe();

    for item in items {
        player.enqueue(item)?;
    }
    player.play()?;

    // Remote commands are sent one per started item, in order
    remotes.reverse();

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    print_event(&event, json)?;

                    if matches!(event, PlayerEvent::DidPlay { .. }) {
                        if let Some(command) = remotes.pop() {
                            player.handle_remote(command)?;
                        }
                    }

                    if let PlayerEvent::StateChanged { new, .. } = event {
                        if matches!(new, PlaybackState::Done | PlaybackState::Stopped) {
                            break;
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event output fell behind");
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    let status = player.status().await?;
    player.shutdown().await?;
    task.await.context("Player task panicked")?;

    if let Some(error) = status.last_error {
        tracing::warn!(%error, "Finished with errors");
    }
    tracing::info!(state = %status.state, "Playback finished");

    Ok(())
}

fn display_name(location: &str) -> String {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(location)
        .to_string()
}

fn print_event(event: &PlayerEvent, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        PlayerEvent::ProgressUpdated { elapsed, progress } => {
            println!(
                "{:<18} {} ({:.0}%)",
                event.name(),
                format_time(*elapsed),
                progress * 100.0
            );
        }
        PlayerEvent::StateChanged { old, new } => {
            println!("{:<18} {} -> {}", event.name(), old, new);
        }
        PlayerEvent::ItemFailed { item, error } => {
            println!("{:<18} {} ({})", event.name(), item, error);
        }
        PlayerEvent::ErrorThrown { error } => {
            println!("{:<18} {}", event.name(), error);
        }
        PlayerEvent::WillPlayItem { item }
        | PlayerEvent::ItemReady { item }
        | PlayerEvent::ItemUnknown { item }
        | PlayerEvent::PlaybackDidEnd { item }
        | PlayerEvent::DidPlay { item }
        | PlayerEvent::DidPause { item } => {
            println!("{:<18} {}", event.name(), item);
        }
        PlayerEvent::DidStop { item } => match item {
            Some(item) => println!("{:<18} {}", event.name(), item),
            None => println!("{}", event.name()),
        },
        PlayerEvent::QueueUpdated | PlayerEvent::PlaybackStalled => {
            println!("{}", event.name());
        }
    }

    Ok(())
}
