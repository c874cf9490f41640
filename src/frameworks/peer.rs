// Headless peer runtime: one relay link, one persistence client and the cooperative peer loop.
//
// Local actions arrive as text lines on stdin, e.g. `fire 1 0`, `reload`, `medkit`.

use crate::domain::PeerId;
use crate::frameworks::config;
use crate::frameworks::server::init_runtime;
use crate::interface_adapters::clients::persistence::PersistenceClient;
use crate::interface_adapters::net::connect;
use crate::interface_adapters::render::TracingSink;
use crate::use_cases::{
    LocalCommand, PeerChannels, PeerSession, ProfileClient, SessionSettings, peer_task,
};

use glam::Vec3;
use std::io::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{Notify, mpsc};

pub async fn run_peer() -> Result<()> {
    init_runtime();

    let peer = PeerId(config::peer_id());
    let session_id = config::session_id();
    let relay_url = config::relay_url();

    let link = connect(&relay_url, &session_id, peer, config::LINK_CHANNEL_CAPACITY)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    tracing::info!(%peer, %session_id, %relay_url, "connected to relay");

    let persistence_url = config::persistence_url();
    let persistence_timeout = config::persistence_timeout();
    let persistence = PersistenceClient::new(persistence_url.clone(), persistence_timeout)
        .map_err(|e| std::io::Error::other(format!("failed to initialize persistence client: {e}")))?;
    tracing::debug!(
        persistence_url = %persistence_url,
        persistence_timeout_ms = persistence_timeout.as_millis(),
        "persistence client configured"
    );

    let (outcomes_tx, outcomes_rx) = mpsc::channel(config::PROFILE_CHANNEL_CAPACITY);
    let profile = ProfileClient::new(Arc::new(persistence), outcomes_tx);

    let (commands_tx, commands_rx) = mpsc::channel(config::COMMAND_CHANNEL_CAPACITY);
    commands_tx
        .send(LocalCommand::SpawnAvatar {
            position: Vec3::ZERO,
        })
        .await
        .map_err(|_| std::io::Error::other("peer loop unavailable"))?;

    let shutdown = Arc::new(Notify::new());
    tokio::spawn(read_commands(commands_tx.clone()));
    tokio::spawn(finish_on_ctrl_c(commands_tx, shutdown.clone()));

    let settings = SessionSettings {
        state_send_interval: config::STATE_SEND_INTERVAL_TICKS,
        ..SessionSettings::default()
    };
    let channels = PeerChannels {
        commands_rx,
        inbound_rx: link.inbound_rx,
        outbound_tx: link.outbound_tx,
        outcomes_rx,
    };

    peer_task(
        PeerSession::new(peer, settings),
        profile,
        TracingSink,
        channels,
        config::TICK_INTERVAL,
        shutdown,
    )
    .await;
    Ok(())
}

async fn finish_on_ctrl_c(commands_tx: mpsc::Sender<LocalCommand>, shutdown: Arc<Notify>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        return;
    }
    tracing::info!("ctrl-c received; submitting statistics");
    let _ = commands_tx.send(LocalCommand::FinishGame).await;
    tokio::time::sleep(config::SHUTDOWN_GRACE).await;
    shutdown.notify_one();
}

async fn read_commands(commands_tx: mpsc::Sender<LocalCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                break;
            }
        };
        match parse_command(&line) {
            Some(command) => {
                if commands_tx.send(command).await.is_err() {
                    break;
                }
            }
            None if line.trim().is_empty() => {}
            None => tracing::warn!(line = %line, "unknown command"),
        }
    }
}

fn parse_command(line: &str) -> Option<LocalCommand> {
    let mut words = line.split_whitespace();
    let name = words.next()?;
    let args: Vec<f32> = words.filter_map(|w| w.parse().ok()).collect();
    let planar = |args: &[f32]| match args {
        [x, z] => Some(Vec3::new(*x, 0.0, *z)),
        _ => None,
    };

    let command = match name {
        "fire" => LocalCommand::Fire {
            direction: planar(&args)?,
        },
        "move" => LocalCommand::Move {
            position: planar(&args)?,
        },
        "enemy" => LocalCommand::SpawnEnemy {
            position: planar(&args)?,
        },
        "reload" => LocalCommand::Reload,
        "medkit" => LocalCommand::UseMedkit,
        "getup" => LocalCommand::SetGettingUp(true),
        "release" => LocalCommand::SetGettingUp(false),
        "coin" => match args.as_slice() {
            [amount] if *amount >= 0.0 => LocalCommand::CollectCoin {
                amount: *amount as u32,
            },
            _ => return None,
        },
        "finish" => LocalCommand::FinishGame,
        "win" => LocalCommand::RecordWin,
        _ => return None,
    };
    Some(command)
}
