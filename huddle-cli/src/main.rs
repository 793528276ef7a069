use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::*;
use huddle::client::{
    Collaborators, ConnectionState, CoordinatorConfig, CoordinatorHandle, EarlyCandidatePolicy,
    RemoteMedia, RoomObserver, SilenceSource, TransportConfig, WebRtcTransportFactory,
};
use huddle::model::IceServerConfig;
use huddle::store::{MemoryDatabase, RoomPaths};
use huddle::{PeerId, RoomId};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "huddle")]
#[command(about = "Audio rooms over a realtime store rendezvous")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run several peers against an in-process store and let them mesh.
    Simulate {
        #[arg(short, long, default_value = "lobby")]
        room: String,

        #[arg(short, long, default_value_t = 3)]
        peers: usize,

        /// STUN/TURN url; repeatable. Defaults to the public Google STUN server.
        #[arg(long = "ice-server")]
        ice_servers: Vec<String>,

        #[arg(long, requires = "ice_credential")]
        ice_username: Option<String>,

        #[arg(long, requires = "ice_username")]
        ice_credential: Option<String>,

        /// Queue candidates that arrive before their session can use them.
        #[arg(long)]
        buffer_early_candidates: bool,

        /// How long to keep the room up before everyone leaves.
        #[arg(long, default_value_t = 5)]
        hold_secs: u64,
    },

    /// Print the store paths a peer reads and writes in a room.
    Layout {
        #[arg(short, long)]
        room: String,

        #[arg(short, long)]
        peer: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,huddle_client=info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Simulate {
            room,
            peers,
            ice_servers,
            ice_username,
            ice_credential,
            buffer_early_candidates,
            hold_secs,
        } => {
            let room = parse_room(&room)?;
            let ice_servers = build_ice_servers(ice_servers, ice_username, ice_credential);
            let early_candidates = if buffer_early_candidates {
                EarlyCandidatePolicy::Buffer
            } else {
                EarlyCandidatePolicy::Drop
            };
            let config = CoordinatorConfig::default()
                .with_transport(TransportConfig { ice_servers })
                .with_early_candidates(early_candidates);

            simulate(room, peers, config, Duration::from_secs(hold_secs)).await?;
        }

        Commands::Layout { room, peer } => {
            let room = parse_room(&room)?;
            let peer = peer.map(PeerId::from).unwrap_or_default();
            print_layout(&room, &peer);
        }
    }

    Ok(())
}

fn parse_room(raw: &str) -> Result<RoomId> {
    RoomId::parse(raw).with_context(|| format!("Invalid room id '{}'", raw))
}

fn build_ice_servers(
    urls: Vec<String>,
    username: Option<String>,
    credential: Option<String>,
) -> Vec<IceServerConfig> {
    if urls.is_empty() {
        return TransportConfig::default().ice_servers;
    }

    urls.into_iter()
        .map(|url| match (&username, &credential) {
            (Some(user), Some(pass)) if url.starts_with("turn") => {
                IceServerConfig::turn(url, user.clone(), pass.clone())
            }
            _ => IceServerConfig::stun(url),
        })
        .collect()
}

async fn simulate(
    room: RoomId,
    count: usize,
    config: CoordinatorConfig,
    hold: Duration,
) -> Result<()> {
    println!(
        "{}",
        format!("Simulating {} peer(s) in room '{}'", count, room)
            .green()
            .bold()
    );

    let db = MemoryDatabase::new();
    let transports = Arc::new(WebRtcTransportFactory::new());
    let media = Arc::new(SilenceSource::new());

    let mut handles = Vec::with_capacity(count);
    for index in 0..count {
        let (handle, _task) = CoordinatorHandle::spawn(
            Collaborators {
                store: Arc::new(db.connect()),
                transports: transports.clone(),
                media: media.clone(),
                observer: Arc::new(ConsoleObserver::new(index)),
            },
            config.clone(),
        );

        let id = handle.join_room(room.clone()).await?;
        println!("{} {} joined as {}", label(index), "+".green(), id);
        handles.push(handle);
    }

    let deadline = tokio::time::Instant::now() + hold;
    while tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_secs(1)).await;
        for (index, handle) in handles.iter().enumerate() {
            let snapshot = handle.snapshot().await?;
            let connected = snapshot
                .sessions
                .values()
                .filter(|s| s.connection == ConnectionState::Connected)
                .count();
            println!(
                "{} {} session(s), {} connected, {} pending candidate(s)",
                label(index),
                snapshot.sessions.len(),
                connected,
                snapshot.pending_candidates
            );
        }
    }

    for (index, handle) in handles.iter().enumerate() {
        handle.leave_room().await?;
        println!("{} {} left", label(index), "-".red());
    }

    info!("Simulation finished");
    println!("{}", "Done.".green().bold());
    Ok(())
}

fn print_layout(room: &RoomId, peer: &PeerId) {
    let paths = RoomPaths::new(room);

    println!("{}", format!("Room '{}' as {}", room, peer).bold());
    println!("  {:<18} {}", "presence".cyan(), paths.presence(peer));
    println!("  {:<18} {}", "members".cyan(), paths.peers());
    println!("  {:<18} {}", "signal inbox".cyan(), paths.signal_inbox(peer));
    println!("  {:<18} {}", "candidate inbox".cyan(), paths.candidate_inbox(peer));
    println!(
        "  {:<18} {}",
        "offers to X".cyan(),
        paths.signal(&PeerId::from("X"), peer)
    );
    println!(
        "  {:<18} {}",
        "candidates to X".cyan(),
        paths.candidates(&PeerId::from("X"), peer)
    );
}

fn label(index: usize) -> ColoredString {
    format!("[peer {}]", index).yellow()
}

/// Prints presentation events for one simulated peer.
struct ConsoleObserver {
    index: usize,
}

impl ConsoleObserver {
    fn new(index: usize) -> Self {
        Self { index }
    }
}

#[async_trait]
impl RoomObserver for ConsoleObserver {
    async fn on_peer_joined(&self, peer_id: PeerId) {
        println!("{} sees {} join", label(self.index), peer_id);
    }

    async fn on_peer_left(&self, peer_id: PeerId) {
        println!("{} sees {} leave", label(self.index), peer_id);
    }

    async fn on_remote_media(&self, peer_id: PeerId, media: RemoteMedia) {
        println!(
            "{} {} track {} from {}",
            label(self.index),
            "♪".magenta(),
            media.track_id,
            peer_id
        );
    }

    async fn on_connection_state(&self, peer_id: PeerId, state: ConnectionState) {
        let state = match state {
            ConnectionState::Connected => format!("{:?}", state).green(),
            ConnectionState::Failed | ConnectionState::Disconnected => {
                format!("{:?}", state).red()
            }
            _ => format!("{:?}", state).normal(),
        };
        println!("{} link to {} is {}", label(self.index), peer_id, state);
    }
}
