use clap::Parser;
use client::ai::Archetype;
use client::collaborators::Collaborators;
use client::config::{ClientConfig, InterpolationConfig};
use client::dispatch::DEFAULT_QUEUE_CAPACITY;
use client::network::Client;
use log::info;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server host to connect to
    #[arg(long, default_value = shared::DEFAULT_HOST)]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Player id sent on login
    #[arg(short = 'i', long, default_value = "player")]
    player_id: String,

    /// Character template sent on login
    #[arg(long, default_value = "0")]
    template: i32,

    /// Simulation ticks per second
    #[arg(short, long, default_value = "60")]
    tick_rate: u32,

    /// Monster AI: server-driven, grunt or boss
    #[arg(short, long, default_value = "server-driven")]
    archetype: Archetype,

    /// Seed for stage-based attack shuffles
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds spent blending toward each server position
    #[arg(long, default_value = "0.2")]
    blend: f32,

    /// Capacity of the network-to-simulation queue
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Stop instead of reconnecting when the server goes away
    #[arg(long)]
    no_reconnect: bool,

    /// Seconds to wait before each reconnect attempt
    #[arg(long, default_value = "2")]
    reconnect_delay: u64,
}

impl Args {
    fn into_config(self) -> ClientConfig {
        ClientConfig {
            host: self.host,
            port: self.port,
            player_id: self.player_id,
            player_template: self.template,
            tick_rate: self.tick_rate,
            queue_capacity: self.queue_capacity,
            reconnect: !self.no_reconnect,
            reconnect_delay: Duration::from_secs(self.reconnect_delay),
            archetype: self.archetype,
            stage_seed: self.seed,
            interpolation: InterpolationConfig {
                blend_duration: self.blend,
                ..Default::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = Args::parse().into_config();
    config.validate()?;

    info!("Starting client...");
    info!("Connecting to: {}", config.address());
    info!("Player: {} (template {})", config.player_id, config.player_template);
    info!("Monster AI: {}", config.archetype);
    if let Some(seed) = config.stage_seed {
        info!("Stage shuffle seed: {}", seed);
    }

    let mut client = Client::new(config, Collaborators::logging()).await?;
    client.run().await?;

    Ok(())
}
