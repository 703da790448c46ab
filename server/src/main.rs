use clap::Parser;
use log::error;
use server::config::SessionConfig;
use server::network::Server;
use shared::{Vec3, DEFAULT_FINISH_SCORE, DEFAULT_ROUND_SECS};

/// Authoritative session server for the round-based item-placement game.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Maximum number of concurrent clients
    #[clap(short, long, default_value = "8")]
    max_clients: usize,
    /// Star count at which a player wins the game
    #[clap(long, default_value_t = DEFAULT_FINISH_SCORE)]
    finish_score: u32,
    /// Round duration in seconds
    #[clap(long, default_value_t = DEFAULT_ROUND_SECS)]
    round_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let config = SessionConfig {
        finish_score: args.finish_score,
        round_secs: args.round_secs,
        spawn_points: vec![
            Vec3::new(-6.0, 1.0, 0.0),
            Vec3::new(-2.0, 1.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(6.0, 1.0, 0.0),
        ],
        static_geometry: Vec::new(),
    };

    let addr = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&addr, config, args.max_clients).await?;

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
