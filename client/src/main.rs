mod game;
mod ghost;
mod movement;
mod network;

use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Display name shown to other players
    #[arg(short = 'n', long, default_value = "Player")]
    name: String,

    /// Run the scripted participant (select, place, race) with no frontend
    #[arg(long, default_value = "false")]
    scripted: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);

    let mut client = network::Client::new(&args.server, &args.name, args.scripted).await?;

    client.run().await?;

    Ok(())
}
