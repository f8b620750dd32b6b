use std::net::{Ipv4Addr, SocketAddr};

use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use dropfour_netd::{ServerConfig, bind_and_run};

/// Dropfour room relay
#[derive(Parser, Debug)]
#[command(name = "dropfour-netd")]
#[command(about = "Two-player room relay for dropfour", long_about = None)]
struct Args {
    /// TCP port to listen on (all interfaces)
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Maximum number of simultaneously active rooms
    #[arg(
        long,
        env = "GAMES_LIMIT",
        default_value_t = 20,
        value_parser = clap::value_parser!(u16).range(1..=10_000)
    )]
    games_limit: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, args.port));
    info!("Log level: {}", args.log_level);

    let config = ServerConfig {
        games_limit: usize::from(args.games_limit),
    };
    bind_and_run(addr, config).await
}
