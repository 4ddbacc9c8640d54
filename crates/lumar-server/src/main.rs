use std::time::Duration;

use lumar_server::config::ServerConfig;
use lumar_server::server::{ConsoleAction, LumarServer};
use tokio::io::AsyncBufReadExt;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match ServerConfig::load("server.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load server.toml: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "Lumar server v{} ({}) starting, {} tick(s)/s",
        env!("CARGO_PKG_VERSION"),
        config.server.name,
        config.server.tick_rate
    );
    info!("Storage: {}", config.storage.directory);
    for world in &config.worlds {
        info!(
            "World: {} (seed: {}, on Lumar: {})",
            world.name,
            world.world_seed().value(),
            world.planet
        );
    }

    let mut server = match LumarServer::open(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open storage: {e}");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

    // Handle Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    // Console REPL: read lines from stdin
    let (console_tx, mut console_rx) = tokio::sync::mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let tick_period = Duration::from_micros(1_000_000 / config.server.tick_rate as u64);
    let mut tick_interval = tokio::time::interval(tick_period);
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                server.tick_all();
            }
            Some(line) = console_rx.recv() => {
                match server.handle_console_command(&line) {
                    ConsoleAction::Reply(reply) => {
                        if !reply.is_empty() {
                            info!("{reply}");
                        }
                    }
                    ConsoleAction::Stop => {
                        info!("Stop requested from console");
                        break;
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    info!("Saving worlds before shutdown...");
    server.save_all();
    info!("Server shut down.");
}
