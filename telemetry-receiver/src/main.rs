mod area;
mod handle;
mod registry;

use area::Area;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use handle::Report;
use registry::Registry;
use std::{
    net::SocketAddr,
    time::{Duration, Instant},
};
use tokio::net::UdpSocket;
use tracing::{debug, error, info, warn};

/// Tool to receive telemetry records from tracker nodes.
#[derive(Parser)]
struct Cli {
    /// Address to listen on
    #[arg(short, long, default_value = "[::]:5688")]
    listen: SocketAddr,

    /// Format to print received records in
    #[arg(short, long, default_value = "debug-pretty")]
    format: PrintFormat,

    /// Latitude of the centre of the area, in degrees
    #[arg(long, default_value_t = -8.055719, allow_negative_numbers = true)]
    area_latitude: f64,

    /// Longitude of the centre of the area, in degrees
    #[arg(long, default_value_t = -34.950969, allow_negative_numbers = true)]
    area_longitude: f64,

    /// Side of the area, in degrees
    #[arg(long, default_value_t = 0.001)]
    area_size: f64,

    /// Seconds without a record after which a node is considered inactive
    #[arg(long, default_value_t = 60)]
    inactive_timeout: u64,

    /// Seconds between inactivity checks
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    sweep_interval: u64,
}

#[derive(Clone, ValueEnum)]
enum PrintFormat {
    Debug,
    DebugPretty,
    Json,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let socket = match UdpSocket::bind(cli.listen).await {
        Ok(socket) => socket,
        Err(e) => {
            error!("Failed to bind {}: {}", cli.listen, e);
            ::std::process::exit(1);
        }
    };
    info!("Listening on {}", cli.listen);

    let area = Area {
        latitude: cli.area_latitude,
        longitude: cli.area_longitude,
        square_distance: cli.area_size,
    };
    info!("Area: {:?}", area);

    let mut registry = Registry::new(area, Duration::from_secs(cli.inactive_timeout));

    let mut sweep = tokio::time::interval(Duration::from_secs(cli.sweep_interval));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut rx_buffer = [0u8; 128];

    loop {
        tokio::select! {
            received = socket.recv_from(&mut rx_buffer) => match received {
                Ok((len, from)) => handle_datagram(&mut registry, &cli.format, &rx_buffer[..len], from),
                Err(e) => warn!("Receive failed: {e}"),
            },
            _ = sweep.tick() => {
                for id in registry.sweep(Instant::now()) {
                    warn!("Node {} is inactive", id);
                }
            }
            _ = &mut shutdown => {
                print_summary(&registry);
                break;
            }
        }
    }
}

fn handle_datagram(registry: &mut Registry, format: &PrintFormat, datagram: &[u8], from: SocketAddr) {
    debug!("Received {} bytes from {}: {:?}", datagram.len(), from, datagram);

    let received = match handle::receive(registry, datagram, from, Instant::now(), Utc::now()) {
        Ok(received) => received,
        Err(e) => {
            warn!("Failed to parse record from {}: {e}", from);
            return;
        }
    };

    let id = received.node;
    let Some(status) = registry.get(&id) else {
        return;
    };

    if received.reserved_seqno {
        warn!("Node {} sent a record with reserved sequence number 0", id);
    }

    if received.outcome.new_node {
        info!("New node {}", id);
    } else if received.outcome.reactivated {
        info!("Node {} is active again", id);
    }

    if !received.outcome.inside_area {
        warn!("Node {} is outside the area at {}", id, status.last.position);
    }

    match format {
        PrintFormat::Debug => println!("{id} {:?}", status.last),
        PrintFormat::DebugPretty => info!("Received from {}:\n{:#?}", id, status.last),
        PrintFormat::Json => match (Report { node: id, status }).to_json() {
            Ok(line) => println!("{line}"),
            Err(e) => warn!("Failed to serialize report: {e}"),
        },
    }
}

fn print_summary(registry: &Registry) {
    info!("Nodes seen: {}", registry.len());
    for (id, node) in registry.iter() {
        info!(
            "- {}: {} updates, last seen {}, {}",
            id,
            node.total_updates,
            node.last_seen,
            if node.active { "active" } else { "inactive" }
        );
    }
}
