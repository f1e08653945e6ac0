use clap::{Args, Parser};
use pasture_tracker::{
    address::{LinkLayerAddress, DEFAULT_COLLECTOR, GLOBAL_PREFIX},
    config::{Config, SEND_INTERVAL, STARTUP_PAUSE, UDP_CLIENT_PORT, UDP_SERVER_PORT},
    position,
    routing::{Dag, PreferredParent, RplState},
    scheduler::{Scheduler, TelemetryState},
    transport::udp::UdpTransport,
};
use std::{
    net::{Ipv6Addr, SocketAddr},
    time::Duration,
};
use tracing::{error, info};

/// Mesh node that periodically reports its simulated position and routing health.
#[derive(Parser)]
struct Cli {
    /// Link layer address of this node (8 colon separated hex bytes)
    #[arg(long)]
    lladdr: LinkLayerAddress,

    /// Collector address
    #[arg(long, default_value_t = DEFAULT_COLLECTOR)]
    collector: Ipv6Addr,

    /// Collector UDP port
    #[arg(long, default_value_t = UDP_SERVER_PORT)]
    collector_port: u16,

    /// Local UDP port
    #[arg(long, default_value_t = UDP_CLIENT_PORT)]
    local_port: u16,

    /// Seconds between telemetry records
    #[arg(long, default_value_t = SEND_INTERVAL.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Milliseconds to wait for the network to settle before starting
    #[arg(long, default_value_t = STARTUP_PAUSE.as_millis() as u64)]
    startup_pause: u64,

    #[command(flatten)]
    routing: RoutingArgs,
}

/// Routing state to report, there is no topology unless a rank is given.
#[derive(Args)]
struct RoutingArgs {
    /// Rank of this node in the DAG
    #[arg(long)]
    rank: Option<u16>,

    /// Current DIO interval doublings
    #[arg(long, default_value_t = 12)]
    dio_interval_doublings: u8,

    /// Number of neighbours
    #[arg(long, default_value_t = 0)]
    neighbors: u16,

    /// Address of the preferred parent
    #[arg(long)]
    parent: Option<Ipv6Addr>,

    /// Rank of the preferred parent
    #[arg(long, default_value_t = 256)]
    parent_rank: u16,
}

impl RoutingArgs {
    fn rpl_state(&self) -> RplState {
        RplState {
            dag: self.rank.map(|rank| Dag {
                rank,
                dio_interval_doublings: self.dio_interval_doublings,
                preferred_parent: self.parent.map(|address| PreferredParent {
                    address,
                    rank: self.parent_rank,
                }),
            }),
            neighbors: self.neighbors,
        }
    }
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            local: SocketAddr::from((Ipv6Addr::UNSPECIFIED, self.local_port)),
            collector: SocketAddr::from((self.collector, self.collector_port)),
            interval: Duration::from_secs(self.interval),
            startup_pause: Duration::from_millis(self.startup_pause),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = cli.config();

    info!(
        "Tracker revision: {}",
        git_version::git_version!(fallback = "unknown")
    );

    tokio::time::sleep(config.startup_pause).await;

    let node_identity = cli.lladdr.node_identity();
    let (latitude_offset, longitude_offset) = position::initial_offset(node_identity);
    info!(
        "Node ID: {:04x}, position offset: lat={} lon={}",
        node_identity, latitude_offset, longitude_offset
    );
    info!(
        "Global address: {}",
        cli.lladdr.global_address(GLOBAL_PREFIX)
    );

    let telemetry = TelemetryState::new(node_identity);
    info!("Initial position: {}", telemetry.position());

    let transport = match UdpTransport::bind(config.local, config.collector).await {
        Ok(transport) => transport,
        Err(e) => {
            error!("Failed to create transport: {e}");
            ::std::process::exit(1);
        }
    };

    let scheduler = match Scheduler::new(
        telemetry,
        cli.routing.rpl_state(),
        Some(transport),
        config.interval,
    ) {
        Ok(scheduler) => scheduler,
        Err(e) => {
            error!("Failed to start scheduler: {e}");
            ::std::process::exit(1);
        }
    };

    scheduler.run().await;
}
