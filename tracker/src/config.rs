use std::{net::SocketAddr, time::Duration};

pub const UDP_CLIENT_PORT: u16 = 8775;
pub const UDP_SERVER_PORT: u16 = 5688;

pub const SEND_INTERVAL: Duration = Duration::from_secs(30);

/// Time given to the network stack to settle before the first send is scheduled.
pub const STARTUP_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub local: SocketAddr,
    pub collector: SocketAddr,
    pub interval: Duration,
    pub startup_pause: Duration,
}
