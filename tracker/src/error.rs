use std::io;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: io::Error,
    },

    #[error("Transmit error: {0}")]
    Transmit(io::Error),

    #[error("Receive error: {0}")]
    Receive(io::Error),

    #[error("Transport channel closed")]
    ChannelClosed,

    #[error("Send interval must be non-zero and within the range of the clock")]
    InvalidInterval,
}
