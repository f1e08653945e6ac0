use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{info, trace};

/// UDP socket bound to a local port, sending to a single collector.
pub struct UdpTransport {
    socket: UdpSocket,
    remote: SocketAddr,
}

impl UdpTransport {
    pub async fn bind(local: SocketAddr, remote: SocketAddr) -> Result<Self, crate::Error> {
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| crate::Error::Bind {
                addr: local,
                source,
            })?;

        info!(
            "Created a connection with the collector {}, local/remote port {}/{}",
            remote.ip(),
            local.port(),
            remote.port()
        );

        Ok(Self { socket, remote })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, crate::Error> {
        self.socket.local_addr().map_err(crate::Error::Receive)
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }
}

impl super::Transport for UdpTransport {
    async fn transmit(&mut self, datagram: &[u8]) -> Result<(), crate::Error> {
        self.socket
            .send_to(datagram, self.remote)
            .await
            .map_err(crate::Error::Transmit)?;
        Ok(())
    }

    async fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, crate::Error> {
        let (len, from) = self
            .socket
            .recv_from(buffer)
            .await
            .map_err(crate::Error::Receive)?;
        trace!("Received {} bytes from {}", len, from);
        Ok(len)
    }
}
