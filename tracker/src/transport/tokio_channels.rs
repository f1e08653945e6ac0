use tokio::sync::mpsc::{channel, Receiver, Sender};
use tracing::warn;

/// In memory datagram transport, one half of a connected pair.
pub struct ChannelTransport {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl ChannelTransport {
    pub fn new_pair(capacity: usize) -> (Self, Self) {
        let (tx1, rx1) = channel(capacity);
        let (tx2, rx2) = channel(capacity);
        let transport_1 = Self { tx: tx1, rx: rx2 };
        let transport_2 = Self { tx: tx2, rx: rx1 };
        (transport_1, transport_2)
    }

    /// Returns the next datagram if one is already waiting.
    pub fn try_receive(&mut self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }
}

impl super::Transport for ChannelTransport {
    async fn transmit(&mut self, datagram: &[u8]) -> Result<(), crate::Error> {
        self.tx
            .send(datagram.to_vec())
            .await
            .map_err(|_| crate::Error::ChannelClosed)
    }

    async fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, crate::Error> {
        match self.rx.recv().await {
            Some(datagram) => {
                let len = datagram.len().min(buffer.len());
                buffer[..len].copy_from_slice(&datagram[..len]);
                Ok(len)
            }
            None => {
                // Nothing more can arrive once the other half is gone
                warn!("Channel closed");
                std::future::pending().await
            }
        }
    }
}
