/// A datagram endpoint bound to a fixed remote.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Sends one datagram to the remote.
    async fn transmit(&mut self, datagram: &[u8]) -> Result<(), crate::Error>;

    /// Waits for the next inbound datagram, returning the number of bytes copied into `buffer`.
    ///
    /// Must be cancel safe.
    async fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, crate::Error>;
}

pub mod tokio_channels;
pub mod udp;
