use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tracing::debug;

use super::TransportSink;
use crate::error::SinkError;
use crate::packet::RtpPacket;

/// Plain RTP-over-UDP sink
///
/// Serializes each unit as an RFC 3550 packet and sends it with a
/// non-blocking `try_send_to`. A full socket buffer surfaces as
/// [`SinkError::Backpressure`].
#[derive(Debug, Clone)]
pub struct UdpSink {
    socket: Arc<UdpSocket>,
    remote: SocketAddr,
}

impl UdpSink {
    /// Bind a local socket and target `remote`
    pub async fn bind(local: SocketAddr, remote: SocketAddr) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(local).await?;
        debug!(
            "Bound RTP UDP sink {} -> {}",
            socket.local_addr()?,
            remote
        );
        Ok(Self {
            socket: Arc::new(socket),
            remote,
        })
    }

    /// Reuse an already bound socket (bundled media share one socket)
    pub fn with_socket(socket: Arc<UdpSocket>, remote: SocketAddr) -> Self {
        Self { socket, remote }
    }

    /// Local address of the underlying socket
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Destination address
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }
}

impl TransportSink for UdpSink {
    fn try_send(&self, packet: RtpPacket) -> Result<(), SinkError> {
        let bytes = packet
            .serialize()
            .map_err(|e| SinkError::Io(e.to_string()))?;
        self.socket.try_send_to(&bytes, self.remote)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("udp:{}", self.remote)
    }
}
