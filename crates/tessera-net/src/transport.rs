//! Split transport built on tokio TCP.
//!
//! [`TcpTransport`] opens one TCP connection per member and exchanges
//! length-prefixed postcard messages over it. Every connect and query is
//! bounded by the transport's timeouts.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tessera_types::SplitTarget;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, error};

use crate::error::NetError;
use crate::message::SplitMessage;
use crate::{PeerConnection, Transport};

/// Maximum message size: 64 MiB.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// TCP implementation of [`Transport`].
#[derive(Debug, Clone)]
pub struct TcpTransport {
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl TcpTransport {
    /// Create a transport using `timeout` for both connecting and querying.
    pub fn new(timeout: Duration) -> Self {
        Self {
            connect_timeout: timeout,
            query_timeout: timeout,
        }
    }

    /// Override the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Timeout applied to each query round trip.
    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    // -------------------------------------------------------------------
    // Framing
    // -------------------------------------------------------------------

    /// Write one message: 4-byte big-endian length, then postcard bytes.
    pub async fn write_message<W>(writer: &mut W, message: &SplitMessage) -> Result<(), NetError>
    where
        W: AsyncWrite + Unpin,
    {
        let payload =
            postcard::to_allocvec(message).map_err(|e| NetError::Serialization(e.to_string()))?;
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(NetError::MessageTooLarge {
                len: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }

        writer
            .write_all(&(payload.len() as u32).to_be_bytes())
            .await?;
        writer.write_all(&payload).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Read one message.
    ///
    /// Returns `Ok(None)` if the stream is closed cleanly before a new
    /// frame starts.
    pub async fn read_message<R>(reader: &mut R) -> Result<Option<SplitMessage>, NetError>
    where
        R: AsyncRead + Unpin,
    {
        let mut len_buf = [0u8; 4];
        match reader.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let len = u32::from_be_bytes(len_buf) as usize;

        if len > MAX_MESSAGE_SIZE {
            return Err(NetError::MessageTooLarge {
                len,
                max: MAX_MESSAGE_SIZE,
            });
        }

        let mut payload = vec![0u8; len];
        reader.read_exact(&mut payload).await?;
        let message: SplitMessage =
            postcard::from_bytes(&payload).map_err(|e| NetError::Serialization(e.to_string()))?;

        Ok(Some(message))
    }

    /// Verify that received split data matches the checksum the peer sent.
    pub fn verify_split_integrity(checksum: [u8; 32], data: &[u8]) -> Result<(), NetError> {
        let expected = blake3::Hash::from(checksum);
        let actual = blake3::hash(data);
        if actual != expected {
            return Err(NetError::IntegrityFailure { expected, actual });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn connect(&self, addr: SocketAddr) -> Result<Box<dyn PeerConnection>, NetError> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| NetError::Timeout(self.connect_timeout))?
            .map_err(|e| NetError::Connect(format!("{addr}: {e}")))?;
        stream.set_nodelay(true)?;

        debug!(%addr, "connected to member");
        Ok(Box::new(TcpConnection {
            addr,
            stream,
            timeout: self.query_timeout,
        }))
    }
}

/// An open TCP connection to one member.
#[derive(Debug)]
pub struct TcpConnection {
    addr: SocketAddr,
    stream: TcpStream,
    timeout: Duration,
}

impl TcpConnection {
    async fn round_trip(&mut self, request: &SplitMessage) -> Result<SplitMessage, NetError> {
        TcpTransport::write_message(&mut self.stream, request).await?;
        TcpTransport::read_message(&mut self.stream)
            .await?
            .ok_or_else(|| NetError::Connect(format!("{}: connection closed", self.addr)))
    }
}

#[async_trait::async_trait]
impl PeerConnection for TcpConnection {
    async fn query_split(
        &mut self,
        target: &SplitTarget,
        index: usize,
    ) -> Result<Option<Bytes>, NetError> {
        let index_u32 = u32::try_from(index)
            .map_err(|_| NetError::Serialization(format!("split index {index} too large")))?;
        let request = SplitMessage::SplitRequest {
            namespace: target.namespace.as_str().to_string(),
            id: target.id.as_str().to_string(),
            index: index_u32,
        };

        let timeout = self.timeout;
        let response = tokio::time::timeout(timeout, self.round_trip(&request))
            .await
            .map_err(|_| NetError::Timeout(timeout))??;

        match response {
            SplitMessage::SplitResponse {
                data: Some(data),
                checksum,
            } => {
                // End-to-end integrity: verify blake3 hash matches the checksum.
                if let Err(e) = TcpTransport::verify_split_integrity(checksum, &data) {
                    error!(addr = %self.addr, %target, index, "integrity check failed on split");
                    return Err(e);
                }
                debug!(addr = %self.addr, %target, index, size = data.len(), "received split");
                Ok(Some(Bytes::from(data)))
            }
            SplitMessage::SplitResponse { data: None, .. } => Ok(None),
            SplitMessage::SplitError { reason } => Err(NetError::Remote(reason)),
            other => Err(NetError::UnexpectedResponse(format!("{other:?}"))),
        }
    }
}
