//! Serving split queries to other members.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tessera_types::{DocumentId, Namespace, SplitTarget};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::NetError;
use crate::message::SplitMessage;
use crate::transport::TcpTransport;

/// Error type a [`SplitProvider`] may fail with.
pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

/// Source of locally held splits.
#[async_trait::async_trait]
pub trait SplitProvider: Send + Sync + 'static {
    /// The split of `target` stored at `index`, or `None` if absent.
    async fn split(&self, target: &SplitTarget, index: usize) -> Result<Option<Bytes>, ProviderError>;
}

/// Accepts TCP connections and answers [`SplitMessage::SplitRequest`]s.
///
/// Each connection is handled on its own task and may carry any number of
/// requests.
pub struct SplitServer {
    listener: TcpListener,
    provider: Arc<dyn SplitProvider>,
    shutdown: Notify,
}

impl SplitServer {
    /// Bind a listener. Use port 0 to pick a free port.
    pub async fn bind(addr: SocketAddr, provider: Arc<dyn SplitProvider>) -> Result<Self, NetError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::from_listener(listener, provider))
    }

    /// Serve on an already bound listener.
    pub fn from_listener(listener: TcpListener, provider: Arc<dyn SplitProvider>) -> Self {
        Self {
            listener,
            provider,
            shutdown: Notify::new(),
        }
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        Ok(self.listener.local_addr()?)
    }

    /// Stop [`serve`](Self::serve). Open connections are dropped.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Run the accept loop until [`shutdown`](Self::shutdown) is called.
    pub async fn serve(&self) {
        let addr = self.listener.local_addr().ok();
        info!(?addr, "split server listening");

        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                _ = self.shutdown.notified() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let provider = self.provider.clone();
                        connections.spawn(handle_connection(stream, peer, provider));
                    }
                    Err(e) => warn!("failed to accept connection: {e}"),
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        connections.shutdown().await;
        info!(?addr, "split server stopped");
    }
}

async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, provider: Arc<dyn SplitProvider>) {
    debug!(%peer, "accepted connection");
    loop {
        let request = match TcpTransport::read_message(&mut stream).await {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!(%peer, "connection closed");
                break;
            }
            Err(e) => {
                warn!(%peer, "failed to decode request: {e}");
                break;
            }
        };

        let response = match request {
            SplitMessage::SplitRequest {
                namespace,
                id,
                index,
            } => {
                let target = SplitTarget::new(Namespace::new(namespace), DocumentId::new(id));
                match provider.split(&target, index as usize).await {
                    Ok(data) => {
                        debug!(%peer, %target, index, found = data.is_some(), "served split request");
                        SplitMessage::response(data.map(|d| d.to_vec()))
                    }
                    Err(e) => {
                        warn!(%peer, %target, index, "split lookup failed: {e}");
                        SplitMessage::SplitError {
                            reason: e.to_string(),
                        }
                    }
                }
            }
            other => SplitMessage::SplitError {
                reason: format!("unexpected request: {other:?}"),
            },
        };

        if let Err(e) = TcpTransport::write_message(&mut stream, &response).await {
            warn!(%peer, "failed to send response: {e}");
            break;
        }
    }
}
