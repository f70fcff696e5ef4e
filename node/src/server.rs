//! TCP server speaking newline-delimited JSON.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use futures::StreamExt;
use parking_lot::RwLock;
use ratemesh_protocol::{decode_line, encode_line, ProtocolError, Request, Response, StatusCode};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Semaphore};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, info, instrument, warn};

use crate::config::NodeConfig;
use crate::error::{NodeError, NodeResult};
use crate::handler::RatesHandler;
use crate::state::NodeState;

/// Serves [`RatesHandler`] to TCP clients, one task per connection.
pub struct RatesServer {
    config: NodeConfig,
    handler: RatesHandler,
    state: Arc<RwLock<NodeState>>,
    /// One permit per open connection.
    connections: Arc<Semaphore>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl RatesServer {
    /// Create a server after validating its configuration.
    pub fn new(config: NodeConfig, handler: RatesHandler) -> NodeResult<Self> {
        config.validate().map_err(NodeError::Config)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let connections = Arc::new(Semaphore::new(config.max_connections));

        Ok(Self {
            config,
            handler,
            state: Arc::new(RwLock::new(NodeState::Starting)),
            connections,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> NodeState {
        *self.state.read()
    }

    /// The request handler.
    pub fn handler(&self) -> &RatesHandler {
        &self.handler
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> NodeResult<TcpListener> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        info!(addr = %listener.local_addr()?, "Listening");
        Ok(listener)
    }

    /// Accept connections until `shutdown` resolves, then let open
    /// connections finish for up to the grace period.
    #[instrument(skip_all)]
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> NodeResult<()>
    where
        F: Future<Output = ()>,
    {
        *self.state.write() = NodeState::Running;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_connection(stream, peer),
                    Err(err) => warn!(error = %err, "Failed to accept connection"),
                },
            }
        }

        *self.state.write() = NodeState::ShuttingDown;
        drop(listener);
        let _ = self.shutdown_tx.send(true);

        let all_permits = self.config.max_connections as u32;
        let drained = tokio::time::timeout(
            self.config.shutdown_grace_period,
            self.connections.acquire_many(all_permits),
        )
        .await;
        if drained.is_err() {
            warn!(
                open = self.handler.metrics().snapshot().connections_active,
                "Grace period elapsed with connections still open"
            );
        }

        *self.state.write() = NodeState::Stopped;

        let metrics = self.handler.metrics().snapshot();
        info!(
            requests = metrics.requests_total,
            publishes = metrics.publishes_accepted,
            conversions = metrics.conversions_completed,
            not_found = metrics.not_found,
            invalid = metrics.invalid_arguments,
            "Server stopped"
        );
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let metrics = self.handler.metrics().clone();

        let Ok(permit) = self.connections.clone().try_acquire_owned() else {
            metrics.connection_rejected();
            warn!(peer = %peer, "Connection limit reached");
            tokio::spawn(refuse_connection(stream));
            return;
        };

        let handler = self.handler.clone();
        let shutdown = self.shutdown_rx.clone();
        let max_line_length = self.config.max_line_length;

        tokio::spawn(async move {
            metrics.connection_opened();
            debug!(peer = %peer, "Connection opened");

            if let Err(err) = serve_connection(stream, &handler, max_line_length, shutdown).await {
                warn!(peer = %peer, error = %err, "Connection error");
            }

            metrics.connection_closed();
            debug!(peer = %peer, "Connection closed");
            drop(permit);
        });
    }
}

/// Answer requests on one stream until EOF or shutdown.
///
/// A line longer than `max_line_length` bytes is answered with an error and
/// closes the connection.
pub async fn serve_connection<S>(
    stream: S,
    handler: &RatesHandler,
    max_line_length: usize,
    mut shutdown: watch::Receiver<bool>,
) -> NodeResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(max_line_length));

    loop {
        let next = tokio::select! {
            next = lines.next() => next,
            _ = shutdown.changed() => break,
        };

        let (response, keep_open) = match next {
            None => break,
            Some(Ok(line)) if line.trim().is_empty() => continue,
            Some(Ok(line)) => match decode_line::<Request>(&line) {
                Ok(request) => (handler.handle(request).await, true),
                Err(err) => (handler.reject(&err), true),
            },
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                (handler.reject(&ProtocolError::LineTooLong(max_line_length)), false)
            }
            Some(Err(LinesCodecError::Io(err))) => return Err(err.into()),
        };

        writer.write_all(encode_line(&response)?.as_bytes()).await?;
        writer.flush().await?;

        if !keep_open {
            break;
        }
    }

    Ok(())
}

async fn refuse_connection(mut stream: TcpStream) {
    let response = Response::error(StatusCode::Internal, "Connection limit reached");
    if let Ok(line) = encode_line(&response) {
        let _ = stream.write_all(line.as_bytes()).await;
    }
}
