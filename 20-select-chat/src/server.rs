use std::{
    future::{Future, poll_fn},
    io,
    net::SocketAddr,
    task::{Context, Poll},
};

use anyhow::{Context as _, Result};
use tokio::{
    net::{TcpListener, TcpStream},
    select,
};
use tracing::{debug, info, trace, warn};

use crate::{
    fanout::broadcast,
    reader::{ReadResult, Scratch},
    registry::{Handle, Registry},
    resolve::{bind_first, resolve},
    socket::Socket,
};

/// What one readiness wait reported.
#[derive(Debug)]
pub enum Event {
    /// The listening socket was ready; carries the outcome of the accept.
    Incoming(io::Result<(TcpStream, SocketAddr)>),
    /// A registered connection has something to read (data, EOF or an error).
    Readable(Handle),
}

/// Broadcast relay: one listening socket plus every connection it accepted.
///
/// All state lives here and is only touched between readiness waits, so nothing needs a lock.
pub struct Server {
    listener: TcpListener,
    registry: Registry,
    scratch: Scratch,
}

impl Server {
    pub fn new(listener: TcpListener) -> Self {
        Self {
            listener,
            registry: Registry::new(),
            scratch: Scratch::new(),
        }
    }

    /// Resolves `port` on every interface and listens on the first address that binds.
    pub async fn bind(port: &str) -> Result<Self> {
        let candidates = resolve(None, port).await?;
        let listener = bind_first(&candidates)
            .with_context(|| format!("failed to listen on port {port}"))?;
        Ok(Self::new(listener))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Blocks until the listener or at least one connection is ready.
    ///
    /// The listener's event comes first, then readable connections in ascending handle order.
    pub async fn wait(&self) -> Vec<Event> {
        poll_fn(|cx| collect_ready(&self.listener, &self.registry, cx)).await
    }

    pub async fn dispatch(&mut self, events: Vec<Event>) {
        for event in events {
            match event {
                Event::Incoming(result) => self.handle_incoming(result).await,
                Event::Readable(handle) => self.handle_readable(handle).await,
            }
        }
    }

    /// One loop iteration: wait for readiness, then handle everything that was ready.
    pub async fn turn(&mut self) {
        let events = self.wait().await;
        self.dispatch(events).await;
    }

    /// Runs until `shutdown` resolves, then drops the listener and every connection.
    ///
    /// An error from `shutdown` (for example a signal handler that could not be installed)
    /// ends the loop and is returned.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = io::Result<()>>,
    {
        tokio::pin!(shutdown);

        loop {
            let step = select! {
                result = &mut shutdown => Step::Stop(result),
                events = self.wait() => Step::Dispatch(events),
            };

            match step {
                Step::Dispatch(events) => self.dispatch(events).await,
                Step::Stop(result) => {
                    result.context("failed to wait for the shutdown signal")?;
                    break;
                }
            }
        }

        info!(connections = self.registry.len(), "closing socket");
        Ok(())
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(tokio::signal::ctrl_c()).await
    }

    async fn handle_incoming(&mut self, result: io::Result<(TcpStream, SocketAddr)>) {
        let (stream, peer) = match result {
            Ok(accepted) => accepted,
            Err(error) => {
                warn!(?error, "failed to accept connection");
                return;
            }
        };

        let handle = self.registry.insert(stream, peer);
        info!(%handle, %peer, "new connection");

        let notice = join_notice(peer);
        let delivery = broadcast(&self.registry, handle, notice.as_bytes()).await;
        debug!(
            %handle,
            notified = delivery.delivered.len(),
            failed = delivery.failed.len(),
            "announced new connection"
        );
    }

    async fn handle_readable(&mut self, handle: Handle) {
        let Some(connection) = self.registry.get(handle) else {
            return;
        };
        let peer = connection.peer();

        let Some(result) = self.scratch.read_from(connection.socket()) else {
            trace!(%handle, "spurious readiness");
            return;
        };

        match result {
            ReadResult::Data(payload) => {
                let delivery = broadcast(&self.registry, handle, &payload).await;
                debug!(
                    %handle,
                    bytes = payload.len(),
                    delivered = delivery.delivered.len(),
                    failed = delivery.failed.len(),
                    "relayed message"
                );
            }
            ReadResult::PeerClosed => {
                self.registry.remove(handle);
                info!(%handle, %peer, "connection hung up");
            }
            ReadResult::Error(error) => {
                self.registry.remove(handle);
                warn!(%handle, %peer, ?error, "connection closed with error");
            }
        }
    }
}

enum Step {
    Dispatch(Vec<Event>),
    Stop(io::Result<()>),
}

/// Text sent to existing members when someone joins.
pub fn join_notice(peer: SocketAddr) -> String {
    format!("A user has joined the server ({peer})")
}

fn collect_ready<S: Socket>(
    listener: &TcpListener,
    registry: &Registry<S>,
    cx: &mut Context<'_>,
) -> Poll<Vec<Event>> {
    let mut events = Vec::new();

    if let Poll::Ready(result) = listener.poll_accept(cx) {
        events.push(Event::Incoming(result));
    }

    // Errors count as readable: the following read reports them and drops the connection.
    events.extend(
        registry
            .iter()
            .filter(|(_, connection)| connection.socket().poll_read_ready(cx).is_ready())
            .map(|(handle, _)| Event::Readable(handle)),
    );

    if events.is_empty() {
        Poll::Pending
    } else {
        Poll::Ready(events)
    }
}
