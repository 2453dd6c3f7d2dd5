use std::{io, net::SocketAddr};

use anyhow::{Context, Result, bail};
use tokio::net::{TcpListener, TcpSocket, TcpStream, lookup_host};
use tracing::{debug, warn};

/// Host used when the server is asked to listen on every interface.
pub const ANY_HOST: &str = "0.0.0.0";

/// Pending-connection queue length for the listening socket.
pub const LISTEN_BACKLOG: u32 = 10;

/// Resolves `host:port` into candidate addresses, in resolver order.
///
/// `None` for the host means "any interface", which is what a server binds to.
pub async fn resolve(host: Option<&str>, port: &str) -> Result<Vec<SocketAddr>> {
    let host = host.unwrap_or(ANY_HOST);
    let port: u16 = port
        .trim()
        .parse()
        .with_context(|| format!("invalid port '{port}'"))?;

    let candidates: Vec<SocketAddr> = lookup_host((host, port))
        .await
        .with_context(|| format!("failed to resolve {host}:{port}"))?
        .collect();

    if candidates.is_empty() {
        bail!("{host}:{port} did not resolve to any address");
    }
    debug!(?candidates, "resolved address candidates");
    Ok(candidates)
}

/// Binds and listens on the first candidate that accepts it.
pub fn bind_first(candidates: &[SocketAddr]) -> Result<TcpListener> {
    for addr in candidates {
        match listen_on(*addr) {
            Ok(listener) => return Ok(listener),
            Err(error) => warn!(%addr, ?error, "failed to bind candidate address"),
        }
    }
    bail!("no available address to bind")
}

fn listen_on(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(LISTEN_BACKLOG)
}

/// Connects to the first candidate that answers.
pub async fn connect_first(candidates: &[SocketAddr]) -> Result<TcpStream> {
    for addr in candidates {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(error) => warn!(%addr, ?error, "failed to connect to candidate address"),
        }
    }
    bail!("no available address to connect to")
}
