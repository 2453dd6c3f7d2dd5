use std::{
    future::poll_fn,
    io,
    task::{Context, Poll},
};

use tokio::net::TcpStream;

/// The non-blocking socket operations the reactor is built from.
///
/// `TcpStream` is the only production implementor. Keeping the reactor generic over this trait
/// lets the reader and fan-out logic run against scripted sockets in unit tests.
pub trait Socket {
    /// Registers interest in read readiness, resolving once the socket is readable or closed.
    fn poll_read_ready(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>>;

    /// Registers interest in write readiness.
    fn poll_write_ready(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>>;

    /// One non-blocking read. `WouldBlock` means the readiness report was stale.
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// One non-blocking write, possibly partial.
    fn try_write(&self, buf: &[u8]) -> io::Result<usize>;
}

impl Socket for TcpStream {
    fn poll_read_ready(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        TcpStream::poll_read_ready(self, cx)
    }

    fn poll_write_ready(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        TcpStream::poll_write_ready(self, cx)
    }

    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        TcpStream::try_read(self, buf)
    }

    fn try_write(&self, buf: &[u8]) -> io::Result<usize> {
        TcpStream::try_write(self, buf)
    }
}

/// Writes as much of `payload` as the socket takes right now and returns how many bytes went out.
///
/// Never waits. A short count means the peer's window is full; the caller decides what to do
/// with the rest.
pub fn try_send<S: Socket>(socket: &S, payload: &[u8]) -> io::Result<usize> {
    let mut sent = 0;
    while sent < payload.len() {
        match socket.try_write(&payload[sent..]) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(written) => sent += written,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
            Err(err) => return Err(err),
        }
    }
    Ok(sent)
}

/// Writes the whole payload, waiting for write readiness between partial writes.
///
/// Only the client's own connection uses this: a server that stopped reading holds the caller
/// until it drains. Failure is reported to the caller and never retried.
pub async fn send_all<S: Socket>(socket: &S, payload: &[u8]) -> io::Result<()> {
    let mut sent = 0;
    while sent < payload.len() {
        poll_fn(|cx| socket.poll_write_ready(cx)).await?;
        match socket.try_write(&payload[sent..]) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(written) => sent += written,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
