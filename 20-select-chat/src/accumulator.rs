//! Growable byte accumulator for reading a peer until it hangs up.
//!
//! The reactor never uses this: it treats every read as its own message. The accumulator exists
//! for callers that want everything a peer sent in one piece, such as tests asserting on the
//! bytes a connection received over its lifetime.

use std::{future::poll_fn, io};

use bytes::{Bytes, BytesMut};

use crate::{
    reader::{ReadResult, SCRATCH_LEN, Scratch},
    socket::Socket,
};

/// Append-only buffer whose capacity doubles whenever a chunk would overflow it.
#[derive(Debug)]
pub struct Accumulator {
    buf: BytesMut,
    limit: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::with_capacity(SCRATCH_LEN)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            limit: capacity,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        let needed = self.buf.len() + chunk.len();
        if needed > self.limit {
            let limit = grown_limit(self.limit, needed);
            self.buf.reserve(limit - self.buf.len());
            self.limit = limit;
        }
        self.buf.extend_from_slice(chunk);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.limit
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }

    /// Reads from `socket` until the peer closes, appending every chunk.
    pub async fn drain_from<S: Socket>(
        &mut self,
        socket: &S,
        scratch: &mut Scratch,
    ) -> io::Result<()> {
        loop {
            poll_fn(|cx| socket.poll_read_ready(cx)).await?;
            match scratch.read_from(socket) {
                None => continue,
                Some(ReadResult::Data(chunk)) => self.push(&chunk),
                Some(ReadResult::PeerClosed) => return Ok(()),
                Some(ReadResult::Error(err)) => return Err(err),
            }
        }
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Doubles `limit` until it covers `needed`, stopping at `usize::MAX`.
fn grown_limit(limit: usize, needed: usize) -> usize {
    let mut limit = limit.max(1);
    while limit < needed {
        limit = limit.saturating_mul(2);
    }
    limit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::testing::{Inbound, ScriptedSocket};

    #[test]
    fn capacity_doubles_until_the_chunk_fits() {
        let mut acc = Accumulator::with_capacity(4);
        acc.push(b"abc");
        assert_eq!(acc.capacity(), 4);

        acc.push(b"defgh");
        assert_eq!(acc.capacity(), 8);

        acc.push(&[b'x'; 20]);
        assert_eq!(acc.capacity(), 32);
        assert_eq!(acc.len(), 28);
    }

    #[test]
    fn zero_capacity_still_grows() {
        let mut acc = Accumulator::with_capacity(0);
        assert!(acc.is_empty());
        acc.push(b"hi");
        assert_eq!(acc.capacity(), 2);
        assert_eq!(acc.freeze(), Bytes::from_static(b"hi"));
    }

    #[test]
    fn growth_saturates_instead_of_overflowing() {
        let huge = usize::MAX / 2 + 2;
        assert_eq!(grown_limit(usize::MAX / 2 + 1, huge), usize::MAX);
        assert_eq!(grown_limit(1024, usize::MAX), usize::MAX);
        assert_eq!(grown_limit(1024, 1500), 2048);
    }

    #[tokio::test]
    async fn drain_joins_reads_until_close() {
        let socket = ScriptedSocket::with_inbound([
            Inbound::Data(b"hello ".to_vec()),
            Inbound::Data(b"world".to_vec()),
            Inbound::Closed,
        ]);
        let mut acc = Accumulator::with_capacity(2);

        acc.drain_from(&socket, &mut Scratch::new())
            .await
            .expect("drain");

        assert_eq!(acc.freeze(), Bytes::from_static(b"hello world"));
    }

    #[tokio::test]
    async fn drain_stops_on_read_error() {
        let socket = ScriptedSocket::with_inbound([
            Inbound::Data(b"partial".to_vec()),
            Inbound::Fail(io::ErrorKind::ConnectionReset),
        ]);
        let mut acc = Accumulator::new();

        let err = acc
            .drain_from(&socket, &mut Scratch::new())
            .await
            .expect_err("reset should surface");

        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
        assert_eq!(acc.len(), b"partial".len());
    }
}
