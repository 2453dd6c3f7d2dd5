use std::io;

use bytes::Bytes;

use crate::socket::Socket;

/// Size of the scratch region one read is staged in.
pub const SCRATCH_LEN: usize = 1024;

/// Outcome of a single read on a ready connection.
#[derive(Debug)]
pub enum ReadResult {
    /// One message: exactly the bytes this read returned.
    Data(Bytes),
    /// The peer shut down its side in an orderly way.
    PeerClosed,
    Error(io::Error),
}

/// Fixed-size staging buffer reused across reads.
pub struct Scratch {
    buf: [u8; SCRATCH_LEN],
}

impl Scratch {
    pub fn new() -> Self {
        Self {
            buf: [0; SCRATCH_LEN],
        }
    }

    /// Issues one bounded read and classifies it.
    ///
    /// Returns `None` when the socket was not actually readable; the connection stays as it is.
    pub fn read_from<S: Socket>(&mut self, socket: &S) -> Option<ReadResult> {
        let outcome = socket.try_read(&mut self.buf);
        self.classify(outcome)
    }

    fn classify(&self, outcome: io::Result<usize>) -> Option<ReadResult> {
        match outcome {
            Ok(0) => Some(ReadResult::PeerClosed),
            Ok(len) => Some(ReadResult::Data(Bytes::copy_from_slice(&self.buf[..len]))),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                None
            }
            Err(err) => Some(ReadResult::Error(err)),
        }
    }
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}
