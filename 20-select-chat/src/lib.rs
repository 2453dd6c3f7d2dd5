//! Single-threaded chat relay built on readiness multiplexing.
//!
//! A server accepts TCP connections and relays whatever one connection sends to every other
//! connection. A terminal client shows the relayed messages in a scrolling log and sends what
//! the user types. Both run on Tokio's current-thread runtime and never spawn tasks: one loop
//! waits for readiness, then handles everything that became ready before waiting again.
//!
//! There is no framing. A message is exactly the bytes one read returned.
//!
//! - [`registry`] tracks open connections by ordered [`registry::Handle`].
//! - [`server`] is the reactor loop: readiness wait, accept, read and relay.
//! - [`reader`] stages one read in a fixed scratch buffer and classifies it.
//! - [`fanout`] delivers a payload to every connection except its origin.
//! - [`accumulator`] collects a peer's bytes until it hangs up (not used by the relay).
//! - [`resolve`] turns host and port into sockets to bind or connect.
//! - [`session`] holds the client's log, viewport and input line; [`ui`] draws them and
//!   [`client`] drives them from the keyboard and the server connection.
//! - [`cli`] and [`telemetry`] are shared by the two binaries.

pub mod accumulator;
pub mod cli;
pub mod client;
pub mod fanout;
pub mod reader;
pub mod registry;
pub mod resolve;
pub mod server;
pub mod session;
pub mod socket;
pub mod telemetry;
pub mod ui;
