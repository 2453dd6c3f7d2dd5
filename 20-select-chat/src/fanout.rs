use std::io;

use tracing::{debug, warn};

use crate::{
    registry::{Connection, Handle, Registry},
    socket::{Socket, try_send},
};

/// Who a broadcast reached, in registry order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: Vec<Handle>,
    pub failed: Vec<Handle>,
}

/// Sends `payload` verbatim to every registered connection except `origin`.
///
/// Delivery never waits on a peer. A peer whose window is full gets one more attempt after the
/// I/O driver has run, then counts as failed with whatever part of the payload it took. A failed
/// peer is logged and skipped; it stays registered until its own read reports the problem.
pub async fn broadcast<S: Socket>(
    registry: &Registry<S>,
    origin: Handle,
    payload: &[u8],
) -> Delivery {
    let mut delivery = Delivery::default();
    let mut blocked = Vec::new();

    for (handle, connection) in registry.iter() {
        if handle == origin {
            continue;
        }
        match try_send(connection.socket(), payload) {
            Ok(sent) if sent == payload.len() => delivered(&mut delivery, handle, payload.len()),
            Ok(sent) => blocked.push((handle, connection, sent)),
            Err(error) => failed(&mut delivery, handle, connection, error),
        }
    }

    if !blocked.is_empty() {
        // Connections accepted since the driver last ran have no write readiness recorded yet.
        tokio::task::yield_now().await;

        for (handle, connection, sent) in blocked {
            match try_send(connection.socket(), &payload[sent..]) {
                Ok(rest) if sent + rest == payload.len() => {
                    delivered(&mut delivery, handle, payload.len())
                }
                Ok(rest) => {
                    let error = io::Error::new(
                        io::ErrorKind::WouldBlock,
                        format!("peer took {} of {} bytes", sent + rest, payload.len()),
                    );
                    failed(&mut delivery, handle, connection, error)
                }
                Err(error) => failed(&mut delivery, handle, connection, error),
            }
        }

        delivery.delivered.sort();
        delivery.failed.sort();
    }

    delivery
}

fn delivered(delivery: &mut Delivery, handle: Handle, bytes: usize) {
    debug!(%handle, bytes, "delivered message");
    delivery.delivered.push(handle);
}

fn failed<S>(delivery: &mut Delivery, handle: Handle, connection: &Connection<S>, error: io::Error) {
    warn!(%handle, peer = %connection.peer(), ?error, "failed to deliver message");
    delivery.failed.push(handle);
}
