//! Delivery seam between the router and the chat platform.
//!
//! The router only produces [`Outbound`] values; a [`ChatTransport`]
//! turns them into platform API calls. Delivery failures are logged and
//! skipped rather than propagated, so a dead recipient never rolls back
//! store mutations that already happened.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::outbound::Outbound;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("delivery to {recipient} failed: {reason}")]
    Delivery { recipient: i64, reason: String },
    #[error("transport is closed")]
    Closed,
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn deliver(&self, outbound: &Outbound) -> Result<(), TransportError>;
}

/// Delivers a whole batch, best effort. Failed sends are logged and the
/// rest of the batch still goes out.
pub async fn deliver_all(transport: &dyn ChatTransport, batch: &[Outbound]) {
    for outbound in batch {
        if let Err(error) = transport.deliver(outbound).await {
            warn!(
                event_name = "transport.delivery_failed",
                recipient = outbound.recipient().0,
                error = %error,
                "dropping undeliverable outbound message"
            );
        }
    }
}

/// Discards everything. Used by tests and by dry runs where the store
/// side effects are the point.
#[derive(Debug, Default)]
pub struct NoopTransport;

#[async_trait]
impl ChatTransport for NoopTransport {
    async fn deliver(&self, outbound: &Outbound) -> Result<(), TransportError> {
        debug!(
            event_name = "transport.noop_delivery",
            recipient = outbound.recipient().0,
            "discarding outbound message"
        );
        Ok(())
    }
}
