//! # Signal Workers
//!
//! One worker per inbound signal type. Each worker owns its own bounded
//! subscription, handles events one at a time in publication order, and
//! checks the shutdown signal between events. A failing event is logged and
//! counted; the loop continues.

pub mod discovery;
pub mod maintenance;
pub mod parsing;
pub mod pool;

pub use discovery::DiscoveryHandler;
pub use maintenance::MaintenanceTask;
pub use parsing::ParsingHandler;
pub use pool::{PoolConflictHandler, PoolEvictionHandler};

use shared_bus::{GatewayEvent, Subscription};
use tokio::sync::watch;

/// Wait for the next event, or `None` once shutdown is signalled or the
/// subscription closes. An event already being handled is never interrupted.
pub(crate) async fn next_event(
    subscription: &mut Subscription,
    shutdown: &mut watch::Receiver<bool>,
) -> Option<GatewayEvent> {
    if *shutdown.borrow() {
        return None;
    }
    tokio::select! {
        biased;
        _ = shutdown.changed() => None,
        event = subscription.recv() => event,
    }
}
