//! Gateway: HTTP surface for channel webhooks and outbound sends.
//!
//! Single port. Providers POST webhooks to `/c/<type>/<uuid>/receive`; operators
//! POST outbound messages to `/send`. Results go to the configured backend.

mod protocol;
mod server;

pub use protocol::{Ack, AckData};
pub use server::{build_router, run_gateway, serve, GatewayState};
