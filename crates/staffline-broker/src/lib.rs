//! Server half of the broadcast transport: the subscription registry and
//! fan-out hub, plus the event→channel routing table.
//!
//! One [`BroadcastHub`] exists per server process. Connections register a
//! sender, subscribe to channels by typed name (admission is the caller's
//! responsibility — see `staffline-auth`), and receive serialized
//! [`EventFrame`]s. Per-channel publish order is preserved; no ordering is
//! guaranteed across channels.

mod hub;
mod routing;

pub use hub::BroadcastHub;
pub use routing::{route_event, FanoutTarget};
