// crates/server/src/live/mod.rs
//! Live log-stream plumbing: the reconnecting WebSocket client and the
//! monitor task that feeds the aggregation engine.

pub mod connection;
pub mod monitor;

pub use connection::{ConnectionManager, ConnectionState, Subscription};
pub use monitor::{spawn_monitor, RunEvent};
