//! Mesh Keys - Static key lookups and request forwarding for mesh demos
//!
//! A small HTTP service providing:
//! - `GET /key/{name}` with a fixed JSON value per configured key
//! - `GET /forward/{name}` relaying a configured upstream's status and body
//! - Routes fixed at startup from a one-time environment snapshot

pub mod config;
pub mod forward;
pub mod responder;
pub mod routes;
pub mod server;

pub use config::{ConfigError, ForwardEntry, KeyEntry, KeyStyle, Snapshot};
pub use forward::{ForwardError, Forwarder, UpstreamResponse};
pub use routes::RouteTable;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
