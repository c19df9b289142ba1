//! # Runtime
//!
//! Process wiring around the reconciler.
//!
//! - `initialization`: tracing, metrics, HTTP server, client configuration
//! - `watch_loop`: the Broker watch and its restart loop
//! - `error_policy`: per-resource retry backoff and watch error handling

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
