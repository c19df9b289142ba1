//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default first backoff delay after a failed reconciliation (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 5;

/// Default cap on the backoff delay after repeated failures (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Default delay before restarting watch stream after unknown errors (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default delay before restarting watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS: u64 = 1;

/// Default limit on reconciliations running at the same time
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Field manager used for server-side apply
pub const DEFAULT_FIELD_MANAGER: &str = "broker-controller";

/// Name of the ConfigMap holding the globalnet configuration of a Broker namespace
pub const GLOBALNET_CONFIGMAP_NAME: &str = "submariner-globalnet-info";

/// Label value marking the globalnet ConfigMap
pub const GLOBALNET_COMPONENT_LABEL: &str = "submariner-globalnet";

/// Global CIDR range used when globalnet is enabled without an explicit range
pub const DEFAULT_GLOBALNET_CIDR: &str = "242.0.0.0/8";

/// Global IPs allocated per cluster when no size is given
pub const DEFAULT_GLOBALNET_CLUSTER_SIZE: u32 = 65536;

/// Initial backoff before restarting a throttled watch (milliseconds)
pub const DEFAULT_WATCH_BACKOFF_START_MS: u64 = 2000;

/// Upper bound on the throttled watch backoff (milliseconds)
pub const DEFAULT_WATCH_BACKOFF_MAX_MS: u64 = 30_000;
