//! UDP transport: datagram send/receive, heartbeat timeout, the reliability
//! overlay, and per-endpoint rate limiting (spec 4.2, section 5).

mod endpoint;
mod rate_limit;
mod reliability;
mod stats;

pub use endpoint::NetworkEndpoint;
pub use rate_limit::RateLimiter;
pub use reliability::{PendingReliable, ReliabilityOverlay};
pub use stats::NetworkStats;
