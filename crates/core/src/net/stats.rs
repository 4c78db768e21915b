/// Running counters surfaced to the server's admin TUI, modeled on the
/// teacher's `NetworkStats`.
#[derive(Debug, Clone, Default)]
pub struct NetworkStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub malformed_dropped: u64,
    pub rate_limited_dropped: u64,
    pub reliable_retransmits: u64,
    pub reliable_dropped: u64,
    pub rtt_ms: f32,
    pub rtt_variance_ms: f32,
}
