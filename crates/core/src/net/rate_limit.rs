use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
struct TokenBucket {
    tokens: f32,
    capacity: f32,
    refill_per_sec: f32,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f32, refill_per_sec: f32) -> Self {
        Self {
            tokens: capacity,
            capacity,
            refill_per_sec,
            last_refill: Instant::now(),
        }
    }

    fn try_take(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f32();
        self.last_refill = now;
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Per-endpoint, per-message-type token bucket, guarding the transport from
/// a single client flooding one input type (spec 4.2, section 5).
#[derive(Debug, Default)]
pub struct RateLimiter {
    buckets: HashMap<(SocketAddr, &'static str), TokenBucket>,
    capacity: f32,
    refill_per_sec: f32,
}

impl RateLimiter {
    pub fn new(capacity: f32, refill_per_sec: f32) -> Self {
        Self {
            buckets: HashMap::new(),
            capacity,
            refill_per_sec,
        }
    }

    pub fn allow(&mut self, addr: SocketAddr, msg_type: &'static str) -> bool {
        let capacity = self.capacity;
        let refill = self.refill_per_sec;
        self.buckets
            .entry((addr, msg_type))
            .or_insert_with(|| TokenBucket::new(capacity, refill))
            .try_take()
    }

    pub fn forget(&mut self, addr: SocketAddr) {
        self.buckets.retain(|(a, _), _| *a != addr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausts_then_refills() {
        let mut limiter = RateLimiter::new(2.0, 1000.0);
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();

        assert!(limiter.allow(addr, "player_input"));
        assert!(limiter.allow(addr, "player_input"));
        assert!(!limiter.allow(addr, "player_input"));

        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(limiter.allow(addr, "player_input"));
    }

    #[test]
    fn separate_buckets_per_type() {
        let mut limiter = RateLimiter::new(1.0, 0.0);
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();

        assert!(limiter.allow(addr, "player_input"));
        assert!(limiter.allow(addr, "chat"));
        assert!(!limiter.allow(addr, "player_input"));
    }
}
