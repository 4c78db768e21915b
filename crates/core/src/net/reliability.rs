use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A reliable send awaiting a `message_ack`, ported from the teacher's
/// `PendingPacket`/`AckTracker` pair but keyed by application message id
/// rather than transport sequence, since the wire codec (4.1) carries no
/// packet-level ack header.
#[derive(Debug, Clone)]
pub struct PendingReliable {
    pub message_id: u64,
    pub payload: Vec<u8>,
    pub sent_at: Instant,
    pub attempts: u32,
}

/// Per-connection reliable-delivery overlay: retains sent reliable payloads
/// until acked, resending after `retry_delay` up to `max_retries` times
/// (spec 4.2).
#[derive(Debug)]
pub struct ReliabilityOverlay {
    pending: VecDeque<PendingReliable>,
    next_message_id: u64,
    retry_delay: Duration,
    max_retries: u32,
}

impl ReliabilityOverlay {
    pub fn new(retry_delay: Duration, max_retries: u32) -> Self {
        Self {
            pending: VecDeque::new(),
            next_message_id: 1,
            retry_delay,
            max_retries,
        }
    }

    /// Registers `payload` as needing acknowledgement and returns its id.
    pub fn track(&mut self, payload: Vec<u8>) -> u64 {
        let message_id = self.next_message_id;
        self.next_message_id += 1;
        self.pending.push_back(PendingReliable {
            message_id,
            payload,
            sent_at: Instant::now(),
            attempts: 1,
        });
        message_id
    }

    pub fn ack(&mut self, message_id: u64) {
        self.pending.retain(|p| p.message_id != message_id);
    }

    /// Returns payloads due for resend, incrementing their attempt count and
    /// dropping (without resending) any that exhausted `max_retries`.
    pub fn due_for_resend(&mut self) -> Vec<Vec<u8>> {
        let now = Instant::now();
        let mut resend = Vec::new();
        let mut exhausted = Vec::new();

        for pending in &mut self.pending {
            if now.duration_since(pending.sent_at) < self.retry_delay {
                continue;
            }
            if pending.attempts >= self.max_retries {
                exhausted.push(pending.message_id);
                continue;
            }
            pending.attempts += 1;
            pending.sent_at = now;
            resend.push(pending.payload.clone());
        }

        if !exhausted.is_empty() {
            self.pending.retain(|p| !exhausted.contains(&p.message_id));
        }

        resend
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_removes_pending() {
        let mut overlay = ReliabilityOverlay::new(Duration::from_millis(50), 3);
        let id = overlay.track(vec![1, 2, 3]);
        assert_eq!(overlay.pending_count(), 1);
        overlay.ack(id);
        assert_eq!(overlay.pending_count(), 0);
    }

    #[test]
    fn resends_after_delay_then_drops_after_max_retries() {
        let mut overlay = ReliabilityOverlay::new(Duration::from_millis(1), 2);
        overlay.track(vec![9]);

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(overlay.due_for_resend().len(), 1);

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(overlay.due_for_resend().len(), 1);

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(overlay.due_for_resend().len(), 0);
        assert_eq!(overlay.pending_count(), 0);
    }
}
