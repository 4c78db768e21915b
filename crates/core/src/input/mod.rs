//! Per-player input sequence ordering: gap buffering, timeout-forced
//! advance, and duplicate suppression (spec 4.4).

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::wire::PlayerInput;

const BUFFER_CAP: usize = 100;
const GAP_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, Default)]
pub struct InputStats {
    pub total: u64,
    pub in_order: u64,
    pub out_of_order: u64,
    pub duplicate: u64,
    pub estimated_loss: u64,
}

/// Ordered holding area for one player's inputs. `lastProcessed` only ever
/// advances; inputs at or below it are duplicates.
#[derive(Debug)]
pub struct InputBuffer {
    last_processed: u32,
    buffered: BTreeMap<u32, (PlayerInput, Instant)>,
    stats: InputStats,
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBuffer {
    pub fn new() -> Self {
        Self {
            last_processed: 0,
            buffered: BTreeMap::new(),
            stats: InputStats::default(),
        }
    }

    pub fn last_processed(&self) -> u32 {
        self.last_processed
    }

    pub fn stats(&self) -> InputStats {
        self.stats
    }

    /// Submits a newly received input, returning every input now ready for
    /// the simulation to consume, in strictly increasing sequence order.
    pub fn submit(&mut self, input: PlayerInput) -> Vec<PlayerInput> {
        self.stats.total += 1;
        let seq = input.sequence_number;

        if seq <= self.last_processed {
            self.stats.duplicate += 1;
            return Vec::new();
        }

        if self.buffered.contains_key(&seq) {
            self.stats.duplicate += 1;
            return Vec::new();
        }

        if seq != self.last_processed + 1 {
            self.stats.out_of_order += 1;
        }

        self.buffered.insert(seq, (input, Instant::now()));
        let mut ready = self.drain_contiguous();

        if self.buffered.len() >= BUFFER_CAP {
            ready.extend(self.force_advance_past_oldest());
        } else if self.oldest_gap_timed_out() {
            ready.extend(self.force_advance_past_oldest());
        }

        self.stats.in_order += ready.len() as u64;
        ready
    }

    fn drain_contiguous(&mut self) -> Vec<PlayerInput> {
        let mut ready = Vec::new();
        loop {
            let next = self.last_processed + 1;
            match self.buffered.remove(&next) {
                Some((input, _)) => {
                    self.last_processed = next;
                    ready.push(input);
                }
                None => break,
            }
        }
        ready
    }

    fn oldest_gap_timed_out(&self) -> bool {
        self.buffered
            .values()
            .next()
            .is_some_and(|(_, received_at)| received_at.elapsed() >= GAP_TIMEOUT)
    }

    /// Bounded-memory DoS guard: force `lastProcessed` up to just before the
    /// oldest buffered entry, counting the skipped gap as estimated loss,
    /// then drain whatever becomes contiguous.
    fn force_advance_past_oldest(&mut self) -> Vec<PlayerInput> {
        let Some(&oldest_seq) = self.buffered.keys().next() else {
            return Vec::new();
        };
        if oldest_seq > self.last_processed + 1 {
            self.stats.estimated_loss += (oldest_seq - self.last_processed - 1) as u64;
        }
        self.last_processed = oldest_seq - 1;
        self.drain_contiguous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Vector2;

    fn input(seq: u32) -> PlayerInput {
        PlayerInput {
            sequence_number: seq,
            ack_sequence_number: 0,
            client_timestamp: seq as f32,
            move_input: Vector2::ZERO,
            is_sprinting: false,
            aim_direction: 0.0,
            is_attacking: false,
            ability_type: None,
            ability_target: Vector2::ZERO,
        }
    }

    #[test]
    fn reorders_out_of_sequence_arrivals() {
        let mut buf = InputBuffer::new();
        assert_eq!(buf.submit(input(1)).len(), 1);
        assert!(buf.submit(input(3)).is_empty());
        let delivered = buf.submit(input(2));
        assert_eq!(
            delivered.iter().map(|i| i.sequence_number).collect::<Vec<_>>(),
            vec![2, 3]
        );
        assert_eq!(buf.last_processed(), 3);
    }

    #[test]
    fn drops_duplicates_without_redelivery() {
        let mut buf = InputBuffer::new();
        buf.submit(input(5));
        buf.submit(input(5));
        buf.submit(input(5));
        assert_eq!(buf.stats().duplicate, 2);
    }

    #[test]
    fn never_redelivers_a_consumed_sequence() {
        let mut buf = InputBuffer::new();
        buf.submit(input(1));
        buf.submit(input(2));
        assert!(buf.submit(input(1)).is_empty());
        assert!(buf.submit(input(2)).is_empty());
    }

    #[test]
    fn gap_timeout_forces_advance() {
        let mut buf = InputBuffer::new();
        buf.submit(input(1));
        buf.submit(input(3));
        std::thread::sleep(Duration::from_millis(120));
        let delivered = buf.submit(input(4));
        assert_eq!(
            delivered.iter().map(|i| i.sequence_number).collect::<Vec<_>>(),
            vec![3, 4]
        );
    }

    #[test]
    fn buffer_cap_forces_advance_even_without_timeout() {
        let mut buf = InputBuffer::new();
        buf.submit(input(1));
        for seq in (3..=(BUFFER_CAP as u32 + 2)).rev() {
            buf.submit(input(seq));
        }
        assert!(buf.last_processed() >= 2);
    }
}
