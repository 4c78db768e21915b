use std::time::{Duration, Instant};

/// Fixed-rate accumulator, ported from the classic tick-loop pattern: the
/// caller polls `advance()` as often as it likes and gets back the number
/// of fixed steps that are now due (spec 4.13 step 1).
pub struct FixedTimestep {
    tick_duration: Duration,
    accumulator: Duration,
    last_tick: Instant,
}

impl FixedTimestep {
    pub fn new(rate_hz: u32) -> Self {
        Self {
            tick_duration: Duration::from_secs_f64(1.0 / rate_hz.max(1) as f64),
            accumulator: Duration::ZERO,
            last_tick: Instant::now(),
        }
    }

    pub fn dt_secs(&self) -> f32 {
        self.tick_duration.as_secs_f32()
    }

    /// Advances by the elapsed wall-clock time since the last call, clamps
    /// a huge spike (e.g. after a debugger pause) to a handful of catch-up
    /// ticks, and returns how many fixed ticks are due now.
    pub fn advance(&mut self) -> u32 {
        let now = Instant::now();
        let mut elapsed = now - self.last_tick;
        self.last_tick = now;

        let spike_cap = self.tick_duration * 8;
        if elapsed > spike_cap {
            elapsed = spike_cap;
        }
        self.accumulator += elapsed;

        let mut due = 0;
        while self.accumulator >= self.tick_duration {
            self.accumulator -= self.tick_duration;
            due += 1;
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn accumulates_across_calls_and_fires_once_ready() {
        let mut timestep = FixedTimestep::new(1000);
        assert_eq!(timestep.advance(), 0);
        thread::sleep(Duration::from_millis(5));
        assert!(timestep.advance() >= 1);
    }

    #[test]
    fn clamps_spike_to_a_few_catch_up_ticks() {
        let mut timestep = FixedTimestep::new(1000);
        thread::sleep(Duration::from_millis(50));
        let due = timestep.advance();
        assert!(due <= 8);
    }
}
