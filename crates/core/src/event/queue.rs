use super::types::GameEvent;

/// Per-world accumulator for events raised during the current tick by
/// combat, loot, mob AI, and world-progression systems. Drained once per
/// tick by the snapshot builder (spec 4.13).
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: Vec<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.pending.push(event);
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_and_returns_in_order() {
        let mut queue = EventQueue::new();
        queue.push(GameEvent::MobDied { mob_id: 1 });
        queue.push(GameEvent::MobDied { mob_id: 2 });

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(queue.is_empty());
    }
}
