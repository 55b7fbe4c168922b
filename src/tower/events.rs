//! Typed notifications published by the tower.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TowerEvent {
    /// The ordered floor-id sequence changed.
    FloorIdsChanged(Vec<String>),
    /// A different floor became active.
    FloorChanged,
    /// A pointer hit grid cell `(x, y)` (column, row).
    BlockClicked { x: i32, y: i32 },
}

type Subscriber = Box<dyn FnMut(&TowerEvent) + Send>;

/// Synchronous fan-out to every subscriber, in subscription order.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&TowerEvent) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn emit(&mut self, event: TowerEvent) {
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
