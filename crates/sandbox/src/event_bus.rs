//! Synchronous event bus for things the sandbox wants to observe: player
//! movement, chunk streaming and road transitions.
//!
//! Handlers subscribe to one [`EventKind`] and are called in subscription
//! order, on the publishing thread, before [`EventBus::publish`] returns.

use std::collections::HashMap;

use glam::Vec2;
use tileworld_engine::road::RoadId;
use tileworld_engine::world::position::ChunkKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PlayerMoved,
    ChunkLoaded,
    RoadEntered,
    RoadLeft,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    PlayerMoved { from: Vec2, to: Vec2 },
    /// A chunk was created (generated or restored) and is now resident.
    ChunkLoaded(ChunkKey),
    RoadEntered { road: RoadId, name: String },
    RoadLeft { road: RoadId },
}

impl WorldEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PlayerMoved { .. } => EventKind::PlayerMoved,
            Self::ChunkLoaded(_) => EventKind::ChunkLoaded,
            Self::RoadEntered { .. } => EventKind::RoadEntered,
            Self::RoadLeft { .. } => EventKind::RoadLeft,
        }
    }
}

pub type Handler = Box<dyn FnMut(&WorldEvent)>;

#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<EventKind, Vec<Handler>>,
    published: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: EventKind, handler: impl FnMut(&WorldEvent) + 'static) {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
    }

    /// Deliver `event` to every handler of its kind. Returns how many ran.
    pub fn publish(&mut self, event: WorldEvent) -> usize {
        self.published += 1;
        let Some(handlers) = self.handlers.get_mut(&event.kind()) else {
            return 0;
        };
        for handler in handlers.iter_mut() {
            handler(&event);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Events published so far, delivered or not.
    pub fn published(&self) -> u64 {
        self.published
    }
}
