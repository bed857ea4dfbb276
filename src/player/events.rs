use std::collections::HashMap;

/// Event categories a listener can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    Pause,
    Stop,
    End,
    Clear,
    Process,
}

/// Notification emitted by the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerEvent {
    Start,
    Pause,
    Stop,
    /// The final loop finished; emitted once per run.
    End,
    Clear,
    /// A tick advanced playback to `frame`.
    Process { frame: u32, progress: f64 },
}

impl PlayerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Start => EventKind::Start,
            Self::Pause => EventKind::Pause,
            Self::Stop => EventKind::Stop,
            Self::End => EventKind::End,
            Self::Clear => EventKind::Clear,
            Self::Process { .. } => EventKind::Process,
        }
    }
}

pub type Listener = Box<dyn FnMut(&PlayerEvent)>;

/// Listeners by event kind, called in registration order.
#[derive(Default)]
pub(crate) struct EventRegistry {
    listeners: HashMap<EventKind, Vec<Listener>>,
}

impl EventRegistry {
    pub(crate) fn on(&mut self, kind: EventKind, listener: Listener) {
        self.listeners.entry(kind).or_default().push(listener);
    }

    pub(crate) fn emit(&mut self, event: PlayerEvent) {
        tracing::trace!(?event, "emit");
        if let Some(ls) = self.listeners.get_mut(&event.kind()) {
            for l in ls.iter_mut() {
                l(&event);
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.listeners.clear();
    }
}
