//! Change notifications for the todo store
//!
//! Every mutation produces one `TodoEvent`. Observers are called
//! synchronously, in registration order, before the mutating call returns.

use crate::TodoRecord;

/// A change published by the store
#[derive(Debug, Clone, PartialEq)]
pub enum TodoEvent {
    Added(TodoRecord),
    Updated(TodoRecord),
    /// The removed record; descendants removed with it are not reported
    Deleted(TodoRecord),
    StatusChanged(TodoRecord),
    ExpansionChanged(TodoRecord),
    /// Snapshot of the collection before it was emptied
    Cleared(Vec<TodoRecord>),
    /// The new manual order
    Reordered(Vec<String>),
}

impl TodoEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TodoEvent::Added(_) => EventKind::Added,
            TodoEvent::Updated(_) => EventKind::Updated,
            TodoEvent::Deleted(_) => EventKind::Deleted,
            TodoEvent::StatusChanged(_) => EventKind::StatusChanged,
            TodoEvent::ExpansionChanged(_) => EventKind::ExpansionChanged,
            TodoEvent::Cleared(_) => EventKind::Cleared,
            TodoEvent::Reordered(_) => EventKind::Reordered,
        }
    }

    /// The single record this event is about, if any
    pub fn record(&self) -> Option<&TodoRecord> {
        match self {
            TodoEvent::Added(r)
            | TodoEvent::Updated(r)
            | TodoEvent::Deleted(r)
            | TodoEvent::StatusChanged(r)
            | TodoEvent::ExpansionChanged(r) => Some(r),
            TodoEvent::Cleared(_) | TodoEvent::Reordered(_) => None,
        }
    }
}

/// Discriminant of `TodoEvent`, used for observer filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Added,
    Updated,
    Deleted,
    StatusChanged,
    ExpansionChanged,
    Cleared,
    Reordered,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Added => write!(f, "added"),
            EventKind::Updated => write!(f, "updated"),
            EventKind::Deleted => write!(f, "deleted"),
            EventKind::StatusChanged => write!(f, "statusChanged"),
            EventKind::ExpansionChanged => write!(f, "expansionChanged"),
            EventKind::Cleared => write!(f, "cleared"),
            EventKind::Reordered => write!(f, "reordered"),
        }
    }
}

/// Receives store events
pub trait Observer {
    fn on_event(&mut self, event: &TodoEvent);

    /// Whether this observer wants events of `kind`
    fn handles(&self, _kind: EventKind) -> bool {
        true
    }
}

impl<F: FnMut(&TodoEvent)> Observer for F {
    fn on_event(&mut self, event: &TodoEvent) {
        self(event)
    }
}

/// Handle returned by `Notifier::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Ordered list of observers
#[derive(Default)]
pub struct Notifier {
    observers: Vec<(ObserverId, Box<dyn Observer>)>,
    next_id: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer; it receives events after all earlier ones
    pub fn subscribe(&mut self, observer: impl Observer + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver `event` to every interested observer
    pub fn notify(&mut self, event: &TodoEvent) {
        let kind = event.kind();
        for (_, observer) in self.observers.iter_mut() {
            if observer.handles(kind) {
                observer.on_event(event);
            }
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Logs every event at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl Observer for LoggingObserver {
    fn on_event(&mut self, event: &TodoEvent) {
        match event {
            TodoEvent::Cleared(snapshot) => {
                tracing::debug!(event = %event.kind(), removed = snapshot.len(), "todo event")
            }
            TodoEvent::Reordered(order) => {
                tracing::debug!(event = %event.kind(), len = order.len(), "todo event")
            }
            _ => {
                if let Some(record) = event.record() {
                    tracing::debug!(event = %event.kind(), id = %record.id, "todo event");
                }
            }
        }
    }
}
