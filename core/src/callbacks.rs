//! Parsing and chunking lifecycle events.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Events emitted while documents are parsed into nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsingEvent {
    /// A batch of documents is about to be parsed.
    NodeParsingStart {
        /// Number of documents in the batch.
        documents: usize,
    },
    /// A batch finished parsing.
    NodeParsingEnd {
        /// Number of nodes produced.
        nodes: usize,
    },
    /// A text is about to be chunked.
    ChunkingStart {
        /// Length of the text in bytes.
        text_len: usize,
    },
    /// A text finished chunking.
    ChunkingEnd {
        /// Number of chunks produced.
        chunks: usize,
    },
}

type Handler = Arc<dyn Fn(&ParsingEvent) + Send + Sync>;

/// Handle returned by [`CallbackManager::on`], used to unregister the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(HandlerId, Handler)>,
}

/// Fan-out of [`ParsingEvent`]s to registered handlers.
///
/// Clones share the same registry. Handlers run synchronously on the thread that
/// dispatched the event, in registration order.
#[derive(Clone, Default)]
pub struct CallbackManager {
    registry: Arc<RwLock<Registry>>,
}

impl fmt::Debug for CallbackManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackManager")
            .field("handlers", &self.registry.read().handlers.len())
            .finish()
    }
}

impl CallbackManager {
    /// Creates a manager with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for every event.
    pub fn on<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&ParsingEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry.write();
        let id = HandlerId(registry.next_id);
        registry.next_id += 1;
        registry.handlers.push((id, Arc::new(handler)));
        id
    }

    /// Unregisters a handler. Returns `false` if it was not registered.
    pub fn off(&self, id: HandlerId) -> bool {
        let mut registry = self.registry.write();
        let before = registry.handlers.len();
        registry.handlers.retain(|(handler_id, _)| *handler_id != id);
        before != registry.handlers.len()
    }

    /// Delivers `event` to every handler.
    pub fn dispatch(&self, event: &ParsingEvent) {
        tracing::trace!(?event, "dispatching parsing event");
        // Snapshot so handlers may register or unregister while running.
        let handlers: Vec<Handler> = self
            .registry
            .read()
            .handlers
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn handlers_receive_events_in_order() {
        let manager = CallbackManager::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        manager.on(move |event| sink.lock().unwrap().push(*event));

        manager.dispatch(&ParsingEvent::ChunkingStart { text_len: 3 });
        manager.dispatch(&ParsingEvent::ChunkingEnd { chunks: 1 });

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ParsingEvent::ChunkingStart { text_len: 3 },
                ParsingEvent::ChunkingEnd { chunks: 1 },
            ]
        );
    }

    #[test]
    fn off_removes_handler() {
        let manager = CallbackManager::new();
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        let id = manager.on(move |_| *sink.lock().unwrap() += 1);

        manager.dispatch(&ParsingEvent::NodeParsingStart { documents: 1 });
        assert!(manager.off(id));
        assert!(!manager.off(id));
        manager.dispatch(&ParsingEvent::NodeParsingEnd { nodes: 1 });

        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn clones_share_handlers() {
        let manager = CallbackManager::new();
        let copy = manager.clone();
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        manager.on(move |_| *sink.lock().unwrap() += 1);
        copy.dispatch(&ParsingEvent::ChunkingEnd { chunks: 0 });
        assert_eq!(*seen.lock().unwrap(), 1);
    }
}
