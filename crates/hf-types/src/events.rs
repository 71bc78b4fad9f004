//! Typed event bus for in-process notifications.
//!
//! Every consumer of a table learns about changes from one signal,
//! [`TableInvalidated`], instead of each mutation knowing which views to
//! refresh. The [`EventBus`] keeps one `tokio::broadcast` channel per event
//! type, created lazily on first `subscribe()`.
//!
//! ```rust
//! use hf_types::TableName;
//! use hf_types::events::{EventBus, Mutation, TableInvalidated};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe::<TableInvalidated>();
//!
//! bus.emit(TableInvalidated {
//!     table: TableName::Equipment,
//!     mutation: Mutation::Insert,
//! });
//!
//! let event = rx.recv().await.unwrap();
//! assert_eq!(event.table, TableName::Equipment);
//! # });
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::warn;

use crate::TableName;

/// Marker trait for everything that can travel through the [`EventBus`].
pub trait Event: Any + Send + Sync + Clone + std::fmt::Debug + 'static {}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Which kind of write invalidated a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    Insert,
    Update,
    Delete,
}

/// A table's cached listing is stale and must be re-fetched.
#[derive(Clone, Debug)]
pub struct TableInvalidated {
    /// The table that changed.
    pub table: TableName,
    /// What kind of write changed it.
    pub mutation: Mutation,
}
impl Event for TableInvalidated {}

/// An image was stored and is publicly resolvable.
#[derive(Clone, Debug)]
pub struct ObjectUploaded {
    /// Bucket the object lives in.
    pub bucket: String,
    /// Generated storage key.
    pub key: String,
    /// Size of the stored object in bytes.
    pub size: usize,
}
impl Event for ObjectUploaded {}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

struct EventBusInner {
    channels: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

/// Clonable, thread-safe bus with non-blocking emits.
///
/// Each event type gets an independent channel, so a subscriber of
/// [`ObjectUploaded`] never sees [`TableInvalidated`].
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Mutex<EventBusInner>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventBusInner {
                channels: HashMap::new(),
            })),
        }
    }

    /// Emit an event to all current subscribers of type `E`.
    ///
    /// Events emitted before anyone subscribed are dropped.
    pub fn emit<E: Event>(&self, event: E) {
        let inner = self.inner.lock().expect("event bus lock poisoned");
        if let Some(sender) = inner
            .channels
            .get(&TypeId::of::<E>())
            .and_then(|boxed| boxed.downcast_ref::<broadcast::Sender<E>>())
        {
            // No live receivers is not an error.
            let _ = sender.send(event);
        }
    }

    /// Subscribe to events of type `E`.
    pub fn subscribe<E: Event>(&self) -> EventReceiver<E> {
        let mut inner = self.inner.lock().expect("event bus lock poisoned");
        let sender = inner
            .channels
            .entry(TypeId::of::<E>())
            .or_insert_with(|| {
                let (tx, _) = broadcast::channel::<E>(DEFAULT_CHANNEL_CAPACITY);
                Box::new(tx)
            })
            .downcast_ref::<broadcast::Sender<E>>()
            .expect("type mismatch in event bus");
        EventReceiver {
            rx: sender.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().expect("event bus lock poisoned");
        f.debug_struct("EventBus")
            .field("channel_count", &inner.channels.len())
            .finish()
    }
}

/// Typed receiver for one event type.
pub struct EventReceiver<E: Event> {
    rx: broadcast::Receiver<E>,
}

impl<E: Event> EventReceiver<E> {
    /// Wait for the next event.
    ///
    /// Returns `None` once every bus handle is dropped. Lagged events are
    /// skipped with a warning.
    pub async fn recv(&mut self) -> Option<E> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(
                        skipped = n,
                        event_type = std::any::type_name::<E>(),
                        "event receiver lagged"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Return the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<E> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
