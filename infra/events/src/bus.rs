use crate::error::EventBusError;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::{Any, TypeId, type_name};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tracing::{trace, warn};

/// Default broadcast buffer per event type.
/// Store change events are small and drained quickly by the write guard.
pub const DEFAULT_CAPACITY: usize = 256;
const MIN_CAPACITY: usize = 1;

/// Marker trait for types that can be sent across the [`EventBus`].
///
/// Any type that is `Send + Sync + 'static` automatically implements this trait.
pub trait Event: Any + Send + Sync + 'static {}
impl<T: Any + Send + Sync + 'static> Event for T {}

#[derive(Debug)]
struct Channel {
    capacity: usize,
    sender: Box<dyn Any + Send + Sync>,
}

impl Channel {
    fn sender<T: Event>(&self) -> Result<broadcast::Sender<Arc<T>>, EventBusError> {
        self.sender.downcast_ref::<broadcast::Sender<Arc<T>>>().cloned().ok_or_else(|| {
            EventBusError::TypeMismatch {
                message: type_name::<T>().into(),
                context: Some("Unexpected event type".into()),
            }
        })
    }
}

#[derive(Debug, Default)]
struct BusInner {
    channels: RwLock<FxHashMap<TypeId, Channel>>,
    closed: AtomicBool,
}

/// A thread-safe, typed fan-out event bus.
///
/// Channels are created lazily per event type ([`TypeId`]) and shared by every clone
/// of the bus. Subscribers only observe events published after they subscribed.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to events of type `T` with the default buffer capacity.
    ///
    /// # Errors
    /// Returns [`EventBusError::Closed`] after [`EventBus::shutdown`].
    ///
    /// # Examples
    /// ```rust
    /// use fieldguard_event_bus::{EventBus, EventReceiverExt};
    ///
    /// #[derive(Clone, Debug, PartialEq)]
    /// struct UserCreated(u64);
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), fieldguard_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// let mut rx = bus.subscribe::<UserCreated>()?;
    /// bus.publish(UserCreated(1))?;
    /// assert_eq!(rx.next_event().await.unwrap().0, 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe<T: Event>(&self) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        self.subscribe_with_capacity::<T>(DEFAULT_CAPACITY)
    }

    /// Subscribes to events of type `T`, creating the channel with `capacity` if needed.
    ///
    /// An existing channel keeps its original capacity.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidCapacity`] if `capacity` is zero or
    /// [`EventBusError::Closed`] after shutdown.
    pub fn subscribe_with_capacity<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        if capacity < MIN_CAPACITY {
            return Err(EventBusError::InvalidCapacity {
                message: format!("capacity must be >= {MIN_CAPACITY}").into(),
                context: Some(type_name::<T>().into()),
            });
        }
        Ok(self.sender::<T>(capacity)?.subscribe())
    }

    /// Publishes an event to all current subscribers of `T`.
    ///
    /// Returns the number of subscribers that received it; zero means the event was dropped.
    ///
    /// # Errors
    /// Returns [`EventBusError::Closed`] after shutdown.
    pub fn publish<T: Event>(&self, event: T) -> Result<usize, EventBusError> {
        self.publish_arc(Arc::new(event))
    }

    /// Publishes an already shared event without re-wrapping.
    ///
    /// # Errors
    /// Returns [`EventBusError::Closed`] after shutdown.
    pub fn publish_arc<T: Event>(&self, event: Arc<T>) -> Result<usize, EventBusError> {
        let sender = self.sender::<T>(DEFAULT_CAPACITY)?;
        Ok(sender.send(event).map_or_else(
            |_| {
                trace!(event = type_name::<T>(), "Event dropped: no active subscribers");
                0
            },
            |count| {
                trace!(event = type_name::<T>(), count, "Event dispatched");
                count
            },
        ))
    }

    /// Number of live subscribers for `T`.
    #[must_use]
    pub fn subscriber_count<T: Event>(&self) -> usize {
        self.inner
            .channels
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|c| c.sender::<T>().ok())
            .map_or(0, |tx| tx.receiver_count())
    }

    /// Closes the bus by dropping every channel; receivers observe the end of stream.
    ///
    /// Returns the number of channels that were closed.
    pub fn shutdown(&self) -> usize {
        self.inner.closed.store(true, Ordering::Release);
        let mut channels = self.inner.channels.write();
        let count = channels.len();
        channels.clear();
        count
    }

    fn sender<T: Event>(&self, capacity: usize) -> Result<broadcast::Sender<Arc<T>>, EventBusError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(EventBusError::Closed {
                message: "Event bus has been shut down".into(),
                context: Some(type_name::<T>().into()),
            });
        }

        let id = TypeId::of::<T>();
        if let Some(channel) = self.inner.channels.read().get(&id) {
            if channel.capacity != capacity && capacity != DEFAULT_CAPACITY {
                warn!(
                    event = type_name::<T>(),
                    existing_capacity = channel.capacity,
                    requested_capacity = capacity,
                    "Broadcast channel already initialized with a different capacity"
                );
            }
            return channel.sender::<T>();
        }

        let mut channels = self.inner.channels.write();
        let channel = channels.entry(id).or_insert_with(|| {
            trace!(event = type_name::<T>(), capacity, "Initializing new event channel");
            let (tx, _) = broadcast::channel::<Arc<T>>(capacity);
            Channel { capacity, sender: Box::new(tx) }
        });
        channel.sender::<T>()
    }
}
