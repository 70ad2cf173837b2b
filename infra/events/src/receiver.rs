use crate::bus::Event;
use std::any::type_name;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tracing::error;

/// One step of a subscription.
#[derive(Debug)]
pub enum Delivery<T> {
    /// The next retained event.
    Event(Arc<T>),
    /// The buffer overwrote this many events before they were read.
    Lagged(u64),
}

/// Receiving helpers for bus subscribers.
pub trait EventReceiverExt<T> {
    /// Waits for the next event or a lag report. Returns `None` once the bus has shut
    /// down and the buffer is drained.
    ///
    /// Subscribers that must see every event use this and recover on [`Delivery::Lagged`].
    fn next_delivery(&mut self) -> impl Future<Output = Option<Delivery<T>>> + Send;

    /// Waits for the next event, stepping over any the receiver fell behind on.
    ///
    /// Lost events are reported with `error!` carrying the count.
    fn next_event(&mut self) -> impl Future<Output = Option<Arc<T>>> + Send;
}

impl<T: Event> EventReceiverExt<T> for Receiver<Arc<T>> {
    async fn next_delivery(&mut self) -> Option<Delivery<T>> {
        match self.recv().await {
            Ok(event) => Some(Delivery::Event(event)),
            Err(RecvError::Lagged(lost)) => {
                error!(event = type_name::<T>(), lost, "Subscriber fell behind; events dropped");
                Some(Delivery::Lagged(lost))
            },
            Err(RecvError::Closed) => None,
        }
    }

    async fn next_event(&mut self) -> Option<Arc<T>> {
        loop {
            // Resumes at the oldest event still retained after a lag.
            match self.next_delivery().await? {
                Delivery::Event(event) => break Some(event),
                Delivery::Lagged(_) => {},
            }
        }
    }
}
