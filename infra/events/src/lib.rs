//! # Event Bus
//!
//! A typed, asynchronous fan-out bus connecting the document store to the
//! components that react to its writes.
//!
//! * **Type-Safe**: events are identified by their Rust type.
//! * **Fan-out**: every subscriber sees every event published after it subscribed.
//! * **Lag aware**: [`EventReceiverExt::next_delivery`] reports lost events so subscribers can resynchronise.
//!
//! # Example
//!
//! ```rust
//! use fieldguard_event_bus::{EventBus, EventBusError, EventReceiverExt};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct RecordWritten { id: u64 }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!     let mut rx = bus.subscribe::<RecordWritten>()?;
//!     bus.publish(RecordWritten { id: 42 })?;
//!
//!     let event = rx.next_event().await.expect("bus is open");
//!     assert_eq!(event.id, 42);
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod receiver;

pub use bus::{DEFAULT_CAPACITY, Event, EventBus};
pub use error::{EventBusError, EventBusErrorExt};
pub use receiver::{Delivery, EventReceiverExt};
