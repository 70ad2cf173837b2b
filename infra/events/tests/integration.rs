use fieldguard_event_bus::{EventBus, EventReceiverExt};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
struct TestEvent(usize);

#[derive(Clone, Debug, PartialEq)]
struct OtherEvent(&'static str);

#[tokio::test]
async fn event_flow() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<TestEvent>().unwrap();

    bus.publish(TestEvent(42)).unwrap();

    let received = rx.next_event().await.unwrap();
    assert_eq!(*received, TestEvent(42));
}

#[tokio::test]
async fn receiver_recovers_from_lag() {
    let bus = EventBus::new();
    let capacity = 2;
    let mut rx = bus.subscribe_with_capacity::<TestEvent>(capacity).unwrap();

    let total = 100;
    for i in 0..total {
        bus.publish(TestEvent(i)).unwrap();
    }

    let first = rx.next_event().await.expect("should recover from lag");
    assert!(
        first.0 >= total - capacity,
        "expected the fresh tail of the buffer (>= {}), got {}",
        total - capacity,
        first.0
    );

    let second = rx.next_event().await.expect("should continue receiving");
    assert_eq!(second.0, first.0 + 1);
}

#[tokio::test]
async fn every_subscriber_sees_every_event() {
    let bus = EventBus::new();
    let mut rx1 = bus.subscribe::<TestEvent>().unwrap();
    let mut rx2 = bus.subscribe::<TestEvent>().unwrap();

    assert_eq!(bus.publish(TestEvent(100)).unwrap(), 2);

    assert_eq!(rx1.next_event().await.unwrap().0, 100);
    assert_eq!(rx2.next_event().await.unwrap().0, 100);
}

#[tokio::test]
async fn event_types_are_isolated() {
    let bus = EventBus::new();
    let mut tests = bus.subscribe::<TestEvent>().unwrap();
    let mut others = bus.subscribe::<OtherEvent>().unwrap();

    bus.publish(OtherEvent("other")).unwrap();
    bus.publish(TestEvent(7)).unwrap();

    assert_eq!(tests.next_event().await.unwrap().0, 7);
    assert_eq!(others.next_event().await.unwrap().0, "other");
}

#[tokio::test]
async fn shutdown_ends_streams() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<TestEvent>().unwrap();

    let _ = bus.shutdown();

    let next = tokio::time::timeout(Duration::from_secs(1), rx.next_event())
        .await
        .expect("closed channel must resolve immediately");
    assert!(next.is_none());
}
