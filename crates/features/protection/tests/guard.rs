use fieldguard_database::{ChangeKind, DocumentStore, MemoryStore, Record, RecordChanged};
use fieldguard_event_bus::{EventBus, EventReceiverExt};
use fieldguard_protection::{GuardOutcome, ProtectionError, WriteGuard, is_encrypted, is_envelope_shaped};
use fieldguard_vault::{HexKeyProvider, SecretKey, StaticKeyProvider};
use serde_json::json;
use std::sync::Arc;

const HEX_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().expect("object literal")
}

fn setup() -> (MemoryStore, EventBus, WriteGuard<MemoryStore, StaticKeyProvider>) {
    let bus = EventBus::new();
    let store = MemoryStore::new(bus.clone());
    let keys = StaticKeyProvider::new(SecretKey::from_hex(HEX_KEY).unwrap());
    let guard = WriteGuard::new(store.clone(), keys, "users");
    (store, bus, guard)
}

async fn next(rx: &mut tokio::sync::broadcast::Receiver<Arc<RecordChanged>>) -> Arc<RecordChanged> {
    tokio::time::timeout(std::time::Duration::from_secs(1), rx.next_event())
        .await
        .expect("event in time")
        .expect("bus open")
}

#[tokio::test]
async fn sequential_invocations_write_exactly_once() {
    let (store, bus, guard) = setup();
    let mut rx = bus.subscribe::<RecordChanged>().unwrap();

    store.put("users", "u1", record(json!({ "name": "Kim", "email": "k@example.com", "other": 42 }))).await.unwrap();
    let created = next(&mut rx).await;
    assert_eq!(created.kind, ChangeKind::Created);

    assert_eq!(guard.handle(&created).await.unwrap(), GuardOutcome::Persisted { revision: 2 });

    // The write-back raises its own update event, which must terminate the cycle.
    let updated = next(&mut rx).await;
    assert_eq!(updated.revision, 2);
    assert!(is_encrypted(&updated.record));
    assert_eq!(guard.handle(&updated).await.unwrap(), GuardOutcome::Skipped);

    let doc = store.get("users", "u1").await.unwrap().unwrap();
    assert_eq!(doc.revision, 2);
    assert!(is_envelope_shaped(&doc.record["name"]));
    assert!(is_envelope_shaped(&doc.record["email"]));
    assert_eq!(doc.record["other"], 42);
}

#[tokio::test]
async fn replayed_plaintext_event_is_superseded() {
    let (store, bus, guard) = setup();
    let mut rx = bus.subscribe::<RecordChanged>().unwrap();

    store.put("users", "u1", record(json!({ "phone": "555-0100" }))).await.unwrap();
    let created = next(&mut rx).await;

    assert!(matches!(guard.handle(&created).await.unwrap(), GuardOutcome::Persisted { .. }));
    assert_eq!(guard.handle(&created).await.unwrap(), GuardOutcome::Superseded);
    assert_eq!(store.get("users", "u1").await.unwrap().unwrap().revision, 2);
}

#[tokio::test]
async fn concurrent_invocations_produce_one_write() {
    let (store, bus, guard) = setup();
    let mut rx = bus.subscribe::<RecordChanged>().unwrap();

    store.put("users", "u1", record(json!({ "name": "Kim" }))).await.unwrap();
    let created = next(&mut rx).await;

    let (a, b) = tokio::join!(guard.handle(&created), guard.handle(&created));
    let outcomes = [a.unwrap(), b.unwrap()];

    assert_eq!(outcomes.iter().filter(|o| matches!(o, GuardOutcome::Persisted { .. })).count(), 1);
    assert!(outcomes.contains(&GuardOutcome::Superseded));
    assert_eq!(store.get("users", "u1").await.unwrap().unwrap().revision, 2);
}

#[tokio::test]
async fn bad_key_aborts_without_writing() {
    let bus = EventBus::new();
    let store = MemoryStore::new(bus.clone());
    let guard = WriteGuard::new(store.clone(), HexKeyProvider::new(&HEX_KEY[..63]), "users");
    let mut rx = bus.subscribe::<RecordChanged>().unwrap();

    store.put("users", "u1", record(json!({ "name": "Kim" }))).await.unwrap();
    let created = next(&mut rx).await;

    let err = guard.handle(&created).await.unwrap_err();
    assert!(matches!(err, ProtectionError::Config { ref message, .. } if message == "key must be 32-byte hex"));

    let doc = store.get("users", "u1").await.unwrap().unwrap();
    assert_eq!(doc.revision, 1);
    assert_eq!(doc.record["name"], "Kim");
}

#[tokio::test]
async fn other_collections_are_ignored() {
    let (store, _bus, guard) = setup();
    let event = RecordChanged {
        collection: "audit".into(),
        id: "a1".into(),
        revision: 1,
        kind: ChangeKind::Created,
        record: record(json!({ "name": "Kim" })),
    };

    assert_eq!(guard.handle(&event).await.unwrap(), GuardOutcome::Ignored);
    assert!(store.is_empty("audit"));
}

#[tokio::test]
async fn records_without_sensitive_text_are_skipped() {
    let (store, bus, guard) = setup();
    let mut rx = bus.subscribe::<RecordChanged>().unwrap();

    store.put("users", "u1", record(json!({ "other": 42, "phone": null }))).await.unwrap();
    let created = next(&mut rx).await;

    assert_eq!(guard.handle(&created).await.unwrap(), GuardOutcome::Skipped);
    assert_eq!(store.get("users", "u1").await.unwrap().unwrap().revision, 1);
}
