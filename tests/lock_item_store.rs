mod common;

use common::{eventually, settled, WAIT};
use sharekit::keys::LockItemKey;
use sharekit::models::{ApplicationToken, LockItem};
use sharekit::sharing::{LoadContext, SharedReader, SharedReaderKey, SharedSubscriber};
use sharekit::store::{LockItemClient, StoreEvent};
use std::time::Duration;
use tempfile::TempDir;

fn item(token: &str) -> LockItem {
    LockItem::new(ApplicationToken::new(token))
}

#[tokio::test]
async fn test_empty_store_loads_empty_list() {
    let temp_dir = TempDir::new().unwrap();
    let client = LockItemClient::open(temp_dir.path().join("lock_items.json"));
    let reader = SharedReader::new(LockItemKey::new(client), vec![item("placeholder")]);
    settled(&reader).await;

    assert!(reader.wrapped().is_empty());
    assert!(reader.load_error().is_none());
}

#[tokio::test]
async fn test_add_delivers_exactly_the_stored_items() {
    let client = LockItemClient::in_memory();
    let key = LockItemKey::new(client.clone());
    let (subscriber, mut rx) = SharedSubscriber::channel();
    let _subscription = key.subscribe(LoadContext::UserInitiated, subscriber);

    let mail = item("com.example.mail");
    client.add(mail.clone()).await.unwrap();

    let delivered = tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("no delivery after save")
        .expect("subscriber channel closed")
        .expect("re-read failed");
    assert_eq!(delivered, vec![mail]);
}

#[tokio::test]
async fn test_no_delivery_after_cancel() {
    let client = LockItemClient::in_memory();
    let key = LockItemKey::new(client.clone());
    let (subscriber, mut rx) = SharedSubscriber::channel();
    let subscription = key.subscribe(LoadContext::UserInitiated, subscriber);
    assert_eq!(client.events().observer_count(), 1);

    subscription.cancel();
    subscription.cancel();
    assert!(!subscription.is_active());
    assert_eq!(client.events().observer_count(), 0);

    client.add(item("com.example.chat")).await.unwrap();
    let received = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(!matches!(received, Ok(Some(_))));
    drop(subscription);
}

#[tokio::test]
async fn test_cancel_only_removes_own_observer() {
    let client = LockItemClient::in_memory();
    let first = LockItemKey::new(client.clone());
    let second = LockItemKey::new(client.clone());

    let (first_sub, _first_rx) = SharedSubscriber::channel();
    let (second_sub, mut second_rx) = SharedSubscriber::channel();
    let first_subscription = first.subscribe(LoadContext::UserInitiated, first_sub);
    let _second_subscription = second.subscribe(LoadContext::UserInitiated, second_sub);

    first_subscription.cancel();
    assert_eq!(client.events().observer_count(), 1);

    let chat = item("com.example.chat");
    client.add(chat.clone()).await.unwrap();
    let delivered = tokio::time::timeout(WAIT, second_rx.recv())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(delivered, vec![chat]);
}

#[tokio::test]
async fn test_readers_follow_store_mutations() {
    let client = LockItemClient::in_memory();
    let reader = SharedReader::new(LockItemKey::new(client.clone()), Vec::new());
    settled(&reader).await;

    let mail = item("com.example.mail");
    let chat = item("com.example.chat");
    client.add_all(vec![mail.clone(), chat.clone()]).await.unwrap();
    eventually(&reader, |r| r.wrapped().len() == 2).await;

    client.delete(&mail).await.unwrap();
    eventually(&reader, |r| r.wrapped() == vec![chat.clone()]).await;

    client.clear().await.unwrap();
    eventually(&reader, |r| r.wrapped().is_empty()).await;
}

#[tokio::test]
async fn test_dropping_reader_releases_observer() {
    let client = LockItemClient::in_memory();
    let reader = SharedReader::new(LockItemKey::new(client.clone()), Vec::new());
    let clone = reader.clone();
    assert_eq!(client.events().observer_count(), 1);

    drop(reader);
    assert_eq!(client.events().observer_count(), 1);
    drop(clone);
    assert_eq!(client.events().observer_count(), 0);
}

#[tokio::test]
async fn test_items_persist_across_clients() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store").join("lock_items.json");

    let mail = item("com.example.mail");
    let writer = LockItemClient::open(&path);
    writer.add(mail.clone()).await.unwrap();
    writer
        .update(&mail, |stored| stored.token = ApplicationToken::new("com.example.mail2"))
        .await
        .unwrap();

    let reopened = LockItemClient::open(&path);
    let items = reopened.items().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, mail.id);
    assert_eq!(items[0].token.as_str(), "com.example.mail2");
}

#[tokio::test]
async fn test_unchanged_store_does_not_post() {
    let client = LockItemClient::in_memory();
    let posts = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = posts.clone();
    client.events().observe(StoreEvent::DidSave, move |_| {
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    });

    client.clear().await.unwrap();
    client.delete(&item("missing")).await.unwrap();
    assert_eq!(posts.load(std::sync::atomic::Ordering::SeqCst), 0);

    client.add(item("com.example.mail")).await.unwrap();
    assert_eq!(posts.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_simulated_save_notification_triggers_reread() {
    let client = LockItemClient::in_memory();
    let mail = item("com.example.mail");
    client.add(mail.clone()).await.unwrap();

    let key = LockItemKey::new(client.clone());
    let (subscriber, mut rx) = SharedSubscriber::channel();
    let _subscription = key.subscribe(LoadContext::UserInitiated, subscriber);

    client.events().post(&StoreEvent::DidSave);
    let delivered = tokio::time::timeout(WAIT, rx.recv())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(delivered, vec![mail]);
}
