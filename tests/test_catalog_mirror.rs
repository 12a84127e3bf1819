//! Integration tests for the catalog mirror.
//!
//! Tests cover:
//! - Snapshot replacement and handler dispatch
//! - Fetch failures leaving the previous snapshot in place
//! - Overlapping fetches resolving to the last completion
//! - Feed-driven refreshes and unsubscription

mod common;

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use common::*;

fn counting_handler() -> (
    Arc<AtomicUsize>,
    impl Fn(&Arc<CatalogSnapshot>) + Send + Sync + 'static,
) {
    let count = Arc::new(AtomicUsize::new(0));
    let handler_count = count.clone();
    (count, move |_: &Arc<CatalogSnapshot>| {
        handler_count.fetch_add(1, Ordering::SeqCst);
    })
}

#[tokio::test]
async fn test_load_replaces_snapshot_and_notifies_once() -> anyhow::Result<()> {
    let source = ScriptedSource::new();
    source.push_items(sample_menu());
    let mirror = CatalogMirror::new(source);
    let feed = ChannelFeed::new();
    let (count, handler) = counting_handler();
    let _handle = mirror.subscribe_to_changes(&feed, handler)?;

    assert_eq!(mirror.snapshot().revision(), 0);
    assert!(mirror.snapshot().is_empty());

    let snapshot = mirror.load().await?;

    assert_eq!(snapshot.revision(), 1);
    assert_eq!(snapshot.items(), sample_menu().as_slice());
    assert!(snapshot.fetched_at().is_some());
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(!mirror.is_loading());

    Ok(())
}

#[tokio::test]
async fn test_failed_load_keeps_previous_snapshot() -> anyhow::Result<()> {
    let source = ScriptedSource::new();
    source.push_items(sample_menu());
    source.push_failure("backend unavailable");
    let mirror = CatalogMirror::new(source);
    let feed = ChannelFeed::new();
    let (count, handler) = counting_handler();
    let _handle = mirror.subscribe_to_changes(&feed, handler)?;

    let first = mirror.load().await?;
    let result = mirror.load().await;

    let Err(CatalogError::FetchFailed(source)) = result else {
        panic!("expected a fetch failure");
    };
    assert!(source.to_string().contains("backend unavailable"));
    assert!(Arc::ptr_eq(&mirror.snapshot(), &first));
    assert_eq!(mirror.snapshot().revision(), 1);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn test_last_completed_fetch_wins() -> anyhow::Result<()> {
    let source = ScriptedSource::new();
    let first_gate = source.push_gate();
    let second_gate = source.push_gate();
    let mirror = CatalogMirror::new(source.clone());

    let first = tokio::spawn({
        let mirror = mirror.clone();
        async move { mirror.load().await }
    });
    let second = tokio::spawn({
        let mirror = mirror.clone();
        async move { mirror.load().await }
    });
    wait_until(|| source.calls() == 2).await;
    assert!(mirror.is_loading());

    // The fetch triggered second completes first.
    second_gate.send(generation_menu(2, 3)).unwrap();
    wait_until(|| mirror.snapshot().revision() == 1).await;
    assert_eq!(mirror.snapshot().items(), generation_menu(2, 3).as_slice());

    first_gate.send(generation_menu(1, 4)).unwrap();
    first.await??;
    second.await??;

    let snapshot = mirror.snapshot();
    assert_eq!(snapshot.revision(), 2);
    assert_eq!(snapshot.items(), generation_menu(1, 4).as_slice());
    assert!(!mirror.is_loading());

    Ok(())
}

#[tokio::test]
async fn test_feed_notice_triggers_reload() -> anyhow::Result<()> {
    let source = ScriptedSource::new();
    source.push_items(sample_menu());
    let mirror = CatalogMirror::new(source.clone());
    let feed = ChannelFeed::new();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let _handle = mirror.subscribe_to_changes(&feed, move |snapshot| {
        tx.send(snapshot.revision()).unwrap();
    })?;

    assert_eq!(
        feed.notify(ChangeNotice {
            payload: Some(serde_json::json!({ "eventType": "UPDATE" })),
        }),
        1
    );

    let revision = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv()).await?;
    assert_eq!(revision, Some(1));
    assert_eq!(mirror.snapshot().items(), sample_menu().as_slice());
    assert_eq!(source.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_notice_burst_never_mixes_fetches() -> anyhow::Result<()> {
    let source = ScriptedSource::new();
    let bursts = 6;
    for generation in 0..bursts {
        source.push_items(generation_menu(generation, 5));
    }
    let mirror = CatalogMirror::new(source.clone());
    let feed = ChannelFeed::new();

    let torn = Arc::new(AtomicBool::new(false));
    let seen = Arc::new(AtomicUsize::new(0));
    let _handle = mirror.subscribe_to_changes(&feed, {
        let torn = torn.clone();
        let seen = seen.clone();
        move |snapshot: &Arc<CatalogSnapshot>| {
            let first = snapshot.items()[0].category.clone();
            if snapshot.items().iter().any(|item| item.category != first) {
                torn.store(true, Ordering::SeqCst);
            }
            seen.fetch_add(1, Ordering::SeqCst);
        }
    })?;

    for _ in 0..bursts {
        feed.notify(ChangeNotice::default());
    }
    wait_until(|| seen.load(Ordering::SeqCst) == bursts).await;

    assert!(!torn.load(Ordering::SeqCst));
    assert_eq!(mirror.snapshot().revision(), bursts as u64);
    let final_items = mirror.snapshot();
    let category = &final_items.items()[0].category;
    assert!(final_items.items().iter().all(|item| &item.category == category));

    Ok(())
}

#[tokio::test]
async fn test_unsubscribe_lets_in_flight_load_finish_silently() -> anyhow::Result<()> {
    let source = ScriptedSource::new();
    let gate = source.push_gate();
    let mirror = CatalogMirror::new(source.clone());
    let feed = ChannelFeed::new();
    let (count, handler) = counting_handler();
    let handle = mirror.subscribe_to_changes(&feed, handler)?;
    assert_eq!(mirror.subscriber_count(), 1);

    feed.notify(ChangeNotice::default());
    wait_until(|| source.calls() == 1).await;

    mirror.unsubscribe(handle);
    assert_eq!(mirror.subscriber_count(), 0);

    gate.send(sample_menu()).unwrap();
    wait_until(|| mirror.snapshot().revision() == 1).await;

    assert_eq!(mirror.snapshot().items(), sample_menu().as_slice());
    assert_eq!(count.load(Ordering::SeqCst), 0);

    // The feed loop is gone, so the feed loses its subscriber.
    wait_until(|| feed.subscriber_count() == 0).await;
    assert_eq!(feed.notify(ChangeNotice::default()), 0);
    assert_eq!(source.calls(), 1);

    Ok(())
}

/// Test that handlers observe replacements in revision order when loads
/// complete on different worker threads.
///
/// Test steps:
/// 1. Subscribe a handler that records every revision it is given
/// 2. Run many loads at once on a multi-threaded runtime
/// 3. Expect strictly increasing revisions ending at the visible snapshot
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_handlers_see_revisions_in_order_across_threads() -> anyhow::Result<()> {
    let loads = 64;
    let source = ScriptedSource::new();
    for generation in 0..loads {
        source.push_items(generation_menu(generation, 3));
    }
    let mirror = CatalogMirror::new(source);
    let feed = ChannelFeed::new();

    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let _handle = mirror.subscribe_to_changes(&feed, {
        let seen = seen.clone();
        move |snapshot: &Arc<CatalogSnapshot>| {
            seen.lock().unwrap().push(snapshot.revision());
        }
    })?;

    let tasks: Vec<_> = (0..loads)
        .map(|_| {
            let mirror = mirror.clone();
            tokio::spawn(async move { mirror.load().await })
        })
        .collect();
    for task in tasks {
        task.await??;
    }

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), loads);
    assert!(seen.windows(2).all(|pair| pair[0] < pair[1]), "out of order: {seen:?}");
    assert_eq!(seen.last().copied(), Some(mirror.snapshot().revision()));

    Ok(())
}
