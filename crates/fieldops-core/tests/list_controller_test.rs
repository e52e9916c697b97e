#![allow(clippy::unwrap_used)]
// Behavioural tests for `ListController` against an in-memory data source.

mod common;

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::Ordering;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{FakeSource, harness, options};
use fieldops_core::model::catalog::{CUSTOMERS, WORK_ORDERS};
use fieldops_core::{
    CoreError, DeleteGate, Dialog, FetchOutcome, ListOptions, MemoryColumnStore,
    NotificationLevel,
};

fn ids(controller: &fieldops_core::ListController) -> Vec<String> {
    controller
        .snapshot()
        .result
        .items
        .iter()
        .filter_map(fieldops_core::Entity::id)
        .collect()
}

// ── Pagination ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_mount_loads_first_page() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), options(25));

    let outcome = h.controller.mount().await;

    assert!(matches!(outcome, FetchOutcome::Loaded { items: 25, total_count: 47, page: 1 }));
    let state = h.controller.snapshot();
    assert_eq!(state.result.total_pages, 2);
    assert!(!state.is_loading);
    assert!(state.error.is_none());
    assert!(state.last_fetched_at.is_some());
    assert!(state.has_next_page());
    assert!(!state.has_prev_page());
}

#[tokio::test]
async fn test_last_page_and_out_of_range() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;

    let outcome = h.controller.set_page(2).await;
    assert!(matches!(outcome, FetchOutcome::Loaded { items: 22, .. }));

    let calls = h.source.list_count();
    assert!(matches!(h.controller.set_page(3).await, FetchOutcome::Skipped));
    assert!(matches!(h.controller.set_page(0).await, FetchOutcome::Skipped));
    assert!(matches!(h.controller.next_page().await, FetchOutcome::Skipped));
    assert_eq!(h.source.list_count(), calls);
    assert_eq!(h.controller.snapshot().query.page, 2);
}

#[tokio::test]
async fn test_pages_are_disjoint_and_bounded() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), options(10));
    h.controller.mount().await;
    let total_pages = h.controller.snapshot().result.total_pages;
    assert_eq!(total_pages, 5);

    let mut seen = HashSet::new();
    for page in 1..=total_pages {
        h.controller.set_page(page).await;
        let rows = ids(&h.controller);
        assert!(rows.len() <= 10);
        for id in rows {
            assert!(seen.insert(id.clone()), "id {id} appeared on two pages");
        }
    }
    assert_eq!(seen.len(), 47);
}

#[tokio::test]
async fn test_prev_page_walks_back() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;
    h.controller.next_page().await;
    assert_eq!(h.controller.snapshot().query.page, 2);
    h.controller.prev_page().await;
    assert_eq!(h.controller.snapshot().query.page, 1);
    assert!(matches!(h.controller.prev_page().await, FetchOutcome::Skipped));
}

// ── Search ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_submit_search_resets_to_first_page() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), options(10));
    h.controller.mount().await;
    h.controller.set_page(3).await;

    h.controller.set_search_term("acme");
    // Not applied until submitted.
    assert_eq!(h.source.last_query().search, "");
    assert_eq!(h.controller.snapshot().pending_search, "acme");

    h.controller.submit_search().await;

    let query = h.source.last_query();
    assert_eq!(query.search, "acme");
    assert_eq!(query.page, 1);
    assert_eq!(query.to_params().search.as_deref(), Some("acme"));
    assert_eq!(h.controller.snapshot().query.page, 1);
}

#[tokio::test(start_paused = true)]
async fn test_live_search_is_debounced() {
    let opts = ListOptions {
        page_size: 25,
        live_search: true,
        search_debounce: Duration::from_millis(300),
        ..ListOptions::default()
    };
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), opts);
    h.controller.mount().await;
    assert_eq!(h.source.list_count(), 1);

    h.controller.set_search_term("a");
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.controller.set_search_term("ac");
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.controller.set_search_term("acme");
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(h.source.list_count(), 2);
    assert_eq!(h.source.last_query().search, "acme");
    assert_eq!(h.controller.snapshot().query.search, "acme");
}

#[tokio::test(start_paused = true)]
async fn test_stale_response_is_discarded() {
    let source = FakeSource::work_orders(47);
    source.delay_search("slow", Duration::from_millis(500));
    let h = harness(&WORK_ORDERS, source, MemoryColumnStore::new(), options(25));
    h.controller.mount().await;

    h.controller.set_search_term("slow");
    let slow = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.submit_search().await })
    };
    tokio::task::yield_now().await;
    assert!(h.controller.snapshot().is_loading);

    h.controller.set_search_term("acme");
    let fast = h.controller.submit_search().await;
    assert!(fast.is_loaded());

    let late = slow.await.unwrap();
    assert!(matches!(late, FetchOutcome::Stale));

    let state = h.controller.snapshot();
    assert_eq!(state.query.search, "acme");
    assert!(!state.is_loading);
    assert!(!state.result.items.is_empty());
}

// ── Filters ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_clear_sentinel_omits_filter() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;

    h.controller.set_filter("status", "open").await.unwrap();
    assert_eq!(h.source.last_query().filters.get("status").map(String::as_str), Some("open"));
    assert_eq!(h.controller.snapshot().result.total_count, 24);

    h.controller.set_filter("status", "clear").await.unwrap();
    let query = h.source.last_query();
    assert!(!query.filters.contains_key("status"));
    assert!(!query.to_params().to_query().iter().any(|(k, _)| k == "status"));
}

#[tokio::test]
async fn test_all_sentinel_matches_unset_filter() {
    let fresh = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), options(25));
    fresh.controller.mount().await;

    let h = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;
    h.controller.set_filter("status", "all").await.unwrap();

    assert_eq!(h.controller.snapshot().query, fresh.controller.snapshot().query);
    assert_eq!(
        h.source.last_query().to_params().to_query(),
        fresh.source.last_query().to_params().to_query()
    );
}

#[tokio::test]
async fn test_clear_filters_resets_page() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), options(10));
    h.controller.mount().await;
    h.controller.set_filter("status", "open").await.unwrap();
    h.controller.set_page(2).await;
    assert_eq!(h.controller.snapshot().query.page, 2);

    h.controller.clear_filters().await;

    let state = h.controller.snapshot();
    assert!(state.query.filters.is_empty());
    assert_eq!(state.query.page, 1);
    assert_eq!(state.result.total_count, 47);
}

#[tokio::test]
async fn test_unknown_filter_is_rejected() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(5), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;
    let calls = h.source.list_count();

    let err = h.controller.set_filter("colour", "red").await.unwrap_err();

    assert!(matches!(err, CoreError::UnknownFilter { .. }));
    assert_eq!(h.source.list_count(), calls);
}

// ── Failure handling ────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_fetch_keeps_last_good_page() {
    let mut h = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;
    h.drain_toasts();

    h.source.fail_lists.store(true, Ordering::SeqCst);
    let outcome = h.controller.refresh().await;

    assert!(matches!(outcome, FetchOutcome::Failed(CoreError::ConnectionFailed { .. })));
    let state = h.controller.snapshot();
    assert_eq!(state.result.items.len(), 25);
    assert!(state.error.is_some());
    assert!(!state.is_loading);

    let toasts = h.drain_toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, NotificationLevel::Error);

    h.source.fail_lists.store(false, Ordering::SeqCst);
    h.controller.refresh().await;
    assert!(h.controller.snapshot().error.is_none());
}

#[tokio::test]
async fn test_failed_page_change_rolls_back_and_retries() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;

    h.source.fail_lists.store(true, Ordering::SeqCst);
    assert!(matches!(h.controller.set_page(2).await, FetchOutcome::Failed(_)));
    let state = h.controller.snapshot();
    assert_eq!(state.query.page, 1);
    assert_eq!(state.result.page, 1);
    assert!(!state.has_prev_page());

    h.source.fail_lists.store(false, Ordering::SeqCst);
    let outcome = h.controller.set_page(2).await;
    assert!(matches!(outcome, FetchOutcome::Loaded { page: 2, .. }));
    assert_eq!(h.controller.snapshot().result.items.len(), 22);
}

#[tokio::test]
async fn test_failed_filter_change_is_retried() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;

    h.source.fail_lists.store(true, Ordering::SeqCst);
    let failed = h.controller.set_filter("status", "open").await.unwrap();
    assert!(matches!(failed, FetchOutcome::Failed(_)));
    let state = h.controller.snapshot();
    assert!(state.query.filters.is_empty());
    assert_eq!(state.result.total_count, 47);

    h.source.fail_lists.store(false, Ordering::SeqCst);
    let retried = h.controller.set_filter("status", "open").await.unwrap();
    assert!(matches!(retried, FetchOutcome::Loaded { total_count: 24, .. }));
    assert_eq!(h.controller.snapshot().query.filters.get("status").map(String::as_str), Some("open"));
}

#[tokio::test]
async fn test_unchanged_query_after_failed_mount_refetches() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), options(25));
    h.source.fail_lists.store(true, Ordering::SeqCst);
    assert!(matches!(h.controller.mount().await, FetchOutcome::Failed(_)));
    assert!(h.controller.snapshot().applied.is_none());

    h.source.fail_lists.store(false, Ordering::SeqCst);
    let outcome = h.controller.set_filter("status", "all").await.unwrap();
    assert!(outcome.is_loaded());
    assert_eq!(h.source.list_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_filter_changes_settle_on_last_query() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let controller = h.controller.clone();
            let status = if i % 2 == 0 { "open" } else { "completed" };
            tokio::spawn(async move { controller.set_filter("status", status).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let state = h.controller.snapshot();
    assert!(!state.is_loading);
    assert_eq!(state.applied.as_ref(), Some(&state.query));
    let status = state.query.filters.get("status").cloned().unwrap();
    assert!(!state.result.items.is_empty());
    assert!(state.result.items.iter().all(|e| e.display("status") == status));
}

#[tokio::test]
async fn test_oversized_page_is_truncated() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), options(10));
    h.source.overflow.store(true, Ordering::SeqCst);

    h.controller.mount().await;

    assert_eq!(h.controller.snapshot().result.items.len(), 10);
}

// ── Delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_locked_entity_is_never_deleted() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(10), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;

    // Even ids are completed.
    let gate = h.controller.request_delete("2").await.unwrap();
    assert!(matches!(gate, DeleteGate::Locked { ref status, .. } if status == "completed"));
    assert!(matches!(h.controller.snapshot().dialog, Some(Dialog::Locked { .. })));

    let outcome = h.controller.confirm_delete().await.unwrap();
    assert!(matches!(outcome, FetchOutcome::Skipped));
    assert!(h.source.delete_calls.lock().unwrap().is_empty());
    assert!(h.controller.snapshot().dialog.is_none());
}

#[tokio::test]
async fn test_confirmed_delete_refetches() {
    let mut h = harness(&WORK_ORDERS, FakeSource::work_orders(10), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;
    h.drain_toasts();

    let gate = h.controller.request_delete("3").await.unwrap();
    assert_eq!(gate, DeleteGate::Confirm { label: "Service 3".into() });

    h.controller.confirm_delete().await.unwrap();

    assert_eq!(*h.source.delete_calls.lock().unwrap(), vec!["3".to_owned()]);
    let state = h.controller.snapshot();
    assert!(state.dialog.is_none());
    assert_eq!(state.result.total_count, 9);
    assert_eq!(h.drain_toasts()[0].level, NotificationLevel::Success);
}

#[tokio::test]
async fn test_failed_delete_closes_dialog_with_server_message() {
    let mut h = harness(&WORK_ORDERS, FakeSource::work_orders(10), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;
    h.drain_toasts();
    h.source.fail_writes.store(true, Ordering::SeqCst);

    h.controller.request_delete("1").await.unwrap();
    let err = h.controller.confirm_delete().await.unwrap_err();

    assert!(matches!(err, CoreError::Api { .. }));
    assert!(h.controller.snapshot().dialog.is_none());
    let toasts = h.drain_toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].message, "Work order has open invoices");
}

#[tokio::test]
async fn test_delete_not_on_page_is_looked_up() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(47), MemoryColumnStore::new(), options(10));
    h.controller.mount().await;

    let gate = h.controller.request_delete("40").await.unwrap();
    assert!(matches!(gate, DeleteGate::Locked { .. }));
    assert!(h.source.delete_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_emptied_last_page_steps_back() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(51), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;
    h.controller.set_page(3).await;
    assert_eq!(ids(&h.controller), vec!["51".to_owned()]);

    h.controller.request_delete("51").await.unwrap();
    h.controller.confirm_delete().await.unwrap();

    let state = h.controller.snapshot();
    assert_eq!(state.query.page, 2);
    assert_eq!(state.result.items.len(), 25);
    assert_eq!(state.result.total_pages, 2);
}

#[tokio::test]
async fn test_cancel_dialog() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(3), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;
    h.controller.request_delete("1").await.unwrap();

    h.controller.cancel_dialog();

    assert!(h.controller.snapshot().dialog.is_none());
    assert!(matches!(h.controller.confirm_delete().await.unwrap(), FetchOutcome::Skipped));
    assert!(h.source.delete_calls.lock().unwrap().is_empty());
}

// ── Create / update ─────────────────────────────────────────────────

#[tokio::test]
async fn test_validation_blocks_create() {
    let h = harness(&CUSTOMERS, FakeSource::new(vec![]), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;

    let err = h
        .controller
        .create_entity(&json!({ "email": "not-an-email" }))
        .await
        .unwrap_err();

    let CoreError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.for_field("name").count(), 1);
    assert_eq!(errors.for_field("email").count(), 1);
    assert!(h.source.create_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_refetches_and_toasts() {
    let mut h = harness(&CUSTOMERS, FakeSource::new(vec![]), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;

    let created = h
        .controller
        .create_entity(&json!({ "name": "Acme Oy", "customer_type": "business" }))
        .await
        .unwrap();

    assert_eq!(created.id().as_deref(), Some("1"));
    assert_eq!(h.controller.snapshot().result.total_count, 1);
    let toasts = h.drain_toasts();
    assert_eq!(toasts[0].message, "Created customer 'Acme Oy'");
}

#[tokio::test]
async fn test_update_validates_present_fields_only() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(3), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;

    let err = h
        .controller
        .update_entity("1", &json!({ "priority": "asap" }))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let updated = h
        .controller
        .update_entity("1", &json!({ "priority": "high" }))
        .await
        .unwrap();
    assert_eq!(updated.display("priority"), "high");
    assert_eq!(h.source.update_calls.lock().unwrap().len(), 1);
}

// ── Columns ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_persisted_columns_drop_unknown_keys() {
    let mut persisted = BTreeMap::new();
    persisted.insert("priority".to_owned(), false);
    persisted.insert("bogus".to_owned(), true);
    let store = MemoryColumnStore::new().with_page("work-orders", persisted);
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(3), store, options(25));

    h.controller.mount().await;

    let columns = h.controller.snapshot().columns;
    assert!(!columns.is_visible("priority"));
    assert!(!columns.contains("bogus"));
    assert!(columns.is_visible("title"));
    assert!(!h.controller.visible_columns().iter().any(|c| c.key == "priority"));
}

#[tokio::test]
async fn test_toggle_twice_restores_and_persists() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(3), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;
    let original = h.controller.snapshot().columns;

    h.controller.toggle_column("status").unwrap();
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.store.get("work-orders").unwrap().get("status"), Some(&false));

    h.controller.toggle_column("status").unwrap();
    assert_eq!(h.controller.snapshot().columns, original);
}

#[tokio::test]
async fn test_toggle_unknown_column_is_a_noop() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(3), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;
    let before = h.controller.snapshot().columns;

    let err = h.controller.toggle_column("favourite_colour").unwrap_err();

    assert!(matches!(err, CoreError::UnknownColumn { .. }));
    assert_eq!(h.controller.snapshot().columns, before);
}

#[tokio::test]
async fn test_show_hide_reset_columns() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(3), MemoryColumnStore::new(), options(25));
    h.controller.mount().await;

    h.controller.hide_all_columns();
    assert!(h.controller.visible_columns().is_empty());

    h.controller.show_all_columns();
    assert_eq!(h.controller.visible_columns().len(), WORK_ORDERS.columns.len());

    h.controller.reset_columns();
    assert!(!h.controller.snapshot().columns.is_visible("created_at"));
    assert!(h.controller.snapshot().columns.is_visible("title"));
}

#[tokio::test]
async fn test_subscribers_see_updates() {
    let h = harness(&WORK_ORDERS, FakeSource::work_orders(3), MemoryColumnStore::new(), options(25));
    let mut rx = h.controller.subscribe();

    h.controller.mount().await;

    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().result.items.len(), 3);
}
