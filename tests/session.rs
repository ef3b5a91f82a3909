mod common;

use applang::domain::AppLabel;
use applang::search::SearchPhase;
use applang::{handle_event, ApplangError, Event, LocaleOverride, Notification, OperationMode, Session};
use applang::directory::PackageEntry;
use common::{harness, harness_with, names, SlowFirstListing};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

async fn search_settled(session: &Session) {
    session
        .subscribe_search_phase()
        .wait_for(|phase| *phase == SearchPhase::Complete)
        .await
        .unwrap();
}

#[tokio::test]
async fn directory_orders_and_filters_end_to_end() {
    let h = harness();

    h.session.refresh_directory().await.unwrap();
    search_settled(&h.session).await;

    let state = h.session.snapshot();
    assert_eq!(state.operation_mode, OperationMode::BrokerService);
    assert!(!state.is_loading);
    assert_eq!(names(state.directory.iter()), ["Alpha", "Beta", "Zeta"]);
    assert_eq!(names(state.search_results.iter()), ["Alpha", "Zeta"]);

    h.session.set_query("alp\n");
    search_settled(&h.session).await;
    assert_eq!(names(h.session.snapshot().search_results.iter()), ["Alpha"]);

    h.session.set_expanded(false).await.unwrap();
    assert!(h.session.toggle_facet(AppLabel::SystemApp));
    search_settled(&h.session).await;

    let state = h.session.snapshot();
    assert!(state.query.is_empty());
    assert_eq!(names(state.search_results.iter()), ["Alpha", "Beta", "Zeta"]);
}

#[tokio::test]
async fn override_moves_record_and_notifies_once() {
    let h = harness();
    h.session.refresh_directory().await.unwrap();

    let moved = h
        .session
        .set_locale_override("com.example.zeta", &LocaleOverride::from_tags(["fr"]))
        .await
        .unwrap();

    assert_eq!(moved, Some(Notification::MovedToTop));
    let state = h.session.snapshot();
    assert_eq!(state.notification, Notification::MovedToTop);
    assert_eq!(names(state.directory.iter()), ["Zeta", "Alpha", "Beta"]);

    assert_eq!(h.session.refresh_record("com.example.zeta").await.unwrap(), None);
    h.session.reset_notification();
    assert_eq!(h.session.snapshot().notification, Notification::None);

    let moved = h
        .session
        .set_locale_override("com.example.zeta", &LocaleOverride::none())
        .await
        .unwrap();

    assert_eq!(moved, Some(Notification::MovedToBottom));
    assert_eq!(names(h.session.snapshot().directory.iter()), ["Alpha", "Beta", "Zeta"]);
}

#[tokio::test(start_paused = true)]
async fn typing_is_debounced_and_last_query_wins() {
    let h = harness();
    h.session.refresh_directory().await.unwrap();
    search_settled(&h.session).await;

    h.session.set_query("al");
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.session.set_query("ze");
    assert_eq!(h.session.search_phase(), SearchPhase::Pending);
    assert_eq!(names(h.session.snapshot().search_results.iter()), ["Alpha", "Zeta"]);

    tokio::time::sleep(Duration::from_millis(400)).await;
    search_settled(&h.session).await;

    assert_eq!(names(h.session.snapshot().search_results.iter()), ["Zeta"]);
}

#[tokio::test]
async fn unchanged_query_is_ignored() {
    let h = harness();
    h.session.refresh_directory().await.unwrap();
    search_settled(&h.session).await;

    h.session.set_query("");
    assert_eq!(h.session.search_phase(), SearchPhase::Complete);
}

#[tokio::test]
async fn selection_history_round_trip() {
    let h = harness();
    h.session.refresh_directory().await.unwrap();

    h.session.select_app("com.example.alpha").await.unwrap();
    h.session.select_app("com.example.zeta").await.unwrap();
    h.session.select_app("com.example.alpha").await.unwrap();

    let state = h.session.snapshot();
    assert_eq!(names(state.history.iter()), ["Alpha", "Zeta"]);
    assert_eq!(h.session.index_of_last_selected(), Some(0));

    h.session.clear_history().await.unwrap();
    assert!(h.session.snapshot().history.is_empty());
    h.session.refresh_history().await.unwrap();
    assert!(h.session.snapshot().history.is_empty());

    assert!(matches!(
        h.session.select_app("com.example.missing").await,
        Err(ApplangError::Package(_))
    ));
}

#[tokio::test]
async fn reload_last_selected_picks_up_external_change() {
    let h = harness();
    h.session.refresh_directory().await.unwrap();
    h.session.select_app("com.example.beta").await.unwrap();

    h.broker
        .overrides
        .lock()
        .unwrap()
        .insert("com.example.beta".to_string(), vec!["de".to_string()]);

    assert_eq!(
        h.session.reload_last_selected().await.unwrap(),
        Some(Notification::MovedToTop)
    );
    assert_eq!(h.session.index_of_last_selected(), Some(0));
}

#[tokio::test]
async fn lost_channel_flags_state_until_reprobe() {
    let h = harness();
    h.session.refresh_directory().await.unwrap();

    h.broker.dead.store(true, Ordering::SeqCst);
    let err = h
        .session
        .set_locale_override("com.example.alpha", &LocaleOverride::from_tags(["it"]))
        .await
        .err();
    assert!(err.is_some_and(|e| e.is_privilege_lost()));
    assert!(h.session.snapshot().privilege_lost);

    h.broker.dead.store(false, Ordering::SeqCst);
    assert_eq!(
        h.session.retry_privilege().await.unwrap(),
        OperationMode::BrokerService
    );
    assert!(!h.session.snapshot().privilege_lost);

    assert_eq!(
        h.session
            .set_locale_override("com.example.alpha", &LocaleOverride::from_tags(["it"]))
            .await
            .unwrap(),
        Some(Notification::MovedToTop)
    );
}

#[tokio::test]
async fn browsing_works_without_any_channel() {
    let h = harness();
    h.broker.reachable.store(false, Ordering::SeqCst);

    h.session.refresh_directory().await.unwrap();

    let state = h.session.snapshot();
    assert_eq!(state.operation_mode, OperationMode::None);
    assert_eq!(names(state.directory.iter()), ["Alpha", "Beta", "Zeta"]);
    assert!(state.directory.iter().all(|r| !r.is_modified()));
    assert!(matches!(
        h.session
            .set_locale_override("com.example.alpha", &LocaleOverride::from_tags(["it"]))
            .await,
        Err(ApplangError::NotPrivileged)
    ));
}

#[tokio::test]
async fn events_dispatch_to_session() {
    let h = harness();

    handle_event(&h.session, Event::Load).await.unwrap();
    handle_event(&h.session, Event::SelectApp("com.example.zeta".to_string()))
        .await
        .unwrap();
    handle_event(
        &h.session,
        Event::SetLocaleOverride {
            package_id: "com.example.zeta".to_string(),
            locales: LocaleOverride::from_tags(["ja"]),
        },
    )
    .await
    .unwrap();
    assert_eq!(h.session.snapshot().notification, Notification::MovedToTop);

    handle_event(&h.session, Event::DismissNotification).await.unwrap();
    handle_event(&h.session, Event::SetExpanded(true)).await.unwrap();

    let state = h.session.snapshot();
    assert_eq!(state.notification, Notification::None);
    assert!(state.is_expanded);
    assert_eq!(names(state.history.iter()), ["Zeta"]);
    assert!(state.history[0].is_modified());
}

#[tokio::test]
async fn newer_directory_build_wins() {
    let h = harness_with(Arc::new(SlowFirstListing {
        calls: AtomicUsize::new(0),
        delay: Duration::from_millis(200),
        first: vec![PackageEntry::new("com.example.old", "Old")],
        rest: vec![PackageEntry::new("com.example.new", "New")],
    }));
    h.session.resolve_mode().await;

    let slow = {
        let session = h.session.clone();
        tokio::spawn(async move { session.refresh_directory().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.session.refresh_directory().await.unwrap();
    slow.await.unwrap().unwrap();

    let state = h.session.snapshot();
    assert_eq!(names(state.directory.iter()), ["New"]);
    assert!(!state.is_loading);
}

#[tokio::test]
async fn loading_is_reported_while_probing() {
    let h = harness();
    h.broker.ping_delay_ms.store(200, Ordering::SeqCst);

    let refresh = {
        let session = h.session.clone();
        tokio::spawn(async move { session.refresh_directory().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let state = h.session.snapshot();
    assert!(state.is_loading);
    assert_eq!(state.operation_mode, OperationMode::None);

    refresh.await.unwrap().unwrap();
    let state = h.session.snapshot();
    assert!(!state.is_loading);
    assert_eq!(state.operation_mode, OperationMode::BrokerService);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_queries_publish_results_for_the_final_query() {
    let h = harness();
    h.session.refresh_directory().await.unwrap();
    search_settled(&h.session).await;

    for _ in 0..25 {
        let typists: Vec<_> = ["al\n", "ze\n"]
            .into_iter()
            .map(|query| {
                let session = h.session.clone();
                tokio::spawn(async move { session.set_query(query) })
            })
            .collect();
        for typist in typists {
            typist.await.unwrap();
        }
        search_settled(&h.session).await;

        let state = h.session.snapshot();
        let expected = match state.query.as_str() {
            "al" => ["Alpha"],
            "ze" => ["Zeta"],
            other => panic!("unexpected query {other:?}"),
        };
        assert_eq!(names(state.search_results.iter()), expected);
    }
}
