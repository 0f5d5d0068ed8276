use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use futures::StreamExt;
use larder_api_integration::{TestServer, ADMIN_PASSWORD};
use larder_client::watch::cycle;
use larder_client::{subscribe_changes, AlertScheduler, Notice};
use larder_common::alerts::AlertKind;
use larder_common::events::ChangeKind;
use larder_common::item::{Category, FoodItemDraft};
use reqwest::StatusCode;

const EVENT_TIMEOUT: StdDuration = StdDuration::from_secs(5);

#[tokio::test(flavor = "multi_thread")]
async fn verify_password_reports_validity() {
    let server = TestServer::start().await;
    let api = server.api();
    assert!(api.verify_password(ADMIN_PASSWORD).await.unwrap().valid);
    assert!(!api.verify_password("nope").await.unwrap().valid);

    let unconfigured = TestServer::start_with(None).await;
    let reply = unconfigured.api().verify_password("anything").await.unwrap();
    assert!(!reply.valid);
    assert_eq!(reply.message.as_deref(), Some("Admin password not configured"));
}

#[tokio::test(flavor = "multi_thread")]
async fn change_password_is_not_supported() {
    let server = TestServer::start().await;
    let api = server.api();

    let reply = api.change_password(ADMIN_PASSWORD, "new-one").await.unwrap();
    assert!(!reply.success);
    assert!(reply.message.starts_with("Password change not supported"));

    let err = api.change_password("wrong", "new-one").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

    // The old secret still works.
    assert!(api.verify_password(ADMIN_PASSWORD).await.unwrap().valid);
}

#[tokio::test(flavor = "multi_thread")]
async fn health_reports_backend() {
    let server = TestServer::start().await;
    let health = server.api().health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.backend, "memory");
    assert!(health.admin_configured);
}

#[tokio::test(flavor = "multi_thread")]
async fn mutations_publish_change_events() {
    let server = TestServer::start().await;
    let api = server.api();
    let mut events = subscribe_changes(&api.events_url()).await.unwrap();

    let item = api
        .create(&FoodItemDraft::new("Kefir", Utc::now() + Duration::days(7), Category::Lssd))
        .await
        .unwrap();
    api.soft_delete(&item.id, None).await.unwrap();
    api.clear_trash().await.unwrap();

    let mut kinds = Vec::new();
    for _ in 0..3 {
        let event = tokio::time::timeout(EVENT_TIMEOUT, events.next())
            .await
            .expect("event within timeout")
            .expect("stream still open");
        kinds.push(event.kind);
        if event.kind != ChangeKind::TrashCleared {
            assert_eq!(event.id.as_ref(), Some(&item.id));
        }
    }
    assert_eq!(
        kinds,
        vec![ChangeKind::Created, ChangeKind::Deleted, ChangeKind::TrashCleared]
    );
}

/// One watch pass sweeps expired items and raises each threshold alert once.
#[tokio::test(flavor = "multi_thread")]
async fn watch_cycle_sweeps_and_alerts_once() {
    let server = TestServer::start().await;
    server.seed("Soup", Utc::now() - Duration::days(4)).await;
    server.seed("Yoghurt", Utc::now() + Duration::days(3)).await;
    server.seed("Ham", Utc::now() + Duration::days(8)).await;
    server.seed("Oats", Utc::now() + Duration::days(90)).await;

    let mut session = server.session(None);
    let mut scheduler = AlertScheduler::new();

    let notices = cycle(&mut session, &mut scheduler, true).await;
    let summaries: Vec<_> = notices
        .iter()
        .filter_map(|n| match n {
            Notice::AutoDeleted(s) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(summaries, vec!["Auto-deleted: Soup"]);

    let mut alerts: Vec<_> = notices
        .iter()
        .filter_map(|n| match n {
            Notice::Alert(a) => Some(a.kind),
            _ => None,
        })
        .collect();
    alerts.sort_by_key(|k| format!("{k:?}"));
    assert_eq!(alerts, vec![AlertKind::ExpiresIn3Days, AlertKind::ExpiresIn8Days]);
    assert_eq!(session.trash().len(), 1);

    let again = cycle(&mut session, &mut scheduler, true).await;
    assert!(again.iter().all(|n| matches!(n, Notice::Refreshed { .. })));
}
