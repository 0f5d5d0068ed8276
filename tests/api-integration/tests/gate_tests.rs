use chrono::{Duration, Utc};
use larder_api_integration::{TestServer, ADMIN_PASSWORD};
use larder_client::ClientError;
use larder_common::item::{Category, FoodItemDraft, FoodItemPatch};
use larder_common::TrackerError;
use reqwest::StatusCode;
use serde_json::json;

fn rename(name: &str) -> FoodItemPatch {
    FoodItemPatch {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

/// More than 15 days out: no secret or a wrong one is refused, the right one passes.
#[tokio::test(flavor = "multi_thread")]
async fn far_item_needs_the_secret() {
    let server = TestServer::start().await;
    let api = server.api();
    let item = api
        .create(&FoodItemDraft::new(
            "Rice",
            Utc::now() + Duration::days(16),
            Category::Lssd,
        ))
        .await
        .unwrap();

    let err = api.update(&item.id, rename("Brown rice"), None).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));

    let err = api
        .update(&item.id, rename("Brown rice"), Some("guess"))
        .await
        .unwrap_err();
    assert!(err.is_forbidden());
    assert_eq!(err.to_string(), "Invalid admin password (403 Forbidden)");

    let err = api.soft_delete(&item.id, Some("")).await.unwrap_err();
    assert!(err.is_forbidden());

    let updated = api
        .update(&item.id, rename("Brown rice"), Some(ADMIN_PASSWORD))
        .await
        .unwrap();
    assert_eq!(updated.name, "Brown rice");

    api.soft_delete(&item.id, Some(ADMIN_PASSWORD)).await.unwrap();
    assert_eq!(api.list_trash().await.unwrap().len(), 1);
}

/// Exactly 15 days out is still open.
#[tokio::test(flavor = "multi_thread")]
async fn item_fifteen_days_out_is_open() {
    let server = TestServer::start().await;
    let api = server.api();
    let item = api
        .create(&FoodItemDraft::new(
            "Bread",
            Utc::now() + Duration::days(15),
            Category::Rte,
        ))
        .await
        .unwrap();

    let updated = api.update(&item.id, rename("Sourdough"), None).await.unwrap();
    assert_eq!(updated.name, "Sourdough");
    api.soft_delete(&item.id, None).await.unwrap();
    assert!(api.list_active().await.unwrap().is_empty());
}

/// A couple of hours past 15 days already counts as the 16th day.
#[tokio::test(flavor = "multi_thread")]
async fn part_day_past_fifteen_is_gated() {
    let server = TestServer::start().await;
    let api = server.api();
    let expiry = Utc::now() + Duration::days(15) + Duration::hours(2);
    let item = server.seed("Tofu", expiry).await;

    let err = api.update(&item.id, rename("Silken tofu"), None).await.unwrap_err();
    assert!(err.is_forbidden());
    assert!(api.soft_delete(&item.id, None).await.unwrap_err().is_forbidden());

    let mut session = server.session(None);
    session.refresh().await.unwrap();
    let err = session.delete(&item.id, &Utc::now()).await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected(TrackerError::Authorization(_))));

    let updated = api
        .update(&item.id, rename("Silken tofu"), Some(ADMIN_PASSWORD))
        .await
        .unwrap();
    assert_eq!(updated.name, "Silken tofu");
    api.soft_delete(&item.id, Some(ADMIN_PASSWORD)).await.unwrap();
}

/// A mistyped patch is only judged once the item exists and the caller passed the gate.
#[tokio::test(flavor = "multi_thread")]
async fn lookup_and_gate_precede_patch_validation() {
    let server = TestServer::start().await;
    let http = reqwest::Client::new();
    let far = server.seed("Honey", Utc::now() + Duration::days(200)).await;
    let near = server.seed("Milk", Utc::now() + Duration::days(2)).await;

    let patch = |id: &str, body: serde_json::Value| {
        http.patch(server.url(&format!("/food-items/{id}"))).json(&body).send()
    };

    let resp = patch("no-such-item", json!({"name": 5})).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = patch(&far.id.0, json!({"name": 5})).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = patch(&far.id.0, json!({"name": 5, "adminPassword": ADMIN_PASSWORD}))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = patch(&near.id.0, json!({"name": 5})).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(server.api().get(&near.id).await.unwrap().name, "Milk");

    let resp = http
        .delete(server.url(&format!("/food-items/{}", far.id)))
        .json(&json!({"adminPassword": 12}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

/// Gated operations fail with 500 when no secret was configured; open ones still work.
#[tokio::test(flavor = "multi_thread")]
async fn unconfigured_secret_fails_closed() {
    let server = TestServer::start_with(None).await;
    let api = server.api();
    let far = api
        .create(&FoodItemDraft::new("Flour", Utc::now() + Duration::days(60), Category::Lssd))
        .await
        .unwrap();
    let near = api
        .create(&FoodItemDraft::new("Milk", Utc::now() + Duration::days(2), Category::Lssd))
        .await
        .unwrap();

    let err = api.soft_delete(&far.id, Some("anything")).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    match err {
        ClientError::Api { message, .. } => assert_eq!(message, "Admin password not configured"),
        other => panic!("unexpected error: {other:?}"),
    }

    api.soft_delete(&near.id, None).await.unwrap();
    let health = api.health().await.unwrap();
    assert!(!health.admin_configured);
}

/// The gate looks at the stored expiry, not the one being proposed.
#[tokio::test(flavor = "multi_thread")]
async fn gate_uses_stored_expiry() {
    let server = TestServer::start().await;
    let api = server.api();
    let item = api
        .create(&FoodItemDraft::new("Eggs", Utc::now() + Duration::days(5), Category::Gm))
        .await
        .unwrap();

    let push_out = FoodItemPatch {
        expiry_date: Some((Utc::now() + Duration::days(40)).to_rfc3339()),
        ..Default::default()
    };
    api.update(&item.id, push_out, None).await.unwrap();

    let pull_in = FoodItemPatch {
        expiry_date: Some((Utc::now() + Duration::days(5)).to_rfc3339()),
        ..Default::default()
    };
    let err = api.update(&item.id, pull_in.clone(), None).await.unwrap_err();
    assert!(err.is_forbidden());
    api.update(&item.id, pull_in, Some(ADMIN_PASSWORD)).await.unwrap();
}

/// The session refuses locally before sending when it has no secret to offer.
#[tokio::test(flavor = "multi_thread")]
async fn session_prechecks_gate() {
    let server = TestServer::start().await;
    let far = server.seed("Honey", Utc::now() + Duration::days(200)).await;

    let mut session = server.session(None);
    session.refresh().await.unwrap();
    let err = session.delete(&far.id, &Utc::now()).await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected(TrackerError::Authorization(_))));
    assert_eq!(server.api().list_active().await.unwrap().len(), 1);

    let mut admin = server.session(Some(ADMIN_PASSWORD));
    admin.refresh().await.unwrap();
    admin.delete(&far.id, &Utc::now()).await.unwrap();
    assert!(admin.active().is_empty());
    assert_eq!(admin.trash().len(), 1);
}
