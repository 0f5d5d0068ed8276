//! Behaviour every [`Repository`] backend must share.
//!
//! Timestamps are whole seconds so backends with microsecond storage compare
//! equal to what was written.

use chrono::{DateTime, Duration, TimeZone, Utc};
use larder_common::item::{Category, FoodItem, FoodItemPatch, ItemId, NewFoodItem};
use larder_common::lifecycle::is_consistent;

use super::{ListFilter, Repository};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
}

fn input(name: &str, days: i64) -> NewFoodItem {
    NewFoodItem {
        name: name.to_string(),
        expiry_date: t0() + Duration::days(days),
        category: Category::Rte,
        notes: Some(format!("{name} notes")),
    }
}

async fn assert_consistent<R: Repository + ?Sized>(repo: &R) {
    for filter in [ListFilter::Active, ListFilter::Deleted] {
        for item in repo.list(filter).await.unwrap() {
            assert!(is_consistent(&item), "inconsistent trash state: {item:?}");
            assert_eq!(item.is_deleted, filter == ListFilter::Deleted);
        }
    }
}

fn ids(items: &[FoodItem]) -> Vec<&ItemId> {
    items.iter().map(|i| &i.id).collect()
}

pub(crate) async fn run_all<R: Repository + ?Sized>(repo: &R) {
    create_get_list(repo).await;
    soft_delete_then_restore_round_trips(repo).await;
    wrong_state_calls_are_refused(repo).await;
    purge_removes_record(repo).await;
    update_applies_partial_changes(repo).await;
    unknown_ids(repo).await;
    purge_all_deleted_empties_trash(repo).await;
}

async fn create_get_list<R: Repository + ?Sized>(repo: &R) {
    let a = repo.create(input("Milk", 3), t0()).await.unwrap();
    let b = repo
        .create(input("Cheese", 40), t0() + Duration::seconds(1))
        .await
        .unwrap();
    assert_ne!(a.id, b.id);
    assert!(!a.is_deleted);
    assert_eq!(a.deleted_at, None);
    assert_eq!(a.created_at, t0());
    assert_eq!(a.category, Category::Rte);

    assert_eq!(repo.get(&a.id).await.unwrap(), Some(a.clone()));
    let active = repo.list(ListFilter::Active).await.unwrap();
    let active_ids = ids(&active);
    assert!(active_ids.contains(&&a.id));
    assert!(active_ids.contains(&&b.id));
    assert!(!ids(&repo.list(ListFilter::Deleted).await.unwrap()).contains(&&a.id));
    assert_consistent(repo).await;
}

async fn soft_delete_then_restore_round_trips<R: Repository + ?Sized>(repo: &R) {
    let x = repo.create(input("Butter", 5), t0()).await.unwrap();
    let deleted_at = t0() + Duration::hours(1);

    assert!(repo.soft_delete(&x.id, deleted_at).await.unwrap());
    let trashed = repo.get(&x.id).await.unwrap().unwrap();
    assert!(trashed.is_deleted);
    assert_eq!(trashed.deleted_at, Some(deleted_at));
    assert!(ids(&repo.list(ListFilter::Deleted).await.unwrap()).contains(&&x.id));
    assert!(!ids(&repo.list(ListFilter::Active).await.unwrap()).contains(&&x.id));
    assert_consistent(repo).await;

    assert!(repo.restore(&x.id).await.unwrap());
    assert_eq!(repo.get(&x.id).await.unwrap(), Some(x));
    assert_consistent(repo).await;
}

async fn wrong_state_calls_are_refused<R: Repository + ?Sized>(repo: &R) {
    let x = repo.create(input("Kefir", 2), t0()).await.unwrap();
    assert!(!repo.restore(&x.id).await.unwrap(), "restore of active item");
    assert!(!repo.purge(&x.id).await.unwrap(), "purge of active item");
    assert!(repo.get(&x.id).await.unwrap().is_some());

    assert!(repo.soft_delete(&x.id, t0()).await.unwrap());
    assert!(
        !repo.soft_delete(&x.id, t0() + Duration::hours(2)).await.unwrap(),
        "second soft delete"
    );
    let trashed = repo.get(&x.id).await.unwrap().unwrap();
    assert_eq!(trashed.deleted_at, Some(t0()), "deleted_at was overwritten");

    let changes = FoodItemPatch {
        name: Some("Renamed".into()),
        ..Default::default()
    }
    .validate()
    .unwrap();
    assert_eq!(repo.update(&x.id, &changes).await.unwrap(), None);
    assert_eq!(repo.get(&x.id).await.unwrap().unwrap().name, "Kefir");
    assert_consistent(repo).await;
}

async fn purge_removes_record<R: Repository + ?Sized>(repo: &R) {
    let x = repo.create(input("Cream", 1), t0()).await.unwrap();
    assert!(repo.soft_delete(&x.id, t0()).await.unwrap());
    assert!(repo.purge(&x.id).await.unwrap());
    assert_eq!(repo.get(&x.id).await.unwrap(), None);
    assert!(!repo.purge(&x.id).await.unwrap());
    assert!(!repo.restore(&x.id).await.unwrap());
}

async fn update_applies_partial_changes<R: Repository + ?Sized>(repo: &R) {
    let x = repo.create(input("Yogurt", 10), t0()).await.unwrap();
    let new_expiry = t0() + Duration::days(12);

    let changes = FoodItemPatch {
        expiry_date: Some(new_expiry.to_rfc3339()),
        category: Some(Category::Other("Dairy".into())),
        ..Default::default()
    }
    .validate()
    .unwrap();
    let updated = repo.update(&x.id, &changes).await.unwrap().unwrap();
    assert_eq!(updated.expiry_date, new_expiry);
    assert_eq!(updated.category, Category::Other("Dairy".into()));
    assert_eq!(updated.name, x.name);
    assert_eq!(updated.notes, x.notes);
    assert_eq!(updated.created_at, x.created_at);

    let clear_notes = FoodItemPatch {
        notes: Some(None),
        ..Default::default()
    }
    .validate()
    .unwrap();
    let updated = repo.update(&x.id, &clear_notes).await.unwrap().unwrap();
    assert_eq!(updated.notes, None);
    assert_eq!(updated.expiry_date, new_expiry);

    let noop = repo
        .update(&x.id, &FoodItemPatch::default().validate().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(noop, updated);
}

async fn unknown_ids<R: Repository + ?Sized>(repo: &R) {
    let ghost = ItemId::from("does-not-exist");
    assert_eq!(repo.get(&ghost).await.unwrap(), None);
    assert!(!repo.soft_delete(&ghost, t0()).await.unwrap());
    assert!(!repo.restore(&ghost).await.unwrap());
    assert!(!repo.purge(&ghost).await.unwrap());
    let changes = FoodItemPatch::default().validate().unwrap();
    assert_eq!(repo.update(&ghost, &changes).await.unwrap(), None);
}

async fn purge_all_deleted_empties_trash<R: Repository + ?Sized>(repo: &R) {
    let keep = repo.create(input("Eggs", 4), t0()).await.unwrap();
    for name in ["Old milk", "Old cheese"] {
        let x = repo.create(input(name, -3), t0()).await.unwrap();
        assert!(repo.soft_delete(&x.id, t0()).await.unwrap());
    }
    assert!(repo.list(ListFilter::Deleted).await.unwrap().len() >= 2);

    let removed = repo.purge_all_deleted().await.unwrap();
    assert!(removed >= 2);
    assert!(repo.list(ListFilter::Deleted).await.unwrap().is_empty());
    assert!(repo.get(&keep.id).await.unwrap().is_some());
    assert_consistent(repo).await;
}
