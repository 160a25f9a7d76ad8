//! Catalog service envelopes end to end.

mod fixtures;

use std::sync::Arc;

use common::PageRequest;
use persistence::repository::entities::ProductEntity;
use persistence::service::{CatalogManager, CatalogService, NewCategory};

use fixtures::*;

async fn service() -> CatalogManager {
    CatalogManager::new(Arc::new(unit_of_work(signed_in("5")).await))
}

fn input(name: &str) -> NewCategory {
    NewCategory {
        name: name.to_string(),
        description: Some("Workshop supplies".to_string()),
    }
}

#[tokio::test]
async fn test_create_then_get() {
    let catalog = service().await;

    let created = catalog.create_category(input("Tools")).await;
    assert!(created.succeeded);
    assert_eq!(created.status_code, 200);
    assert_eq!(created.message.as_deref(), Some("Category created"));
    let view = created.data.unwrap();
    assert_eq!(view.name, "Tools");
    assert_eq!(view.created_by, "5");

    let fetched = catalog.get_category(view.id).await;
    assert_eq!(fetched.data, Some(view));
}

#[tokio::test]
async fn test_duplicate_name_is_reported() {
    let catalog = service().await;
    catalog.create_category(input("Tools")).await;

    let duplicate = catalog.create_category(input(" Tools ")).await;

    assert!(!duplicate.succeeded);
    assert_eq!(duplicate.status_code, 400);
    assert_eq!(
        duplicate.message.as_deref(),
        Some("Entity \"categories\" (Tools) was added before.")
    );
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let catalog = service().await;

    let response = catalog.create_category(input("")).await;

    assert!(!response.succeeded);
    assert_eq!(response.status_code, 400);
}

#[tokio::test]
async fn test_list_serialises_paged_envelope() {
    let catalog = service().await;
    for name in ["Toys", "Audio", "Books"] {
        catalog.create_category(input(name)).await;
    }

    let page = catalog.list_categories(PageRequest::new(1, 2)).await;
    let json = serde_json::to_value(&page).unwrap();

    assert_eq!(json["succeeded"], true);
    assert_eq!(json["statusCode"], 200);
    assert_eq!(json["pageNumber"], 1);
    assert_eq!(json["pageSize"], 2);
    assert_eq!(json["pg_total"], 3);
    assert_eq!(json["data"][0]["name"], "Audio");
    assert_eq!(json["data"][1]["name"], "Books");
    assert_eq!(json["data"][0]["createdBy"], "5");
    assert!(json["errors"].is_null());
}

#[tokio::test]
async fn test_list_rejects_empty_page_size() {
    let catalog = service().await;

    let page = catalog.list_categories(PageRequest::new(1, 0)).await;

    assert!(!page.succeeded());
    assert_eq!(page.response.status_code, 400);
    assert_eq!(page.total_count, 0);
}

#[tokio::test]
async fn test_list_rejects_page_past_the_last_addressable_row() {
    let catalog = service().await;

    let page = catalog.list_categories(PageRequest::new(u64::MAX, 20)).await;

    assert!(!page.succeeded());
    assert_eq!(page.response.status_code, 400);
    assert_eq!(page.page_number, u64::MAX);
    assert_eq!(page.total_count, 0);
}

#[tokio::test]
async fn test_rename_restamps() {
    let catalog = service().await;
    let created = catalog.create_category(input("Tools")).await.data.unwrap();

    let renamed = catalog.rename_category(created.id, "Hand Tools".to_string()).await;

    assert!(renamed.succeeded);
    let view = renamed.data.unwrap();
    assert_eq!(view.name, "Hand Tools");
    assert_eq!(view.created_at, created.created_at);
}

#[tokio::test]
async fn test_removed_category_is_not_found() {
    let catalog = service().await;
    let created = catalog.create_category(input("Tools")).await.data.unwrap();

    let removed = catalog.remove_category(created.id).await;
    assert!(removed.succeeded);
    assert_eq!(removed.message.as_deref(), Some("Category removed"));

    let fetched = catalog.get_category(created.id).await;
    assert!(!fetched.succeeded);
    assert_eq!(fetched.status_code, 404);

    // a removed name stays reserved
    let again = catalog.create_category(input("Tools")).await;
    assert_eq!(again.status_code, 400);
}

#[tokio::test]
async fn test_purge_refused_while_products_reference_category() {
    let uow = Arc::new(unit_of_work(signed_in("5")).await);
    let catalog = CatalogManager::new(Arc::clone(&uow));
    let created = catalog.create_category(input("Tools")).await.data.unwrap();
    uow.repository::<ProductEntity>()
        .unwrap()
        .add(new_product(created.id, "T-1", price()))
        .await
        .unwrap();

    let purged = catalog.purge_category(created.id).await;

    assert!(!purged.succeeded);
    assert_eq!(purged.status_code, 400);
    assert_eq!(
        purged.message,
        Some(format!(
            "Entity \"categories\" ({}) Is Busy and Can't be deleted.",
            created.id
        ))
    );
    assert!(catalog.get_category(created.id).await.succeeded);
}

#[tokio::test]
async fn test_purge_removes_soft_deleted_category() {
    let catalog = service().await;
    let created = catalog.create_category(input("Tools")).await.data.unwrap();
    catalog.remove_category(created.id).await;

    let purged = catalog.purge_category(created.id).await;

    assert!(purged.succeeded);
    assert_eq!(purged.message.as_deref(), Some("Category purged"));
    assert_eq!(catalog.purge_category(created.id).await.status_code, 404);
}
