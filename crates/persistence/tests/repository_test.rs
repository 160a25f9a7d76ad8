//! Generic repository behaviour against an in-memory catalog database.

mod fixtures;

use std::sync::Arc;

use sea_orm::prelude::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, FromQueryResult, QuerySelect};
use tokio_test::{assert_err, assert_ok};

use common::AppError;
use domain::{CallerIdentity, FixedClock, MockClock, MockIdentityProvider};
use persistence::repository::entities::{category, product, product_image};
use persistence::repository::entities::{CategoryEntity, ProductEntity, ProductImageEntity};
use persistence::{GenericRepository, Projection, QuerySpec};

use fixtures::*;

#[tokio::test]
async fn test_add_then_get_by_id_returns_stored_snapshot() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    let stored = categories.add(new_category("Tools")).await.unwrap();
    let found = categories
        .get_by_id(&Projection::entity(), stored.id, &QuerySpec::new())
        .await
        .unwrap();

    assert_eq!(found, Some(stored));
}

#[tokio::test]
async fn test_anonymous_insert_uses_sentinel_actor() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    let stored = categories.add(new_category("Tools")).await.unwrap();

    assert_eq!(stored.created_by, SENTINEL);
    assert_eq!(stored.created_at, created_instant());
    assert!(!stored.is_deleted);
    assert_eq!(stored.last_modified_by, None);
    assert_eq!(stored.last_modified_at, None);
}

#[tokio::test]
async fn test_authenticated_insert_uses_caller_id() {
    let db = connect().await;
    let audit = signed_in("42");
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    let stored = categories.add(new_category("Tools")).await.unwrap();

    assert_eq!(stored.created_by, "42");
}

#[tokio::test]
async fn test_identity_is_read_for_every_write() {
    let db = connect().await;
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_user_id()
        .times(2)
        .returning(|| Some("11".to_string()));
    let audit = domain::AuditContext::new(
        Arc::new(identity),
        Arc::new(FixedClock(created_instant())),
        domain::AuditPolicy::default(),
    );
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    let stored = categories.add(new_category("Tools")).await.unwrap();
    categories.soft_delete(&stored).await.unwrap();

    let deleted = categories
        .get_one(&Projection::entity(), &QuerySpec::new().only_deleted())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(deleted.created_by, "11");
    assert_eq!(deleted.last_modified_by.as_deref(), Some("11"));
}

#[tokio::test]
async fn test_update_restamps_and_keeps_creation_stamp() {
    let db = connect().await;
    let creator = anonymous();
    let stored = GenericRepository::<CategoryEntity, _>::new(&db, &creator, None)
        .add(new_category("Tools"))
        .await
        .unwrap();

    let mut clock = MockClock::new();
    clock.expect_now().returning(modified_instant);
    let editor = domain::AuditContext::new(
        Arc::new(CallerIdentity::new("7", "Editor")),
        Arc::new(clock),
        domain::AuditPolicy::default(),
    );
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &editor, None);

    let mut changed = stored.clone();
    changed.name = "Hand Tools".to_string();
    // attempts to rewrite the creation stamp are ignored
    changed.created_by = "intruder".to_string();
    let rows = categories.update(&changed).await.unwrap();
    assert_eq!(rows, 1);

    let reloaded = categories
        .get_by_id(&Projection::entity(), stored.id, &QuerySpec::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.name, "Hand Tools");
    assert_eq!(reloaded.created_by, SENTINEL);
    assert_eq!(reloaded.created_at, created_instant());
    assert_eq!(reloaded.last_modified_by.as_deref(), Some("7"));
    assert_eq!(reloaded.last_modified_at, Some(modified_instant()));
}

#[tokio::test]
async fn test_soft_deleted_rows_are_hidden_but_retrievable() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    let stored = categories.add(new_category("Tools")).await.unwrap();
    let by_id = QuerySpec::new().filter(category::Column::Id.eq(stored.id));

    assert!(categories.exists(&by_id).await.unwrap());
    assert_eq!(categories.soft_delete(&stored).await.unwrap(), 1);

    assert!(!categories.exists(&by_id).await.unwrap());
    assert_eq!(
        categories
            .get_by_id(&Projection::entity(), stored.id, &QuerySpec::new())
            .await
            .unwrap(),
        None
    );
    assert_eq!(categories.count(&QuerySpec::new()).await.unwrap(), 0);

    let page = categories
        .get_page(
            &Projection::entity(),
            1,
            10,
            &QuerySpec::new()
                .with_deleted()
                .filter(category::Column::Id.eq(stored.id)),
        )
        .await
        .unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.items[0].id, stored.id);
    assert!(page.items[0].is_deleted);
    assert_eq!(page.items[0].last_modified_by.as_deref(), Some(SENTINEL));

    assert_eq!(categories.count(&QuerySpec::new().only_deleted()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_soft_delete_twice_touches_nothing() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    let stored = categories.add(new_category("Tools")).await.unwrap();

    assert_eq!(categories.soft_delete(&stored).await.unwrap(), 1);
    assert_eq!(categories.soft_delete(&stored).await.unwrap(), 0);
}

#[tokio::test]
async fn test_restore_brings_row_back() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    let stored = categories.add(new_category("Tools")).await.unwrap();
    categories.soft_delete(&stored).await.unwrap();

    assert_eq!(categories.restore(&stored).await.unwrap(), 1);
    assert_eq!(categories.count(&QuerySpec::new()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_soft_delete_requires_actor_when_policy_demands() {
    let db = connect().await;
    let audit = strict_anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    let stored = categories.add(new_category("Tools")).await.unwrap();
    let result = categories.soft_delete(&stored).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(categories.count(&QuerySpec::new()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_pages_concatenate_to_ordered_listing() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    let names = ["Garden", "Audio", "Kitchen", "Books", "Toys", "Fashion", "Sports"];
    categories
        .add_many(names.iter().map(|name| new_category(name)).collect())
        .await
        .unwrap();

    let spec = QuerySpec::new().order_by_asc(category::Column::Name);
    let everything = categories.get_all(&Projection::entity(), &spec).await.unwrap();

    let mut paged = Vec::new();
    for page_number in 1..=3 {
        let page = categories
            .get_page(&Projection::entity(), page_number, 3, &spec)
            .await
            .unwrap();
        assert_eq!(page.total_count, 7);
        assert_eq!(page.total_pages(), 3);
        paged.extend(page.items);
    }

    assert_eq!(paged, everything);
    assert_eq!(everything[0].name, "Audio");
    assert_eq!(everything[6].name, "Toys");
}

#[tokio::test]
async fn test_page_bounds_are_validated() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    let zero_page = categories
        .get_page(&Projection::entity(), 0, 10, &QuerySpec::new())
        .await;
    let zero_size = categories
        .get_page(&Projection::entity(), 1, 0, &QuerySpec::new())
        .await;

    assert!(matches!(zero_page, Err(AppError::Validation(_))));
    assert!(matches!(zero_size, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_page_offset_overflow_is_rejected() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);
    categories.add(new_category("Audio")).await.unwrap();

    let huge = categories
        .get_page(&Projection::entity(), u64::MAX, 20, &QuerySpec::new())
        .await;
    let past_signed = categories
        .get_page(&Projection::entity(), u64::MAX / 20, 20, &QuerySpec::new())
        .await;

    assert!(matches!(huge, Err(AppError::Validation(_))));
    assert!(matches!(past_signed, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_get_one_follows_order() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    categories
        .add_many(vec![new_category("Audio"), new_category("Toys"), new_category("Books")])
        .await
        .unwrap();

    let last = categories
        .get_one(
            &Projection::entity(),
            &QuerySpec::new().order_by_desc(category::Column::Name),
        )
        .await
        .unwrap();
    let none = categories
        .get_one(
            &Projection::entity(),
            &QuerySpec::new().filter(category::Column::Name.eq("Garden")),
        )
        .await
        .unwrap();

    assert_eq!(last.map(|c| c.name), Some("Toys".to_string()));
    assert_eq!(none, None);
}

#[derive(Debug, PartialEq, FromQueryResult)]
struct Ranked {
    name: String,
    rank: i32,
}

#[tokio::test]
async fn test_projection_selects_columns_and_expressions() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    let stored = categories.add(new_category("Tools")).await.unwrap();

    let projection = Projection::<CategoryEntity, Ranked>::columns([category::Column::Name])
        .expr_as(Expr::value(1), "rank");
    let row = categories
        .get_by_id(&projection, stored.id, &QuerySpec::new())
        .await
        .unwrap();

    assert_eq!(
        row,
        Some(Ranked {
            name: "Tools".to_string(),
            rank: 1
        })
    );
}

#[tokio::test]
async fn test_join_filters_on_related_columns() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);
    let products = GenericRepository::<ProductEntity, _>::new(&db, &audit, None);

    let tools = categories.add(new_category("Tools")).await.unwrap();
    let toys = categories.add(new_category("Toys")).await.unwrap();
    products
        .add_many(vec![
            new_product(tools.id, "T-1", price()),
            new_product(tools.id, "T-2", price()),
            new_product(toys.id, "Y-1", price()),
        ])
        .await
        .unwrap();

    let spec = QuerySpec::new()
        .join(product::Relation::Category)
        .filter(category::Column::Name.eq("Tools"));

    assert_eq!(products.count(&spec).await.unwrap(), 2);
}

#[tokio::test]
async fn test_deferred_query_composes() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    categories
        .add_many(vec![new_category("Audio"), new_category("Books"), new_category("Toys")])
        .await
        .unwrap();

    let names: Vec<category::Model> = categories
        .get_all_query(
            &Projection::entity(),
            &QuerySpec::new().order_by_asc(category::Column::Name),
        )
        .all(&db)
        .await
        .unwrap();
    let first_two = categories
        .query(&QuerySpec::new().order_by_asc(category::Column::Name))
        .limit(2)
        .all(&db)
        .await
        .unwrap();

    assert_eq!(names.len(), 3);
    assert_eq!(first_two, names[..2].to_vec());
}

#[tokio::test]
async fn test_decimal_price_round_trips() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);
    let products = GenericRepository::<ProductEntity, _>::new(&db, &audit, None);

    let tools = categories.add(new_category("Tools")).await.unwrap();
    let stored = products
        .add(new_product(tools.id, "T-1", Decimal::new(2025, 2)))
        .await
        .unwrap();
    let found = products
        .get_by_id(&Projection::entity(), stored.id, &QuerySpec::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.price, Decimal::new(2025, 2));
}

#[tokio::test]
async fn test_duplicate_insert_is_already_exists() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    assert_ok!(categories.add(new_category("Tools")).await);
    let err = assert_err!(categories.add(new_category("Tools")).await);

    assert!(matches!(err, AppError::AlreadyExists { .. }));
    assert_eq!(err.to_string(), "Entity \"categories\" (new) was added before.");
}

#[tokio::test]
async fn test_duplicate_update_is_conflict() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    categories.add(new_category("Tools")).await.unwrap();
    let mut toys = categories.add(new_category("Toys")).await.unwrap();
    toys.name = "Tools".to_string();

    let err = assert_err!(categories.update(&toys).await);
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_restricted_delete_is_busy_and_keeps_rows() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);
    let products = GenericRepository::<ProductEntity, _>::new(&db, &audit, None);

    let tools = categories.add(new_category("Tools")).await.unwrap();
    products.add(new_product(tools.id, "T-1", price())).await.unwrap();

    let err = assert_err!(categories.delete(&tools).await);

    assert!(matches!(err, AppError::EntityIsBusy { .. }));
    assert_eq!(
        err.to_string(),
        format!("Entity \"categories\" ({}) Is Busy and Can't be deleted.", tools.id)
    );
    assert_eq!(categories.count(&QuerySpec::new()).await.unwrap(), 1);
    assert_eq!(products.count(&QuerySpec::new()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_owned_rows_go_with_their_owner() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);
    let products = GenericRepository::<ProductEntity, _>::new(&db, &audit, None);
    let images = GenericRepository::<ProductImageEntity, _>::new(&db, &audit, None);

    let tools = categories.add(new_category("Tools")).await.unwrap();
    let hammer = products.add(new_product(tools.id, "T-1", price())).await.unwrap();
    images
        .add_many(vec![new_image(hammer.id, 0), new_image(hammer.id, 1)])
        .await
        .unwrap();

    assert_eq!(products.delete(&hammer).await.unwrap(), 1);

    let remaining = images
        .count(&QuerySpec::new().with_deleted().filter(product_image::Column::ProductId.eq(hammer.id)))
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_bulk_operations() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    let mut stored = categories
        .add_many(vec![new_category("Audio"), new_category("Books"), new_category("Toys")])
        .await
        .unwrap();
    assert!(stored.iter().all(|c| c.id > 0 && c.created_by == SENTINEL));

    for category in stored.iter_mut() {
        category.description = Some("seasonal".to_string());
    }
    assert_ok!(categories.bulk_update(&stored).await);
    let described = categories
        .count(&QuerySpec::new().filter(category::Column::Description.eq("seasonal")))
        .await
        .unwrap();
    assert_eq!(described, 3);

    assert_ok!(categories.bulk_delete(&stored[..2]).await);
    assert_eq!(categories.count(&QuerySpec::new().with_deleted()).await.unwrap(), 1);

    assert_eq!(categories.delete_many(&stored[2..]).await.unwrap(), 1);
    assert_eq!(categories.count(&QuerySpec::new().with_deleted()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_soft_delete_many_flags_every_row() {
    let db = connect().await;
    let audit = anonymous();
    let categories = GenericRepository::<CategoryEntity, _>::new(&db, &audit, None);

    let stored = categories
        .add_many(vec![new_category("Audio"), new_category("Books")])
        .await
        .unwrap();

    assert_eq!(categories.soft_delete_many(&stored).await.unwrap(), 2);
    assert_eq!(categories.count(&QuerySpec::new()).await.unwrap(), 0);
    assert_eq!(categories.count(&QuerySpec::new().only_deleted()).await.unwrap(), 2);
}
