//! Shared fixtures: an in-memory SQLite database with the catalog schema,
//! fixed audit clocks and sample rows.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use sea_orm::prelude::Decimal;
use sea_orm::{DatabaseConnection, Set};

use common::DatabaseConfig;
use domain::{Anonymous, AuditContext, AuditPolicy, CallerIdentity, FixedClock, IdentityProvider};
use persistence::repository::entities::{category, product, product_image};
use persistence::{Database, RetryPolicy, UnitOfWork};

pub const SENTINEL: &str = "Website Copolitan";

/// Fresh migrated database. One connection, so the in-memory schema is
/// shared by every statement of the test.
pub async fn connect() -> DatabaseConnection {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        connect_timeout_secs: 5,
        acquire_timeout_secs: 5,
        sql_logging: false,
    };

    Database::connect(&config)
        .await
        .expect("connect to sqlite and migrate")
        .get_connection()
}

pub fn created_instant() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-03-10T08:30:00+03:00").unwrap()
}

pub fn modified_instant() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-03-11T17:45:00+03:00").unwrap()
}

pub fn audit_at(identity: Arc<dyn IdentityProvider>, at: DateTime<FixedOffset>) -> AuditContext {
    AuditContext::new(identity, Arc::new(FixedClock(at)), AuditPolicy::default())
}

pub fn anonymous() -> AuditContext {
    audit_at(Arc::new(Anonymous), created_instant())
}

pub fn signed_in(user_id: &str) -> AuditContext {
    audit_at(Arc::new(CallerIdentity::new(user_id, "Test User")), modified_instant())
}

/// Anonymous callers may not delete.
pub fn strict_anonymous() -> AuditContext {
    AuditContext::new(
        Arc::new(Anonymous),
        Arc::new(FixedClock(created_instant())),
        AuditPolicy {
            require_actor_on_delete: true,
            ..AuditPolicy::default()
        },
    )
}

pub async fn unit_of_work(audit: AuditContext) -> UnitOfWork {
    UnitOfWork::with_connection(connect().await, audit, RetryPolicy::none())
}

pub fn new_category(name: &str) -> category::ActiveModel {
    category::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        ..Default::default()
    }
}

pub fn new_product(category_id: i64, sku: &str, price: Decimal) -> product::ActiveModel {
    product::ActiveModel {
        category_id: Set(category_id),
        name: Set(format!("Product {}", sku)),
        sku: Set(sku.to_string()),
        price: Set(price),
        ..Default::default()
    }
}

pub fn new_image(product_id: i64, position: i32) -> product_image::ActiveModel {
    product_image::ActiveModel {
        product_id: Set(product_id),
        url: Set(format!("https://cdn.example.com/{}/{}.jpg", product_id, position)),
        position: Set(position),
        ..Default::default()
    }
}

/// 12.50, exact in binary so SQLite's REAL storage keeps it
pub fn price() -> Decimal {
    Decimal::new(1250, 2)
}
