//! SeaORM entity definitions for the sample catalog schema.
//!
//! Every table here carries the audited base columns and implements
//! [`AuditedEntity`](crate::entity::AuditedEntity).

pub mod category;
pub mod product;
pub mod product_image;

// Re-exports for public API convenience
pub use category::{ActiveModel as CategoryActiveModel, Entity as CategoryEntity, Model as CategoryModel};
pub use product::{ActiveModel as ProductActiveModel, Entity as ProductEntity, Model as ProductModel};
pub use product_image::{
    ActiveModel as ProductImageActiveModel, Entity as ProductImageEntity, Model as ProductImageModel,
};
