//! Catalog service - category use cases over the generic repository.
//!
//! Every operation answers with a [`Response`] envelope; failures carry
//! the error's status code and a user-safe message.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use sea_orm::{ColumnTrait, DatabaseConnection, FromQueryResult, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

use common::{AppError, AppResult, OptionExt, PageRequest, PagedResponse, Response};

use crate::query::{Projection, QuerySpec};
use crate::repository::entities::category::{self, Entity as Category};
use crate::repository::GenericRepository;
use crate::unit_of_work::UnitOfWork;

/// Category as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<FixedOffset>,
}

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCategory {
    #[validate(length(min = 1, max = 100, message = "name must be 1 to 100 characters"))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Catalog service trait for dependency injection.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Live category by id
    async fn get_category(&self, id: i64) -> Response<CategoryView>;

    /// Live categories ordered by name, one page at a time
    async fn list_categories(&self, page: PageRequest) -> PagedResponse<Vec<CategoryView>>;

    async fn create_category(&self, input: NewCategory) -> Response<CategoryView>;

    async fn rename_category(&self, id: i64, name: String) -> Response<CategoryView>;

    /// Soft delete
    async fn remove_category(&self, id: i64) -> Response<()>;

    /// Physical delete; refused while products still reference the category
    async fn purge_category(&self, id: i64) -> Response<()>;
}

/// Concrete implementation of CatalogService over a unit of work.
pub struct CatalogManager {
    uow: Arc<UnitOfWork>,
}

fn view() -> Projection<Category, CategoryView> {
    Projection::columns([
        category::Column::Id,
        category::Column::Name,
        category::Column::Description,
        category::Column::CreatedBy,
        category::Column::CreatedAt,
    ])
}

fn envelope<T>(result: AppResult<T>) -> Response<T> {
    result.map_or_else(|err| err.to_envelope(), Response::success)
}

impl CatalogManager {
    /// Create new catalog service instance with a unit of work
    pub fn new(uow: Arc<UnitOfWork>) -> Self {
        Self { uow }
    }

    fn categories(&self) -> AppResult<GenericRepository<'_, Category, DatabaseConnection>> {
        self.uow.repository::<Category>()
    }

    async fn find(&self, id: i64) -> AppResult<category::Model> {
        self.categories()?
            .get_by_id(&Projection::entity(), id, &QuerySpec::new())
            .await?
            .ok_or_not_found()
    }

    async fn view_of(&self, id: i64) -> AppResult<CategoryView> {
        self.categories()?
            .get_by_id(&view(), id, &QuerySpec::new())
            .await?
            .ok_or_not_found()
    }

    async fn list(&self, page: PageRequest) -> AppResult<PagedResponse<Vec<CategoryView>>> {
        page.validate()?;
        let spec = QuerySpec::new()
            .order_by_asc(category::Column::Name)
            .order_by_asc(category::Column::Id);

        let page = self
            .categories()?
            .get_page(&view(), page.page_number, page.limit(), &spec)
            .await?;
        Ok(page.into())
    }

    async fn create(&self, input: NewCategory) -> AppResult<CategoryView> {
        input.validate()?;
        let name = input.name.trim().to_string();

        let repo = self.categories()?;
        let taken = repo
            .exists(&QuerySpec::new().with_deleted().filter(category::Column::Name.eq(name.as_str())))
            .await?;
        if taken {
            return Err(AppError::already_exists(repo.entity_name(), name));
        }

        let stored = repo
            .add(category::ActiveModel {
                name: Set(name),
                description: Set(input.description),
                ..Default::default()
            })
            .await?;
        tracing::info!(category_id = stored.id, "Category created");

        self.view_of(stored.id).await
    }

    async fn rename(&self, id: i64, name: String) -> AppResult<CategoryView> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("name must be 1 to 100 characters"));
        }

        let mut model = self.find(id).await?;
        model.name = name;
        self.categories()?.update(&model).await?;

        self.view_of(id).await
    }

    async fn remove(&self, id: i64) -> AppResult<()> {
        let model = self.find(id).await?;
        self.categories()?.soft_delete(&model).await?;
        tracing::info!(category_id = id, "Category removed");
        Ok(())
    }

    async fn purge(&self, id: i64) -> AppResult<()> {
        let model = self
            .categories()?
            .get_by_id(&Projection::entity(), id, &QuerySpec::new().with_deleted())
            .await?
            .ok_or_not_found()?;
        self.categories()?.delete(&model).await?;
        tracing::info!(category_id = id, "Category purged");
        Ok(())
    }
}

#[async_trait]
impl CatalogService for CatalogManager {
    async fn get_category(&self, id: i64) -> Response<CategoryView> {
        envelope(self.view_of(id).await)
    }

    async fn list_categories(&self, page: PageRequest) -> PagedResponse<Vec<CategoryView>> {
        match self.list(page).await {
            Ok(response) => response,
            Err(err) => PagedResponse::failure(err.to_envelope(), page.page_number, page.page_size),
        }
    }

    async fn create_category(&self, input: NewCategory) -> Response<CategoryView> {
        match self.create(input).await {
            Ok(view) => Response::with_message(view, "Category created"),
            Err(err) => err.to_envelope(),
        }
    }

    async fn rename_category(&self, id: i64, name: String) -> Response<CategoryView> {
        envelope(self.rename(id, name).await)
    }

    async fn remove_category(&self, id: i64) -> Response<()> {
        match self.remove(id).await {
            Ok(()) => Response::message("Category removed"),
            Err(err) => err.to_envelope(),
        }
    }

    async fn purge_category(&self, id: i64) -> Response<()> {
        match self.purge(id).await {
            Ok(()) => Response::message("Category purged"),
            Err(err) => err.to_envelope(),
        }
    }
}
