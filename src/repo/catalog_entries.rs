use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, SqlErr,
};

use crate::{entities::catalog_entries, state::DatabaseClient};

#[async_trait]
pub trait CatalogEntriesRepo: Send + Sync {
    /// `None` when another entry already owns `meta_url`.
    async fn insert(
        &self,
        model: catalog_entries::Model,
    ) -> Result<Option<catalog_entries::Model>, sea_orm::DbErr>;
    /// `None` when another entry already owns `meta_url`.
    async fn update(
        &self,
        model: catalog_entries::Model,
    ) -> Result<Option<catalog_entries::Model>, sea_orm::DbErr>;
    async fn delete(&self, id: i64) -> Result<bool, sea_orm::DbErr>;
    async fn find_by_id(&self, id: i64)
        -> Result<Option<catalog_entries::Model>, sea_orm::DbErr>;
    async fn list(&self) -> Result<Vec<catalog_entries::Model>, sea_orm::DbErr>;
    /// True when another entry (not `exclude_id`) already owns `meta_url`.
    async fn meta_url_taken(
        &self,
        meta_url: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, sea_orm::DbErr>;
}

fn slug_conflict_as_none(
    result: Result<catalog_entries::Model, sea_orm::DbErr>,
) -> Result<Option<catalog_entries::Model>, sea_orm::DbErr> {
    match result {
        Ok(entry) => Ok(Some(entry)),
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(None),
        Err(err) => Err(err),
    }
}

pub struct SeaOrmCatalogEntriesRepo {
    db: std::sync::Arc<dyn DatabaseClient>,
}

impl SeaOrmCatalogEntriesRepo {
    pub fn new(db: std::sync::Arc<dyn DatabaseClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogEntriesRepo for SeaOrmCatalogEntriesRepo {
    async fn insert(
        &self,
        model: catalog_entries::Model,
    ) -> Result<Option<catalog_entries::Model>, sea_orm::DbErr> {
        let mut active = model.into_active_model().reset_all();
        active.id = NotSet;
        slug_conflict_as_none(active.insert(self.db.conn()).await)
    }

    async fn update(
        &self,
        model: catalog_entries::Model,
    ) -> Result<Option<catalog_entries::Model>, sea_orm::DbErr> {
        slug_conflict_as_none(
            model
                .into_active_model()
                .reset_all()
                .update(self.db.conn())
                .await,
        )
    }

    async fn delete(&self, id: i64) -> Result<bool, sea_orm::DbErr> {
        let result = catalog_entries::Entity::delete_by_id(id)
            .exec(self.db.conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn find_by_id(
        &self,
        id: i64,
    ) -> Result<Option<catalog_entries::Model>, sea_orm::DbErr> {
        catalog_entries::Entity::find_by_id(id)
            .one(self.db.conn())
            .await
    }

    async fn list(&self) -> Result<Vec<catalog_entries::Model>, sea_orm::DbErr> {
        catalog_entries::Entity::find()
            .order_by_asc(catalog_entries::Column::Id)
            .all(self.db.conn())
            .await
    }

    async fn meta_url_taken(
        &self,
        meta_url: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, sea_orm::DbErr> {
        let mut query =
            catalog_entries::Entity::find().filter(catalog_entries::Column::MetaUrl.eq(meta_url));
        if let Some(id) = exclude_id {
            query = query.filter(catalog_entries::Column::Id.ne(id));
        }
        Ok(query.count(self.db.conn()).await? > 0)
    }
}
