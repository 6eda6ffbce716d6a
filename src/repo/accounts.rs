use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
    SqlErr,
};

use crate::{entities::accounts, state::DatabaseClient};

/// Write-through account storage. Every call persists immediately.
#[async_trait]
pub trait AccountsRepo: Send + Sync {
    /// Inserts `model`, ignoring its `id`, and returns the stored row.
    /// `None` when a row with the same email (or uid) already exists.
    async fn insert(
        &self,
        model: accounts::Model,
    ) -> Result<Option<accounts::Model>, sea_orm::DbErr>;
    /// Writes only the columns `active` marks as `Set` and returns the stored row.
    async fn update(&self, active: accounts::ActiveModel)
        -> Result<accounts::Model, sea_orm::DbErr>;
    async fn find_by_id(&self, id: i64) -> Result<Option<accounts::Model>, sea_orm::DbErr>;
    async fn find_by_email(&self, email: &str)
        -> Result<Option<accounts::Model>, sea_orm::DbErr>;
}

pub struct SeaOrmAccountsRepo {
    db: std::sync::Arc<dyn DatabaseClient>,
}

impl SeaOrmAccountsRepo {
    pub fn new(db: std::sync::Arc<dyn DatabaseClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountsRepo for SeaOrmAccountsRepo {
    async fn insert(
        &self,
        model: accounts::Model,
    ) -> Result<Option<accounts::Model>, sea_orm::DbErr> {
        let mut active = model.into_active_model().reset_all();
        active.id = NotSet;
        match active.insert(self.db.conn()).await {
            Ok(inserted) => Ok(Some(inserted)),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn update(
        &self,
        active: accounts::ActiveModel,
    ) -> Result<accounts::Model, sea_orm::DbErr> {
        active.update(self.db.conn()).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<accounts::Model>, sea_orm::DbErr> {
        accounts::Entity::find_by_id(id).one(self.db.conn()).await
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<accounts::Model>, sea_orm::DbErr> {
        accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(self.db.conn())
            .await
    }
}
