use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    entities::catalog_entries,
    repo::catalog_entries::CatalogEntriesRepo,
    service::slug::SlugNormalizer,
};

const UNSAVED_LABEL: &str = "Add new";
const SLUG_WRITE_ATTEMPTS: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },
    /// Another writer claimed the normalized slug on every attempt.
    #[error("meta_url {meta_url} is already taken")]
    SlugConflict { meta_url: String },
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}

impl CatalogError {
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Validation { .. } => "validation_failed",
            CatalogError::SlugConflict { .. } => "slug_conflict",
            CatalogError::Db(_) => "db_error",
        }
    }
}

/// Admin form payload. Absent fields keep their current (or default) value.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct CatalogEntryInput {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub price_special: Option<Decimal>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub price_special_from: Option<DateTimeWithTimeZone>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub price_special_to: Option<DateTimeWithTimeZone>,
    pub is_new: Option<bool>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub new_from: Option<DateTimeWithTimeZone>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub new_to: Option<DateTimeWithTimeZone>,
    pub description_short: Option<String>,
    pub description: Option<String>,
    pub status: Option<bool>,
    pub comment_status: Option<bool>,
    pub hidden: Option<bool>,
    pub meta_url: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
}

impl CatalogEntryInput {
    fn apply_to(self, entry: &mut catalog_entries::Model) {
        if let Some(name) = self.name {
            entry.name = name;
        }
        if let Some(description) = self.description {
            entry.description = description;
        }
        if let Some(meta_url) = self.meta_url {
            entry.meta_url = meta_url;
        }
        if let Some(is_new) = self.is_new {
            entry.is_new = is_new;
        }
        if let Some(status) = self.status {
            entry.status = status;
        }
        if let Some(comment_status) = self.comment_status {
            entry.comment_status = comment_status;
        }
        if let Some(hidden) = self.hidden {
            entry.hidden = hidden;
        }

        entry.sku = self.sku.or(entry.sku.take());
        entry.price = self.price.or(entry.price);
        entry.price_special = self.price_special.or(entry.price_special);
        entry.price_special_from = self.price_special_from.or(entry.price_special_from);
        entry.price_special_to = self.price_special_to.or(entry.price_special_to);
        entry.new_from = self.new_from.or(entry.new_from);
        entry.new_to = self.new_to.or(entry.new_to);
        entry.description_short = self.description_short.or(entry.description_short.take());
        entry.meta_title = self.meta_title.or(entry.meta_title.take());
        entry.meta_description = self.meta_description.or(entry.meta_description.take());
        entry.meta_keywords = self.meta_keywords.or(entry.meta_keywords.take());
    }
}

fn blank_entry() -> catalog_entries::Model {
    let now = Utc::now();
    catalog_entries::Model {
        id: 0,
        name: String::new(),
        sku: None,
        price: None,
        price_special: None,
        price_special_from: None,
        price_special_to: None,
        is_new: false,
        new_from: None,
        new_to: None,
        description_short: None,
        description: String::new(),
        status: false,
        comment_status: false,
        hidden: false,
        meta_url: String::new(),
        meta_title: None,
        meta_description: None,
        meta_keywords: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

pub fn validate(entry: &catalog_entries::Model) -> Result<(), CatalogError> {
    for (field, value) in [
        ("name", &entry.name),
        ("description", &entry.description),
        ("meta_url", &entry.meta_url),
    ] {
        if value.trim().is_empty() {
            return Err(CatalogError::Validation {
                field,
                message: "must not be blank",
            });
        }
    }
    Ok(())
}

/// Display label: the entry name once persisted.
pub fn label(entry: &catalog_entries::Model) -> String {
    if entry.id == 0 {
        UNSAVED_LABEL.to_string()
    } else {
        entry.name.clone()
    }
}

#[async_trait]
pub trait CatalogAdmin: Send + Sync {
    async fn list(&self) -> Result<Vec<catalog_entries::Model>, CatalogError>;
    async fn get(&self, id: i64) -> Result<Option<catalog_entries::Model>, CatalogError>;
    async fn create(
        &self,
        input: CatalogEntryInput,
    ) -> Result<catalog_entries::Model, CatalogError>;
    async fn update(
        &self,
        id: i64,
        input: CatalogEntryInput,
    ) -> Result<Option<catalog_entries::Model>, CatalogError>;
    async fn delete(&self, id: i64) -> Result<bool, CatalogError>;
    /// Runs before insert: unique slug and both timestamps.
    async fn pre_persist(&self, entry: &mut catalog_entries::Model) -> Result<(), CatalogError>;
    /// Runs before update: unique slug (ignoring the entry itself) and `updated_at`.
    async fn pre_update(&self, entry: &mut catalog_entries::Model) -> Result<(), CatalogError>;
}

pub struct CatalogAdminImpl {
    repo: Arc<dyn CatalogEntriesRepo>,
    slugs: Arc<dyn SlugNormalizer>,
}

impl CatalogAdminImpl {
    pub fn new(repo: Arc<dyn CatalogEntriesRepo>, slugs: Arc<dyn SlugNormalizer>) -> Self {
        Self { repo, slugs }
    }
}

#[async_trait]
impl CatalogAdmin for CatalogAdminImpl {
    async fn list(&self) -> Result<Vec<catalog_entries::Model>, CatalogError> {
        Ok(self.repo.list().await?)
    }

    async fn get(&self, id: i64) -> Result<Option<catalog_entries::Model>, CatalogError> {
        Ok(self.repo.find_by_id(id).await?)
    }

    async fn create(
        &self,
        input: CatalogEntryInput,
    ) -> Result<catalog_entries::Model, CatalogError> {
        let mut entry = blank_entry();
        input.apply_to(&mut entry);
        validate(&entry)?;

        let requested = entry.meta_url.clone();
        for _ in 0..SLUG_WRITE_ATTEMPTS {
            entry.meta_url = requested.clone();
            self.pre_persist(&mut entry).await?;
            if let Some(stored) = self.repo.insert(entry.clone()).await? {
                tracing::info!(entry_id = stored.id, meta_url = %stored.meta_url, "catalog entry created");
                return Ok(stored);
            }
            tracing::warn!(meta_url = %entry.meta_url, "slug claimed concurrently; normalizing again");
        }
        Err(CatalogError::SlugConflict {
            meta_url: entry.meta_url,
        })
    }

    async fn update(
        &self,
        id: i64,
        input: CatalogEntryInput,
    ) -> Result<Option<catalog_entries::Model>, CatalogError> {
        let Some(mut entry) = self.repo.find_by_id(id).await? else {
            return Ok(None);
        };
        input.apply_to(&mut entry);
        validate(&entry)?;

        let requested = entry.meta_url.clone();
        for _ in 0..SLUG_WRITE_ATTEMPTS {
            entry.meta_url = requested.clone();
            self.pre_update(&mut entry).await?;
            if let Some(stored) = self.repo.update(entry.clone()).await? {
                tracing::info!(entry_id = stored.id, "catalog entry updated");
                return Ok(Some(stored));
            }
            tracing::warn!(entry_id = id, meta_url = %entry.meta_url, "slug claimed concurrently; normalizing again");
        }
        Err(CatalogError::SlugConflict {
            meta_url: entry.meta_url,
        })
    }

    async fn delete(&self, id: i64) -> Result<bool, CatalogError> {
        let deleted = self.repo.delete(id).await?;
        if deleted {
            tracing::info!(entry_id = id, "catalog entry deleted");
        }
        Ok(deleted)
    }

    async fn pre_persist(&self, entry: &mut catalog_entries::Model) -> Result<(), CatalogError> {
        entry.meta_url = self.slugs.normalize(&entry.meta_url, None).await?;
        let now = Utc::now();
        entry.created_at = now.into();
        entry.updated_at = now.into();
        Ok(())
    }

    async fn pre_update(&self, entry: &mut catalog_entries::Model) -> Result<(), CatalogError> {
        entry.meta_url = self.slugs.normalize(&entry.meta_url, Some(entry.id)).await?;
        entry.updated_at = Utc::now().into();
        Ok(())
    }
}
