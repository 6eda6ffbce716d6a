//! In-memory doubles for the storage and mail seams.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{prelude::Json, ActiveModelTrait, ActiveValue, DbErr, Iterable, ModelTrait};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};
use uuid::Uuid;

use crate::{
    entities::{accounts, catalog_entries},
    repo::{accounts::AccountsRepo, catalog_entries::CatalogEntriesRepo},
    service::email::{AccountMailer, MailError},
};

pub fn account_model(id: i64, email: &str, roles: Json) -> accounts::Model {
    let now = Utc::now();
    accounts::Model {
        id,
        uid: Uuid::new_v4(),
        account_type: "user".to_string(),
        email: email.to_string(),
        password_hash: String::new(),
        salt: String::new(),
        encoder: "argon2".to_string(),
        enabled: true,
        locked: false,
        roles,
        phone: None,
        website: None,
        facebook: None,
        twitter: None,
        about: None,
        last_login: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

pub fn catalog_entry(id: i64, meta_url: &str) -> catalog_entries::Model {
    let now = Utc::now();
    catalog_entries::Model {
        id,
        name: format!("Entry {id}"),
        sku: None,
        price: None,
        price_special: None,
        price_special_from: None,
        price_special_to: None,
        is_new: false,
        new_from: None,
        new_to: None,
        description_short: None,
        description: "Seeded entry".to_string(),
        status: true,
        comment_status: false,
        hidden: false,
        meta_url: meta_url.to_string(),
        meta_title: None,
        meta_description: None,
        meta_keywords: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[derive(Default)]
pub struct InMemoryAccountsRepo {
    rows: Mutex<Vec<accounts::Model>>,
    writes: AtomicUsize,
}

impl InMemoryAccountsRepo {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn get(&self, id: i64) -> Option<accounts::Model> {
        self.rows.lock().unwrap().iter().find(|row| row.id == id).cloned()
    }
}

#[async_trait]
impl AccountsRepo for InMemoryAccountsRepo {
    async fn insert(&self, mut model: accounts::Model) -> Result<Option<accounts::Model>, DbErr> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|row| row.email == model.email) {
            return Ok(None);
        }
        model.id = rows.iter().map(|row| row.id).max().unwrap_or(0) + 1;
        rows.push(model.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(Some(model))
    }

    /// Applies only the `Set` columns, like an `UPDATE` of the changed fields.
    async fn update(&self, active: accounts::ActiveModel) -> Result<accounts::Model, DbErr> {
        let id = match &active.id {
            ActiveValue::Set(id) | ActiveValue::Unchanged(id) => *id,
            ActiveValue::NotSet => return Err(DbErr::RecordNotUpdated),
        };
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|row| row.id == id) else {
            return Err(DbErr::RecordNotUpdated);
        };
        for column in accounts::Column::iter() {
            if let ActiveValue::Set(value) = active.get(column) {
                row.set(column, value);
            }
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(row.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<accounts::Model>, DbErr> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<accounts::Model>, DbErr> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.email == email)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryCatalogRepo {
    rows: Mutex<Vec<catalog_entries::Model>>,
}

impl InMemoryCatalogRepo {
    pub fn seed(&self, entry: catalog_entries::Model) {
        self.rows.lock().unwrap().push(entry);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl CatalogEntriesRepo for InMemoryCatalogRepo {
    async fn insert(
        &self,
        mut model: catalog_entries::Model,
    ) -> Result<Option<catalog_entries::Model>, DbErr> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|row| row.meta_url == model.meta_url) {
            return Ok(None);
        }
        model.id = rows.iter().map(|row| row.id).max().unwrap_or(0) + 1;
        rows.push(model.clone());
        Ok(Some(model))
    }

    async fn update(
        &self,
        model: catalog_entries::Model,
    ) -> Result<Option<catalog_entries::Model>, DbErr> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|row| row.meta_url == model.meta_url && row.id != model.id)
        {
            return Ok(None);
        }
        let Some(row) = rows.iter_mut().find(|row| row.id == model.id) else {
            return Err(DbErr::RecordNotUpdated);
        };
        *row = model.clone();
        Ok(Some(model))
    }

    async fn delete(&self, id: i64) -> Result<bool, DbErr> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| row.id != id);
        Ok(rows.len() != before)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<catalog_entries::Model>, DbErr> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.id == id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<catalog_entries::Model>, DbErr> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    async fn meta_url_taken(&self, meta_url: &str, exclude_id: Option<i64>) -> Result<bool, DbErr> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|row| row.meta_url == meta_url && Some(row.id) != exclude_id))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SentMail {
    Registration { email: String, plaintext: String },
    NewPassword { email: String, plaintext: String },
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    fail_next: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn record(&self, mail: SentMail) -> Result<(), MailError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(MailError::Smtp("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

#[async_trait]
impl AccountMailer for RecordingMailer {
    async fn send_registration_mail(
        &self,
        account: &accounts::Model,
        plaintext: &str,
    ) -> Result<(), MailError> {
        self.record(SentMail::Registration {
            email: account.email.clone(),
            plaintext: plaintext.to_string(),
        })
    }

    async fn send_new_password_mail(
        &self,
        account: &accounts::Model,
        plaintext: &str,
    ) -> Result<(), MailError> {
        self.record(SentMail::NewPassword {
            email: account.email.clone(),
            plaintext: plaintext.to_string(),
        })
    }
}
