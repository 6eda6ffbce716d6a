use sea_orm::{DatabaseConnection, DbErr};
use std::sync::Arc;

use crate::{
    repo::{accounts::SeaOrmAccountsRepo, catalog_entries::SeaOrmCatalogEntriesRepo},
    service::{
        accounts::{AccountManager, AccountManagerImpl},
        catalog::{CatalogAdmin, CatalogAdminImpl},
        config::{ConfigService, ConfigServiceImpl},
        email::ConfiguredMailer,
        encoder::EncoderFactory,
        password::RandomPasswordGenerator,
        session::{MemorySessionService, RedisSessionService, SessionError, SessionService},
        slug::CatalogSlugNormalizer,
    },
};

pub trait DatabaseClient: Send + Sync {
    fn conn(&self) -> &DatabaseConnection;
}

pub struct SeaOrmDatabaseClient {
    conn: DatabaseConnection,
}

impl SeaOrmDatabaseClient {
    pub async fn new() -> Result<Self, DbErr> {
        let conn = crate::db::connect().await?;
        crate::schema::apply(&conn).await?;
        Ok(Self { conn })
    }
}

impl DatabaseClient for SeaOrmDatabaseClient {
    fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("database: {0}")]
    Db(#[from] DbErr),
    #[error("session store: {0}")]
    Session(#[from] SessionError),
}

pub struct AppState {
    accounts: Arc<dyn AccountManager>,
    catalog: Arc<dyn CatalogAdmin>,
    sessions: Arc<dyn SessionService>,
    config: Arc<dyn ConfigService>,
}

impl AppState {
    pub async fn new() -> Result<Arc<Self>, StartupError> {
        let config = Arc::new(ConfigServiceImpl::new());
        let values = Arc::new(config.values().clone());

        let db: Arc<dyn DatabaseClient> = Arc::new(SeaOrmDatabaseClient::new().await?);
        let accounts_repo = Arc::new(SeaOrmAccountsRepo::new(db.clone()));
        let catalog_repo = Arc::new(SeaOrmCatalogEntriesRepo::new(db.clone()));

        let accounts = Arc::new(AccountManagerImpl::new(
            accounts_repo,
            Arc::new(EncoderFactory::default()),
            Arc::new(ConfiguredMailer::new(values.clone())),
            Arc::new(RandomPasswordGenerator::new(values.generated_password_length)),
        ));
        let catalog = Arc::new(CatalogAdminImpl::new(
            catalog_repo.clone(),
            Arc::new(CatalogSlugNormalizer::new(catalog_repo)),
        ));

        let sessions: Arc<dyn SessionService> = match values.redis_url.as_deref() {
            Some(url) => Arc::new(
                RedisSessionService::new(
                    url,
                    values.session_ttl_seconds,
                    values.session_key_prefix.clone(),
                )
                .await?,
            ),
            None => {
                tracing::warn!("REDIS_URL not set; sessions are kept in process memory");
                Arc::new(MemorySessionService::new(values.session_ttl_seconds))
            }
        };

        Ok(Arc::new(Self {
            accounts,
            catalog,
            sessions,
            config,
        }))
    }

    pub fn accounts(&self) -> &dyn AccountManager {
        self.accounts.as_ref()
    }

    pub fn catalog(&self) -> &dyn CatalogAdmin {
        self.catalog.as_ref()
    }

    pub fn sessions(&self) -> &dyn SessionService {
        self.sessions.as_ref()
    }

    pub fn config(&self) -> &dyn ConfigService {
        self.config.as_ref()
    }
}
