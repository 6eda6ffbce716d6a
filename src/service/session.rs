use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::service::principal::SessionPrincipal;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionData {
    pub principal: SessionPrincipal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[async_trait]
pub trait SessionService: Send + Sync {
    async fn create(&self, principal: SessionPrincipal) -> Result<String, SessionError>;
    async fn get(&self, session_id: &str) -> Result<Option<SessionData>, SessionError>;
    async fn delete(&self, session_id: &str) -> Result<(), SessionError>;
}

fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub struct RedisSessionService {
    conn: Arc<Mutex<MultiplexedConnection>>,
    ttl_seconds: u64,
    key_prefix: String,
}

impl RedisSessionService {
    pub async fn new(
        redis_url: &str,
        ttl_seconds: u64,
        key_prefix: String,
    ) -> Result<Self, SessionError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            ttl_seconds,
            key_prefix,
        })
    }

    fn key(&self, session_id: &str) -> String {
        format!("{}:session:{}", self.key_prefix, session_id)
    }
}

#[async_trait]
impl SessionService for RedisSessionService {
    async fn create(&self, principal: SessionPrincipal) -> Result<String, SessionError> {
        let session_id = new_session_id();
        let payload = SessionData {
            principal,
            created_at: Utc::now(),
        };
        let value = serde_json::to_string(&payload)?;

        let mut conn = self.conn.lock().await;
        conn.set_ex::<_, _, ()>(self.key(&session_id), value, self.ttl_seconds)
            .await?;
        Ok(session_id)
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionData>, SessionError> {
        let mut conn = self.conn.lock().await;
        let value: Option<String> = conn.get(self.key(session_id)).await?;
        let Some(value) = value else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&value)?))
    }

    async fn delete(&self, session_id: &str) -> Result<(), SessionError> {
        let mut conn = self.conn.lock().await;
        let _: () = conn.del(self.key(session_id)).await?;
        Ok(())
    }
}

const MAX_MEMORY_TTL_SECONDS: i64 = 60 * 60 * 24 * 365;

/// Process-local sessions for single-instance and development setups.
pub struct MemorySessionService {
    sessions: Mutex<HashMap<String, SessionData>>,
    ttl: Duration,
}

impl MemorySessionService {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: Duration::seconds(
                i64::try_from(ttl_seconds)
                    .unwrap_or(MAX_MEMORY_TTL_SECONDS)
                    .min(MAX_MEMORY_TTL_SECONDS),
            ),
        }
    }
}

#[async_trait]
impl SessionService for MemorySessionService {
    async fn create(&self, principal: SessionPrincipal) -> Result<String, SessionError> {
        let session_id = new_session_id();
        let mut sessions = self.sessions.lock().await;
        let now = Utc::now();
        sessions.retain(|_, data| data.created_at + self.ttl > now);
        sessions.insert(
            session_id.clone(),
            SessionData {
                principal,
                created_at: now,
            },
        );
        Ok(session_id)
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionData>, SessionError> {
        let sessions = self.sessions.lock().await;
        Ok(sessions
            .get(session_id)
            .filter(|data| data.created_at + self.ttl > Utc::now())
            .cloned())
    }

    async fn delete(&self, session_id: &str) -> Result<(), SessionError> {
        self.sessions.lock().await.remove(session_id);
        Ok(())
    }
}
