//! Per-session state (visit counter) behind a pluggable store

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};

/// Everything kept for one browser session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub num_visits: u64,
}

impl SessionData {
    /// Home-page visits recorded before the current one
    pub fn visits(&self) -> u64 {
        self.num_visits
    }

    /// Session state after one more home-page visit
    pub fn with_visit_recorded(&self) -> Self {
        Self {
            num_visits: self.num_visits + 1,
            ..self.clone()
        }
    }
}

/// Storage for session state keyed by session id
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Session state, or the default for an unknown id
    async fn load(&self, session_id: &str) -> AppResult<SessionData>;
    async fn save(&self, session_id: &str, data: &SessionData) -> AppResult<()>;
}

/// Redis-backed sessions, one JSON value per key with a TTL
#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    pub async fn new(url: &str, ttl_seconds: u64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await?;

        Ok(Self { client, ttl_seconds })
    }

    fn key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, session_id: &str) -> AppResult<SessionData> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let stored: Option<String> = conn.get(Self::key(session_id)).await?;

        match stored {
            Some(raw) => serde_json::from_str(&raw).or_else(|e| {
                tracing::warn!("Discarding unreadable session {}: {}", session_id, e);
                Ok(SessionData::default())
            }),
            None => Ok(SessionData::default()),
        }
    }

    async fn save(&self, session_id: &str, data: &SessionData) -> AppResult<()> {
        let payload = serde_json::to_string(data)
            .map_err(|e| AppError::Internal(format!("Failed to encode session: {}", e)))?;

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(Self::key(session_id), payload, self.ttl_seconds)
            .await?;
        Ok(())
    }
}

/// In-process sessions; lost on restart, not shared between instances
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> AppResult<SessionData> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, session_id: &str, data: &SessionData) -> AppResult<()> {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), data.clone());
        Ok(())
    }
}

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Count a home-page visit; returns the count from before this visit
    pub async fn record_visit(&self, session_id: &str) -> AppResult<u64> {
        let session = self.store.load(session_id).await?;
        let seen = session.visits();
        self.store
            .save(session_id, &session.with_visit_recorded())
            .await?;
        Ok(seen)
    }
}
