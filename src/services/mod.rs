//! Business logic services

pub mod auth;
pub mod catalog;
pub mod renewals;
pub mod sessions;

use std::sync::Arc;

use crate::{
    config::AuthConfig,
    repository::{CatalogStore, UserStore},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub renewals: renewals::RenewalService,
    pub sessions: sessions::SessionService,
}

impl Services {
    /// Create all services over the given stores
    pub fn new(
        catalog_store: Arc<dyn CatalogStore>,
        user_store: Arc<dyn UserStore>,
        session_store: Arc<dyn sessions::SessionStore>,
        auth_config: AuthConfig,
    ) -> Self {
        Self {
            auth: auth::AuthService::new(user_store, auth_config),
            catalog: catalog::CatalogService::new(catalog_store.clone()),
            renewals: renewals::RenewalService::new(catalog_store),
            sessions: sessions::SessionService::new(session_store),
        }
    }
}
