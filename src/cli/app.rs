// src/cli/app.rs — Wiring: config → storage → gateway → session, restored once

use std::path::Path;
use std::sync::Arc;

use crate::api::ApiGateway;
use crate::auth::AuthFlow;
use crate::infra::config::Config;
use crate::infra::errors::NekotaError;
use crate::routes::{self, Route, RouteDecision};
use crate::session::storage::{DurableStorage, FileStorage, MemoryStorage};
use crate::session::user::UserRecord;
use crate::session::SessionStore;

pub struct App {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub flow: AuthFlow,
}

impl App {
    /// Build all components and restore the stored session. Nothing is
    /// fetched until restore() has finished.
    pub async fn start(config: Config, ephemeral: bool) -> anyhow::Result<Self> {
        let storage: Arc<dyn DurableStorage> = if ephemeral {
            Arc::new(MemoryStorage::new())
        } else {
            let path = config.session.storage_path();
            tracing::debug!(path = %path.display(), "Using file storage");
            Arc::new(FileStorage::new(path))
        };
        Self::with_storage(config, storage).await
    }

    pub async fn with_storage(
        config: Config,
        storage: Arc<dyn DurableStorage>,
    ) -> anyhow::Result<Self> {
        let gateway = Arc::new(ApiGateway::from_config(&config.api)?);
        let session = SessionStore::new(storage, gateway, &config.session);
        session.restore().await;
        let flow = AuthFlow::new(session.clone());
        Ok(Self {
            config,
            session,
            flow,
        })
    }

    pub fn gateway(&self) -> &ApiGateway {
        self.session.gateway()
    }

    /// Gate a protected command the way a protected view is gated.
    pub fn require(&self, route: Route) -> Result<UserRecord, NekotaError> {
        match routes::guard(route, &self.session) {
            RouteDecision::Render => self.session.current_user().ok_or(NekotaError::NotLoggedIn),
            RouteDecision::RedirectToLogin | RouteDecision::Loading => Err(NekotaError::NotLoggedIn),
            RouteDecision::RedirectToHome => Err(NekotaError::Forbidden {
                detail: format!("{} requires the admin account", route.path()),
            }),
        }
    }
}

/// Load config from an explicit path or the default location, then apply
/// the CLI's URL override.
pub fn load_config(path: Option<&str>, api_url: Option<&str>) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(p) => {
            let mut c = Config::load_from(Path::new(p))?;
            c.apply_env_overrides();
            c
        }
        None => Config::load()?,
    };
    if let Some(url) = api_url {
        config.api.base_url = url.to_string();
    }
    Ok(config)
}
