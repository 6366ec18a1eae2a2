// src/api/admin.rs — /api/admin endpoints (admin user only)

use serde::de::IgnoredAny;

use super::types::AdminStats;
use super::{or_default, segment, ApiGateway, Tile};
use crate::infra::errors::NekotaError;
use crate::session::user::UserRecord;

pub struct AdminApi<'a> {
    gw: &'a ApiGateway,
}

impl<'a> AdminApi<'a> {
    pub(crate) fn new(gw: &'a ApiGateway) -> Self {
        Self { gw }
    }

    pub async fn stats(&self) -> Result<AdminStats, NekotaError> {
        self.gw.get("/api/admin/stats").await
    }

    /// Summary tile: zeroed stats when the fetch fails.
    pub async fn stats_or_default(&self) -> Tile<AdminStats> {
        or_default("admin stats", self.stats().await)
    }

    pub async fn users(&self) -> Result<Vec<UserRecord>, NekotaError> {
        self.gw.get("/api/admin/users").await
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<(), NekotaError> {
        let _: IgnoredAny = self
            .gw
            .delete(&format!("/api/admin/users/{}", segment(user_id)))
            .await?;
        Ok(())
    }
}
