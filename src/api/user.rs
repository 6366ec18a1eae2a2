// src/api/user.rs — /api/users endpoints

use super::types::{PremiumStatus, UserUpdate};
use super::{or_default, segment, ApiGateway, Tile};
use crate::infra::errors::NekotaError;
use crate::session::user::UserRecord;

pub struct UserApi<'a> {
    gw: &'a ApiGateway,
}

impl<'a> UserApi<'a> {
    pub(crate) fn new(gw: &'a ApiGateway) -> Self {
        Self { gw }
    }

    pub async fn get(&self, user_id: &str) -> Result<UserRecord, NekotaError> {
        self.gw.get(&format!("/api/users/{}", segment(user_id))).await
    }

    /// Dashboard tile: `None` when the profile cannot be fetched.
    pub async fn get_or_default(&self, user_id: &str) -> Tile<Option<UserRecord>> {
        or_default("profile", self.get(user_id).await.map(Some))
    }

    pub async fn update(&self, user_id: &str, update: &UserUpdate) -> Result<UserRecord, NekotaError> {
        self.gw
            .put(&format!("/api/users/{}", segment(user_id)), update)
            .await
    }

    /// GET /api/users/{id}/premium-status
    pub async fn premium_status(&self, user_id: &str) -> Result<PremiumStatus, NekotaError> {
        self.gw
            .get(&format!("/api/users/{}/premium-status", segment(user_id)))
            .await
    }
}
