// src/api/friend.rs — /api/friends endpoints

use serde::de::IgnoredAny;
use serde_json::json;

use super::types::Friend;
use super::{or_default, segment, with_query, ApiGateway, Tile};
use crate::infra::errors::NekotaError;

pub struct FriendApi<'a> {
    gw: &'a ApiGateway,
}

impl<'a> FriendApi<'a> {
    pub(crate) fn new(gw: &'a ApiGateway) -> Self {
        Self { gw }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Friend>, NekotaError> {
        self.gw
            .get(&with_query("/api/friends", &[("user_id", user_id)]))
            .await
    }

    /// Dashboard tile: empty list when the fetch fails.
    pub async fn list_or_default(&self, user_id: &str) -> Tile<Vec<Friend>> {
        or_default("friends", self.list(user_id).await)
    }

    /// Send a friend request.
    pub async fn add(&self, user_id: &str, friend_id: &str) -> Result<Friend, NekotaError> {
        self.gw
            .post(
                "/api/friends",
                &json!({ "user_id": user_id, "friend_id": friend_id }),
            )
            .await
    }

    pub async fn accept(&self, request_id: &str) -> Result<Friend, NekotaError> {
        self.gw
            .put(
                &format!("/api/friends/{}/accept", segment(request_id)),
                &json!({}),
            )
            .await
    }

    pub async fn remove(&self, friend_id: &str) -> Result<(), NekotaError> {
        let _: IgnoredAny = self
            .gw
            .delete(&format!("/api/friends/{}", segment(friend_id)))
            .await?;
        Ok(())
    }
}
