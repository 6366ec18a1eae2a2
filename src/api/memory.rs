// src/api/memory.rs — /api/memories endpoints

use serde::de::IgnoredAny;

use super::types::{Memory, MemoryDraft};
use super::{or_default, segment, with_query, ApiGateway, Tile};
use crate::infra::errors::NekotaError;

pub struct MemoryApi<'a> {
    gw: &'a ApiGateway,
}

impl<'a> MemoryApi<'a> {
    pub(crate) fn new(gw: &'a ApiGateway) -> Self {
        Self { gw }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Memory>, NekotaError> {
        self.gw
            .get(&with_query("/api/memories", &[("user_id", user_id)]))
            .await
    }

    /// Dashboard tile: empty list when the fetch fails.
    pub async fn list_or_default(&self, user_id: &str) -> Tile<Vec<Memory>> {
        or_default("memories", self.list(user_id).await)
    }

    pub async fn create(&self, draft: &MemoryDraft) -> Result<Memory, NekotaError> {
        self.gw.post("/api/memories", draft).await
    }

    pub async fn update(&self, memory_id: &str, draft: &MemoryDraft) -> Result<Memory, NekotaError> {
        self.gw
            .put(&format!("/api/memories/{}", segment(memory_id)), draft)
            .await
    }

    pub async fn delete(&self, memory_id: &str) -> Result<(), NekotaError> {
        let _: IgnoredAny = self
            .gw
            .delete(&format!("/api/memories/{}", segment(memory_id)))
            .await?;
        Ok(())
    }
}
