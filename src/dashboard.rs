// src/dashboard.rs — Dashboard summary: independent sub-fetches, partial results allowed

use serde::Serialize;

use crate::api::types::{Friend, Memory, VoiceModel};
use crate::api::ApiGateway;
use crate::session::user::UserRecord;

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSummary {
    pub profile: Option<UserRecord>,
    pub memories: Vec<Memory>,
    pub friends: Vec<Friend>,
    pub voice_model: VoiceModel,
    /// Names of the sub-fetches that failed and were defaulted.
    pub failed: Vec<&'static str>,
}

impl DashboardSummary {
    pub fn memory_count(&self) -> usize {
        self.memories.len()
    }

    pub fn friend_count(&self) -> usize {
        self.friends.len()
    }

    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Run all sub-fetches concurrently. Each failure is replaced by its
/// default on its own, so one bad endpoint never blanks the dashboard.
pub async fn load_summary(gateway: &ApiGateway, user_id: &str) -> DashboardSummary {
    let (user_api, memory_api, friend_api, voice_api) = (
        gateway.user(),
        gateway.memory(),
        gateway.friend(),
        gateway.voice(),
    );
    let (profile, memories, friends, voice_model) = tokio::join!(
        user_api.get_or_default(user_id),
        memory_api.list_or_default(user_id),
        friend_api.list_or_default(user_id),
        voice_api.model_or_default(user_id),
    );

    let failed = [
        ("profile", profile.failed),
        ("memories", memories.failed),
        ("friends", friends.failed),
        ("voice_model", voice_model.failed),
    ]
    .into_iter()
    .filter_map(|(name, failed)| failed.then_some(name))
    .collect();

    DashboardSummary {
        profile: profile.value,
        memories: memories.value,
        friends: friends.value,
        voice_model: voice_model.value,
        failed,
    }
}
