// src/api/voice.rs — /api/voices endpoints

use serde::de::IgnoredAny;

use super::types::{UploadFile, VoiceMessage, VoiceModel};
use super::{or_default, segment, with_query, ApiGateway, Tile};
use crate::infra::errors::NekotaError;

pub struct VoiceApi<'a> {
    gw: &'a ApiGateway,
}

impl<'a> VoiceApi<'a> {
    pub(crate) fn new(gw: &'a ApiGateway) -> Self {
        Self { gw }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<VoiceMessage>, NekotaError> {
        self.gw
            .get(&with_query("/api/voices", &[("user_id", user_id)]))
            .await
    }

    /// Multipart upload of a recorded message.
    pub async fn upload(
        &self,
        sender_id: &str,
        receiver_id: &str,
        file: UploadFile,
    ) -> Result<VoiceMessage, NekotaError> {
        self.gw
            .upload_file(
                "/api/voices/upload",
                file,
                &[
                    ("sender_id", sender_id.to_string()),
                    ("receiver_id", receiver_id.to_string()),
                ],
            )
            .await
    }

    pub async fn delete(&self, voice_id: &str) -> Result<(), NekotaError> {
        let _: IgnoredAny = self
            .gw
            .delete(&format!("/api/voices/{}", segment(voice_id)))
            .await?;
        Ok(())
    }

    /// The voice model assigned to a user.
    pub async fn model(&self, user_id: &str) -> Result<VoiceModel, NekotaError> {
        self.gw
            .get(&format!("/api/voices/model/{}", segment(user_id)))
            .await
    }

    /// Dashboard tile: empty model when the fetch fails.
    pub async fn model_or_default(&self, user_id: &str) -> Tile<VoiceModel> {
        or_default("voice model", self.model(user_id).await)
    }
}
