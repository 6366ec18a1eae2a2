// src/api/alarm.rs — /api/alarms endpoints

use serde::de::IgnoredAny;

use super::types::{Alarm, AlarmDraft};
use super::{segment, with_query, ApiGateway};
use crate::infra::errors::NekotaError;

pub struct AlarmApi<'a> {
    gw: &'a ApiGateway,
}

impl<'a> AlarmApi<'a> {
    pub(crate) fn new(gw: &'a ApiGateway) -> Self {
        Self { gw }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Alarm>, NekotaError> {
        self.gw
            .get(&with_query("/api/alarms", &[("user_id", user_id)]))
            .await
    }

    pub async fn create(&self, draft: &AlarmDraft) -> Result<Alarm, NekotaError> {
        self.gw.post("/api/alarms", draft).await
    }

    pub async fn update(&self, alarm_id: &str, draft: &AlarmDraft) -> Result<Alarm, NekotaError> {
        self.gw
            .put(&format!("/api/alarms/{}", segment(alarm_id)), draft)
            .await
    }

    pub async fn delete(&self, alarm_id: &str) -> Result<(), NekotaError> {
        let _: IgnoredAny = self
            .gw
            .delete(&format!("/api/alarms/{}", segment(alarm_id)))
            .await?;
        Ok(())
    }
}
