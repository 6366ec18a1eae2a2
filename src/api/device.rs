// src/api/device.rs — /api/device endpoints

use super::types::{DeviceExistsResponse, DeviceRequest, LoginResponse};
use super::ApiGateway;
use crate::infra::errors::NekotaError;

pub struct DeviceApi<'a> {
    gw: &'a ApiGateway,
}

impl<'a> DeviceApi<'a> {
    pub(crate) fn new(gw: &'a ApiGateway) -> Self {
        Self { gw }
    }

    /// POST /api/device/exists — device-number login.
    pub async fn exists(&self, device_number: &str) -> Result<DeviceExistsResponse, NekotaError> {
        self.gw
            .post(
                "/api/device/exists",
                &DeviceRequest {
                    device_number,
                    name: None,
                },
            )
            .await
    }

    /// POST /api/device/register — create an account bound to this device.
    pub async fn register(
        &self,
        device_number: &str,
        name: Option<&str>,
    ) -> Result<LoginResponse, NekotaError> {
        self.gw
            .post(
                "/api/device/register",
                &DeviceRequest {
                    device_number,
                    name,
                },
            )
            .await
    }
}
