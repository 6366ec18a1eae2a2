// src/api/auth.rs — /api/auth endpoints

use super::types::{CredentialsRequest, LoginResponse, VerifyResponse};
use super::ApiGateway;
use crate::infra::errors::NekotaError;
use crate::session::user::UserRecord;

pub struct AuthApi<'a> {
    gw: &'a ApiGateway,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(gw: &'a ApiGateway) -> Self {
        Self { gw }
    }

    /// POST /api/auth/login — credential login, returns `{token, user}`.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, NekotaError> {
        self.gw
            .post("/api/auth/login", &CredentialsRequest { email, password })
            .await
    }

    /// GET /api/auth/verify — validates the current token and returns its user.
    pub async fn verify(&self) -> Result<UserRecord, NekotaError> {
        let resp: VerifyResponse = self.gw.get("/api/auth/verify").await?;
        Ok(resp.into_user())
    }
}
