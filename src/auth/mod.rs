// src/auth/mod.rs — Login flows tying the gateway to the session store
//
// Every login path clears the previous session before talking to the
// backend, so stale state from an earlier account can never leak into
// the new one, and checks that the token was issued for the returned
// user before anything is persisted.

use std::sync::Arc;

use crate::infra::errors::NekotaError;
use crate::session::claims::decode_claims;
use crate::session::user::UserRecord;
use crate::session::SessionStore;

pub struct AuthFlow {
    session: Arc<SessionStore>,
}

impl AuthFlow {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Device-number login via `POST /api/device/exists`.
    pub async fn login_with_device(&self, device_number: &str) -> Result<UserRecord, NekotaError> {
        self.session.logout().await;

        let resp = self
            .session
            .gateway()
            .device()
            .exists(device_number)
            .await?;
        let (true, Some(token), Some(user)) = (resp.exists, resp.token, resp.user) else {
            return Err(NekotaError::DeviceNotRegistered {
                device_number: device_number.to_string(),
            });
        };
        self.complete_login(token, user).await
    }

    /// Register a new device-bound account and log in as it.
    pub async fn register_device(
        &self,
        device_number: &str,
        name: Option<&str>,
    ) -> Result<UserRecord, NekotaError> {
        self.session.logout().await;

        let resp = self
            .session
            .gateway()
            .device()
            .register(device_number, name)
            .await?;
        self.complete_login(resp.token, resp.user).await
    }

    /// Email/password login via `POST /api/auth/login`.
    pub async fn login_with_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserRecord, NekotaError> {
        self.session.logout().await;

        let resp = self.session.gateway().auth().login(email, password).await?;
        self.complete_login(resp.token, resp.user).await
    }

    async fn complete_login(&self, token: String, user: UserRecord) -> Result<UserRecord, NekotaError> {
        check_token_matches_user(&token, &user)?;
        self.session.login(token, user.clone()).await?;
        Ok(user)
    }

    /// Ask the backend whether the stored token is still good and refresh
    /// the user snapshot from its answer. A 401 logs out via the gateway's
    /// interceptor before the error reaches the caller.
    pub async fn verify_session(&self) -> Result<UserRecord, NekotaError> {
        let session = self.session.current().ok_or(NekotaError::NotLoggedIn)?;
        let user = self.session.gateway().auth().verify().await?;
        check_token_matches_user(&session.token, &user)?;
        self.session.replace_user(user.clone()).await?;
        Ok(user)
    }

    /// Fetch the server's premium flag and reconcile the local snapshot.
    pub async fn refresh_premium_status(&self) -> Result<bool, NekotaError> {
        let user = self.session.current_user().ok_or(NekotaError::NotLoggedIn)?;
        let status = self
            .session
            .gateway()
            .user()
            .premium_status(&user.id)
            .await?;
        if status.user_id != user.id {
            tracing::warn!(
                expected = %user.id,
                got = %status.user_id,
                "Premium status returned for another user, ignoring"
            );
            return Err(NekotaError::TokenUserMismatch {
                token_subject: status.user_id,
                user_id: user.id,
            });
        }
        self.session.reconcile_premium(status.is_premium).await?;
        Ok(status.is_premium)
    }
}

/// Soft consistency check: the token's subject claim, when it has one,
/// must name the returned user. Opaque tokens pass.
pub fn check_token_matches_user(token: &str, user: &UserRecord) -> Result<(), NekotaError> {
    let subject = match decode_claims(token) {
        Ok(claims) => claims.subject(),
        Err(e) => {
            tracing::debug!("Token claims not readable, skipping consistency check: {e}");
            return Ok(());
        }
    };
    match subject {
        Some(subject) if subject != user.id => {
            tracing::warn!(token_subject = %subject, user_id = %user.id, "Token/user mismatch at login");
            Err(NekotaError::TokenUserMismatch {
                token_subject: subject,
                user_id: user.id.clone(),
            })
        }
        _ => Ok(()),
    }
}
