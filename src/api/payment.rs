// src/api/payment.rs — /api/payments endpoints

use super::types::{CheckoutRequest, CheckoutSession, Payment};
use super::{with_query, ApiGateway};
use crate::infra::errors::NekotaError;

pub struct PaymentApi<'a> {
    gw: &'a ApiGateway,
}

impl<'a> PaymentApi<'a> {
    pub(crate) fn new(gw: &'a ApiGateway) -> Self {
        Self { gw }
    }

    pub async fn history(&self, user_id: &str) -> Result<Vec<Payment>, NekotaError> {
        self.gw
            .get(&with_query("/api/payments", &[("user_id", user_id)]))
            .await
    }

    /// Start a checkout; the caller sends the user to `checkout_url`.
    pub async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, NekotaError> {
        self.gw.post("/api/payments/checkout", request).await
    }
}
