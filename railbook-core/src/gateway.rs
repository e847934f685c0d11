use async_trait::async_trait;

/// Terminal result of driving the external payment flow. User cancellation is
/// a distinguishable first-class outcome, never folded into failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    Paid,
    UserCancelled,
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gateway transport failure: {0}")]
    Transport(String),
}

/// A gateway-side order created by `prepare_order`, correlating the external
/// flow with our payment intent.
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub order_id: String,
    pub amount_krw: i64,
}

/// Abstract contract for the third-party payment flow.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register the charge amount and obtain an opaque order id.
    async fn prepare_order(&self, amount_krw: i64) -> Result<GatewayOrder, GatewayError>;

    /// Drive the external flow to completion. Never retried automatically;
    /// the caller must explicitly re-invoke after a failure.
    async fn execute_order(&self, order_id: &str) -> Result<GatewayOutcome, GatewayError>;
}
