use async_trait::async_trait;

pub mod line;
pub mod line_receive;
pub mod line_send;

pub use line::{DispatcherState, LineAdapter, LineConfig};
pub use line_receive::{SignatureError, WebhookBatch, WebhookEvent, verify_signature};
pub use line_send::{LineApiError, LineClient, MessageQuota, MessagingApi};

/// All channel adapters implement this trait.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Build an Axum sub-router for inbound webhook endpoints.
    /// Adapters that use polling/long-connections return an empty router.
    fn build_router(&self) -> axum::Router {
        axum::Router::new()
    }

    /// Run one-off startup work (credential probes, connection setup).
    async fn start(&self) -> anyhow::Result<()>;
}
