//! LINE Senders
//!
//! Outbound calls to the LINE Messaging API: text replies and the monthly
//! message quota.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Outbound HTTP timeout for every LINE API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum LineApiError {
    #[error("LINE API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LINE API returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Monthly outbound message allowance and how much of it is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageQuota {
    /// `None` when the plan has no monthly cap.
    pub limit: Option<i64>,
    pub total_usage: i64,
}

impl MessageQuota {
    pub fn remaining(&self) -> Option<i64> {
        self.limit.map(|limit| (limit - self.total_usage).max(0))
    }
}

/// The subset of the Messaging API the dispatcher needs.
#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// Answer the event identified by `reply_token` with one text message.
    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), LineApiError>;

    /// Current monthly quota and consumption.
    async fn message_quota(&self) -> Result<MessageQuota, LineApiError>;
}

#[derive(Serialize)]
struct ReplyRequest<'a> {
    #[serde(rename = "replyToken")]
    reply_token: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Deserialize)]
struct QuotaResponse {
    #[serde(rename = "type")]
    kind: String,
    value: Option<i64>,
}

#[derive(Deserialize)]
struct ConsumptionResponse {
    #[serde(rename = "totalUsage")]
    total_usage: i64,
}

/// reqwest-backed Messaging API client.
#[derive(Clone)]
pub struct LineClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl LineClient {
    pub fn new(access_token: impl Into<String>, base_url: impl Into<String>) -> Result<Self, LineApiError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, LineApiError> {
        let res = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let res = check_status(res).await?;
        Ok(res.json::<T>().await?)
    }
}

async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, LineApiError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(LineApiError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl MessagingApi for LineClient {
    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), LineApiError> {
        let body = ReplyRequest {
            reply_token,
            messages: [TextMessage { kind: "text", text }],
        };
        let res = self
            .http
            .post(self.url("/v2/bot/message/reply"))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        check_status(res).await?;
        info!(chars = text.chars().count(), "[LINE] Reply sent");
        Ok(())
    }

    async fn message_quota(&self) -> Result<MessageQuota, LineApiError> {
        let (quota, consumption) = tokio::try_join!(
            self.get_json::<QuotaResponse>("/v2/bot/message/quota"),
            self.get_json::<ConsumptionResponse>("/v2/bot/message/quota/consumption"),
        )?;
        let limit = match quota.kind.as_str() {
            "limited" => quota.value,
            _ => None,
        };
        debug!(?limit, total_usage = consumption.total_usage, "[LINE] Quota fetched");
        Ok(MessageQuota {
            limit,
            total_usage: consumption.total_usage,
        })
    }
}
