use serde_json::json;

use crate::adapters::notifier::{NotifyError, Notifier};

pub const LINE_PUSH_ENDPOINT: &str = "https://api.line.me/v2/bot/message/push";

/// Pushes text messages through the LINE Messaging API.
pub struct LineNotifier {
    http_client: reqwest::Client,
    endpoint: String,
    channel_access_token: String,
    to: String,
}

impl LineNotifier {
    pub fn new(channel_access_token: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            endpoint: LINE_PUSH_ENDPOINT.to_string(),
            channel_access_token: channel_access_token.into(),
            to: to.into(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

pub fn push_message_body(to: &str, message: &str) -> serde_json::Value {
    json!({
        "to": to,
        "messages": [{"type": "text", "text": message}],
    })
}

impl Notifier for LineNotifier {
    fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let client = self.http_client.clone();
        let endpoint = self.endpoint.clone();
        let token = self.channel_access_token.clone();
        let body = push_message_body(&self.to, message);

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let response = client
                    .post(endpoint)
                    .bearer_auth(token)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|error| {
                        NotifyError::Transport(format!("failed to call LINE push API: {error}"))
                    })?;

                let status = response.status();
                if status.is_success() {
                    return Ok(());
                }
                let body = response.text().await.unwrap_or_default();
                Err(NotifyError::Rejected {
                    status: status.as_u16(),
                    body,
                })
            })
        })
    }
}
