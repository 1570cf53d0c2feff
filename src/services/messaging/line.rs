use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::{MessagingProvider, OutboundMessage};

const API_BASE: &str = "https://api.line.me/v2/bot";

pub struct LineMessagingProvider {
    access_token: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    display_name: String,
}

impl LineMessagingProvider {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MessagingProvider for LineMessagingProvider {
    async fn reply(&self, reply_token: &str, messages: &[OutboundMessage]) -> anyhow::Result<()> {
        self.client
            .post(format!("{API_BASE}/message/reply"))
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({
                "replyToken": reply_token,
                "messages": messages,
            }))
            .send()
            .await
            .context("failed to send LINE reply")?
            .error_for_status()
            .context("LINE reply API returned error")?;

        Ok(())
    }

    async fn display_name(&self, user_id: &str) -> anyhow::Result<String> {
        let profile: Profile = self
            .client
            .get(format!("{API_BASE}/profile/{user_id}"))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .context("failed to fetch LINE profile")?
            .error_for_status()
            .context("LINE profile API returned error")?
            .json()
            .await
            .context("failed to decode LINE profile")?;

        Ok(profile.display_name)
    }
}
