pub mod line;

use async_trait::async_trait;
use serde::Serialize;

/// A message body as the messaging platform accepts it.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    Text {
        text: String,
    },
    Flex {
        #[serde(rename = "altText")]
        alt_text: String,
        contents: serde_json::Value,
    },
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutboundMessage::Text { text: text.into() }
    }
}

#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn reply(&self, reply_token: &str, messages: &[OutboundMessage]) -> anyhow::Result<()>;

    async fn display_name(&self, user_id: &str) -> anyhow::Result<String>;
}
