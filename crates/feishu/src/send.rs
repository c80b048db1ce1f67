//! Collaborator interfaces the outbound adapter sends through.

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
};

use crate::Result;

/// What Feishu returns for a delivered message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub message_id: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Copy)]
pub struct SendMessageParams<'a> {
    pub cfg: &'a serde_json::Value,
    pub to: &'a str,
    pub text: &'a str,
    pub account_id: Option<&'a str>,
}

/// Where the bytes of a media message come from.
pub enum MediaSource<'a> {
    /// File contents already in memory, with the name to upload them under.
    Buffer { bytes: Vec<u8>, file_name: String },
    /// A remote resource the sender fetches itself.
    Url(&'a str),
}

impl std::fmt::Debug for MediaSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buffer { bytes, file_name } => f
                .debug_struct("Buffer")
                .field("len", &bytes.len())
                .field("file_name", file_name)
                .finish(),
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
        }
    }
}

#[derive(Debug)]
pub struct SendMediaParams<'a> {
    pub cfg: &'a serde_json::Value,
    pub to: &'a str,
    pub source: MediaSource<'a>,
    pub account_id: Option<&'a str>,
}

/// Sends a plain text message.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, params: SendMessageParams<'_>) -> Result<SendReceipt>;
}

/// Uploads media and sends it as a message.
#[async_trait]
pub trait MediaSender: Send + Sync {
    async fn send_media(&self, params: SendMediaParams<'_>) -> Result<SendReceipt>;
}
