use {anyhow::Result, async_trait::async_trait, serde::Serialize};

/// How a channel delivers outbound messages.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Every call is sent immediately, no internal queue.
    #[default]
    Direct,
}

/// Which chunking strategy the host should apply before calling `send_text`.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkerMode {
    /// Split on character boundaries only.
    Text,
    /// Split while keeping markdown constructs (code fences) balanced.
    #[default]
    Markdown,
}

/// A channel-agnostic send request.
///
/// `cfg` is opaque to the adapter and handed unchanged to the collaborators,
/// which resolve their own account settings from it.
#[derive(Debug, Clone, Copy)]
pub struct OutboundRequest<'a> {
    pub cfg: &'a serde_json::Value,
    /// Recipient (chat, user or open id, depending on the channel).
    pub to: &'a str,
    pub text: Option<&'a str>,
    /// Remote URL or local filesystem path.
    pub media_url: Option<&'a str>,
    pub account_id: Option<&'a str>,
}

impl<'a> OutboundRequest<'a> {
    pub fn new(cfg: &'a serde_json::Value, to: &'a str) -> Self {
        Self {
            cfg,
            to,
            text: None,
            media_url: None,
            account_id: None,
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: &'a str) -> Self {
        self.text = Some(text);
        self
    }

    #[must_use]
    pub fn with_media_url(mut self, media_url: &'a str) -> Self {
        self.media_url = Some(media_url);
        self
    }

    #[must_use]
    pub fn with_account_id(mut self, account_id: &'a str) -> Self {
        self.account_id = Some(account_id);
        self
    }
}

/// Collaborator result tagged with the channel that produced it.
///
/// Serializes flat: `{ "channel": "...", ...receipt }`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeliveryResult<R> {
    pub channel: &'static str,
    #[serde(flatten)]
    pub receipt: R,
}

impl<R> DeliveryResult<R> {
    pub fn new(channel: &'static str, receipt: R) -> Self {
        Self { channel, receipt }
    }
}

/// Splits long outbound text into sendable pieces.
pub trait TextChunker: Send + Sync {
    fn chunk(&self, text: &str, limit: usize) -> Vec<String>;
}

/// Markdown-aware chunker backed by [`crate::chunk::chunk_markdown_text`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownChunker;

impl TextChunker for MarkdownChunker {
    fn chunk(&self, text: &str, limit: usize) -> Vec<String> {
        crate::chunk::chunk_markdown_text(text, limit)
    }
}

/// Outbound contract a channel exposes to the hosting framework.
#[async_trait]
pub trait ChannelOutboundAdapter: Send + Sync {
    /// Whatever the channel's send primitives return for a delivered message.
    type Receipt: Serialize + Send;

    /// Channel identifier (e.g. "feishu").
    fn channel(&self) -> &'static str;

    fn delivery_mode(&self) -> DeliveryMode {
        DeliveryMode::Direct
    }

    fn chunker_mode(&self) -> ChunkerMode;

    /// Maximum characters per text message.
    fn text_chunk_limit(&self) -> usize;

    fn chunk(&self, text: &str, limit: usize) -> Vec<String>;

    async fn send_text(&self, req: OutboundRequest<'_>) -> Result<DeliveryResult<Self::Receipt>>;

    async fn send_media(&self, req: OutboundRequest<'_>) -> Result<DeliveryResult<Self::Receipt>>;
}
