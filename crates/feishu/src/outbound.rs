use std::sync::Arc;

use {
    anyhow::Result,
    async_trait::async_trait,
    tracing::{debug, info, warn},
};

use chanbridge_channels::{
    ChannelOutboundAdapter, ChunkerMode, DeliveryMode, DeliveryResult, OutboundRequest,
};

use crate::{
    client::FeishuClient,
    fs::{LocalFs, MediaFs},
    path::{self, MediaRef},
    runtime::FeishuRuntime,
    send::{
        MediaSender, MediaSource, MessageSender, SendMediaParams, SendMessageParams, SendReceipt,
    },
};

/// Channel identity stamped on every [`DeliveryResult`].
pub const CHANNEL_ID: &str = "feishu";

/// Maximum characters per outbound text message.
pub const TEXT_CHUNK_LIMIT: usize = 4000;

/// Outbound adapter for Feishu.
///
/// Holds no per-request state; concurrent sends are independent.
pub struct FeishuOutbound {
    runtime: FeishuRuntime,
    messages: Arc<dyn MessageSender>,
    media: Arc<dyn MediaSender>,
    fs: Arc<dyn MediaFs>,
}

impl FeishuOutbound {
    pub fn new(
        runtime: FeishuRuntime,
        messages: Arc<dyn MessageSender>,
        media: Arc<dyn MediaSender>,
    ) -> Self {
        Self {
            runtime,
            messages,
            media,
            fs: Arc::new(LocalFs),
        }
    }

    /// Adapter backed by one HTTP client for both text and media.
    pub fn from_client(runtime: FeishuRuntime, client: Arc<FeishuClient>) -> Self {
        Self::new(runtime, Arc::clone(&client) as Arc<dyn MessageSender>, client)
    }

    #[must_use]
    pub fn with_fs(mut self, fs: Arc<dyn MediaFs>) -> Self {
        self.fs = fs;
        self
    }

    async fn send_message(
        &self,
        req: &OutboundRequest<'_>,
        text: &str,
    ) -> crate::Result<SendReceipt> {
        self.messages
            .send_message(SendMessageParams {
                cfg: req.cfg,
                to: req.to,
                text,
                account_id: req.account_id,
            })
            .await
    }

    /// Read a local file when the reference names one that exists, otherwise
    /// hand the raw reference to the uploader as a URL.
    async fn upload(
        &self,
        req: &OutboundRequest<'_>,
        media_url: &str,
    ) -> crate::Result<SendReceipt> {
        let source = match MediaRef::classify(media_url) {
            MediaRef::LocalPath(local) if self.fs.exists(local) => {
                let file_name = path::file_name(media_url).to_string();
                let bytes = self.fs.read(local)?;
                debug!(
                    to = req.to,
                    file_name = %file_name,
                    bytes = bytes.len(),
                    "feishu media read from local file"
                );
                MediaSource::Buffer { bytes, file_name }
            },
            _ => {
                debug!(to = req.to, media_url, "feishu media sent by url");
                MediaSource::Url(media_url)
            },
        };

        self.media
            .send_media(SendMediaParams {
                cfg: req.cfg,
                to: req.to,
                source,
                account_id: req.account_id,
            })
            .await
    }
}

/// Text sent in place of media that could not be uploaded.
#[must_use]
pub fn fallback_text(media_url: &str) -> String {
    if path::is_local_path(Some(media_url)) {
        format!("📎 local file: {}", path::file_name(media_url))
    } else {
        format!("📎 {media_url}")
    }
}

#[async_trait]
impl ChannelOutboundAdapter for FeishuOutbound {
    type Receipt = SendReceipt;

    fn channel(&self) -> &'static str {
        CHANNEL_ID
    }

    fn delivery_mode(&self) -> DeliveryMode {
        DeliveryMode::Direct
    }

    fn chunker_mode(&self) -> ChunkerMode {
        ChunkerMode::Markdown
    }

    fn text_chunk_limit(&self) -> usize {
        TEXT_CHUNK_LIMIT
    }

    fn chunk(&self, text: &str, limit: usize) -> Vec<String> {
        self.runtime.chunker().chunk(text, limit)
    }

    async fn send_text(&self, req: OutboundRequest<'_>) -> Result<DeliveryResult<SendReceipt>> {
        let text = req.text.unwrap_or_default();
        info!(
            account_id = ?req.account_id,
            to = req.to,
            text_len = text.len(),
            "feishu outbound text send start"
        );

        let receipt = self.send_message(&req, text).await?;

        info!(
            account_id = ?req.account_id,
            to = req.to,
            message_id = %receipt.message_id,
            "feishu outbound text sent"
        );
        Ok(DeliveryResult::new(CHANNEL_ID, receipt))
    }

    async fn send_media(&self, req: OutboundRequest<'_>) -> Result<DeliveryResult<SendReceipt>> {
        info!(
            account_id = ?req.account_id,
            to = req.to,
            has_text = req.text.is_some(),
            media_url = ?req.media_url,
            "feishu outbound media send start"
        );

        if let Some(text) = req.text.filter(|t| !t.trim().is_empty()) {
            // Only the media outcome is reported to the caller.
            let _preamble: SendReceipt = self.send_message(&req, text).await?;
        }

        let Some(media_url) = req.media_url.filter(|url| !url.is_empty()) else {
            // Repeats the preamble when one was sent.
            let receipt = self.send_message(&req, req.text.unwrap_or_default()).await?;
            return Ok(DeliveryResult::new(CHANNEL_ID, receipt));
        };

        let receipt = match self.upload(&req, media_url).await {
            Ok(receipt) => {
                info!(
                    account_id = ?req.account_id,
                    to = req.to,
                    media_url,
                    message_id = %receipt.message_id,
                    "feishu outbound media sent"
                );
                receipt
            },
            Err(e) => {
                warn!(
                    account_id = ?req.account_id,
                    to = req.to,
                    media_url,
                    error = %e,
                    "feishu media send failed, falling back to text"
                );
                self.send_message(&req, &fallback_text(media_url)).await?
            },
        };

        Ok(DeliveryResult::new(CHANNEL_ID, receipt))
    }
}
