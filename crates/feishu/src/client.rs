use std::path::Path;

use {
    async_trait::async_trait,
    reqwest::multipart::{Form, Part},
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, de::DeserializeOwned},
    tracing::{debug, info},
};

use crate::{
    auth::{TokenCache, get_tenant_access_token},
    config::{FeishuAccountConfig, resolve_account},
    error::{Error, Result},
    send::{
        MediaSender, MediaSource, MessageSender, SendMediaParams, SendMessageParams, SendReceipt,
    },
};

/// HTTP implementation of the Feishu text and media collaborators.
#[derive(Default)]
pub struct FeishuClient {
    http: reqwest::Client,
    tokens: TokenCache,
}

/// Recipient id and the `receive_id_type` Feishu expects for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveTarget<'a> {
    pub id: &'a str,
    pub id_type: &'static str,
}

impl<'a> ReceiveTarget<'a> {
    /// Infer the id type from Feishu's id prefixes, after dropping an
    /// optional `feishu:` / `lark:` namespace.
    #[must_use]
    pub fn parse(to: &'a str) -> Self {
        let id = to
            .strip_prefix("feishu:")
            .or_else(|| to.strip_prefix("lark:"))
            .unwrap_or(to)
            .trim();
        let id_type = if id.starts_with("oc_") {
            "chat_id"
        } else if id.starts_with("ou_") {
            "open_id"
        } else if id.starts_with("on_") {
            "union_id"
        } else if id.contains('@') {
            "email"
        } else {
            "user_id"
        };
        Self { id, id_type }
    }
}

/// How a file is uploaded and which message type carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadKind {
    Image,
    File { file_type: &'static str },
}

impl UploadKind {
    fn for_file_name(file_name: &str) -> Self {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "ico" | "tiff" | "heic" => {
                Self::Image
            },
            "opus" => Self::File { file_type: "opus" },
            "mp4" => Self::File { file_type: "mp4" },
            "pdf" => Self::File { file_type: "pdf" },
            "doc" | "docx" => Self::File { file_type: "doc" },
            "xls" | "xlsx" => Self::File { file_type: "xls" },
            "ppt" | "pptx" => Self::File { file_type: "ppt" },
            _ => Self::File {
                file_type: "stream",
            },
        }
    }
}

/// `{ code, msg, data }` wrapper around every Open Platform response.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct MessageData {
    message_id: String,
    #[serde(default)]
    chat_id: String,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    image_key: String,
}

#[derive(Debug, Deserialize)]
struct FileData {
    file_key: String,
}

impl FeishuClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http(http: reqwest::Client) -> Self {
        Self {
            http,
            tokens: TokenCache::default(),
        }
    }

    async fn token(&self, config: &FeishuAccountConfig) -> Result<Secret<String>> {
        get_tenant_access_token(&self.http, config, &self.tokens).await
    }

    async fn post_message(
        &self,
        config: &FeishuAccountConfig,
        token: &Secret<String>,
        to: &str,
        msg_type: &str,
        content: serde_json::Value,
    ) -> Result<SendReceipt> {
        let target = ReceiveTarget::parse(to);
        let url = format!(
            "{}/open-apis/im/v1/messages?receive_id_type={}",
            config.api_base(),
            target.id_type
        );
        let body = serde_json::json!({
            "receive_id": target.id,
            "msg_type": msg_type,
            "content": content.to_string(),
        });

        let resp = self
            .http
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await?;
        let data: MessageData = read_envelope(resp, "send message").await?;

        let chat_id = if data.chat_id.is_empty() {
            target.id.to_string()
        } else {
            data.chat_id
        };
        Ok(SendReceipt {
            message_id: data.message_id,
            chat_id,
        })
    }

    async fn upload_image(
        &self,
        config: &FeishuAccountConfig,
        token: &Secret<String>,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<String> {
        let form = Form::new()
            .text("image_type", "message")
            .part("image", Part::bytes(bytes).file_name(file_name.to_string()));
        let resp = self
            .http
            .post(format!("{}/open-apis/im/v1/images", config.api_base()))
            .bearer_auth(token.expose_secret())
            .multipart(form)
            .send()
            .await?;
        let data: ImageData = read_envelope(resp, "upload image").await?;
        Ok(data.image_key)
    }

    async fn upload_file(
        &self,
        config: &FeishuAccountConfig,
        token: &Secret<String>,
        bytes: Vec<u8>,
        file_name: &str,
        file_type: &'static str,
    ) -> Result<String> {
        let form = Form::new()
            .text("file_type", file_type)
            .text("file_name", file_name.to_string())
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        let resp = self
            .http
            .post(format!("{}/open-apis/im/v1/files", config.api_base()))
            .bearer_auth(token.expose_secret())
            .multipart(form)
            .send()
            .await?;
        let data: FileData = read_envelope(resp, "upload file").await?;
        Ok(data.file_key)
    }

    /// Fetch a remote resource; the file name is the URL's last path segment.
    async fn download(&self, media_url: &str) -> Result<(Vec<u8>, String)> {
        let parsed = url::Url::parse(media_url)
            .map_err(|e| Error::external(format!("invalid media url {media_url}"), e))?;
        let file_name = parsed
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                urlencoding::decode(segment)
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or_else(|_| segment.to_string())
            })
            .unwrap_or_else(|| "file".to_string());

        let resp = self.http.get(parsed).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            return Err(Error::message(format!(
                "feishu media download failed ({status}): {media_url}"
            )));
        }
        let bytes = resp.bytes().await?.to_vec();
        debug!(media_url, file_name = %file_name, bytes = bytes.len(), "feishu media downloaded");
        Ok((bytes, file_name))
    }
}

async fn read_envelope<T: DeserializeOwned>(
    resp: reqwest::Response,
    operation: &str,
) -> Result<T> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        // Feishu usually explains non-2xx answers in the same envelope.
        if let Ok(envelope) = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
            && envelope.code != 0
        {
            return Err(Error::Api {
                code: envelope.code,
                msg: envelope.msg,
            });
        }
        return Err(Error::message(format!(
            "feishu {operation} failed ({status}): {body}"
        )));
    }

    let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
    if envelope.code != 0 {
        return Err(Error::Api {
            code: envelope.code,
            msg: envelope.msg,
        });
    }
    envelope
        .data
        .ok_or_else(|| Error::message(format!("feishu {operation} response missing data")))
}

#[async_trait]
impl MessageSender for FeishuClient {
    async fn send_message(&self, params: SendMessageParams<'_>) -> Result<SendReceipt> {
        let config = resolve_account(params.cfg, params.account_id)?;
        let token = self.token(&config).await?;
        let receipt = self
            .post_message(
                &config,
                &token,
                params.to,
                "text",
                serde_json::json!({ "text": params.text }),
            )
            .await?;
        info!(
            app_id = %config.app_id,
            to = params.to,
            message_id = %receipt.message_id,
            "feishu text message sent"
        );
        Ok(receipt)
    }
}

#[async_trait]
impl MediaSender for FeishuClient {
    async fn send_media(&self, params: SendMediaParams<'_>) -> Result<SendReceipt> {
        let config = resolve_account(params.cfg, params.account_id)?;
        let (bytes, file_name) = match params.source {
            MediaSource::Buffer { bytes, file_name } => (bytes, file_name),
            MediaSource::Url(media_url) => self.download(media_url).await?,
        };
        let token = self.token(&config).await?;

        let kind = UploadKind::for_file_name(&file_name);
        let receipt = match kind {
            UploadKind::Image => {
                let image_key = self
                    .upload_image(&config, &token, bytes, &file_name)
                    .await?;
                self.post_message(
                    &config,
                    &token,
                    params.to,
                    "image",
                    serde_json::json!({ "image_key": image_key }),
                )
                .await?
            },
            UploadKind::File { file_type } => {
                let file_key = self
                    .upload_file(&config, &token, bytes, &file_name, file_type)
                    .await?;
                self.post_message(
                    &config,
                    &token,
                    params.to,
                    "file",
                    serde_json::json!({ "file_key": file_key }),
                )
                .await?
            },
        };
        info!(
            app_id = %config.app_id,
            to = params.to,
            file_name = %file_name,
            kind = ?kind,
            message_id = %receipt.message_id,
            "feishu media message sent"
        );
        Ok(receipt)
    }
}
