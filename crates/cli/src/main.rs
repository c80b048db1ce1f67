use std::{
    io::Read,
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use {
    chanbridge_channels::{ChannelOutboundAdapter, OutboundRequest},
    chanbridge_feishu::{FeishuClient, FeishuOutbound, FeishuRuntime},
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "chanbridge", about = "chanbridge: Feishu outbound delivery")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (defaults to ./chanbridge.toml, then the user config dir).
    #[arg(long, global = true, env = "CHANBRIDGE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message, optionally with media.
    Send {
        /// Recipient: chat id (oc_), open id (ou_), union id (on_), email or user id.
        #[arg(long)]
        to: String,
        #[arg(short, long)]
        text: Option<String>,
        /// Media URL or local file path.
        #[arg(short, long)]
        media: Option<String>,
        /// Named account under `channels.feishu.accounts`.
        #[arg(long)]
        account: Option<String>,
        /// HTTP timeout for Feishu requests, in seconds.
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
    /// Print how stdin would be chunked before sending.
    Chunk {
        /// Characters per chunk (defaults to the channel's limit).
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn build_outbound(timeout_secs: u64) -> anyhow::Result<FeishuOutbound> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    let client = Arc::new(FeishuClient::with_http(http));
    Ok(FeishuOutbound::from_client(FeishuRuntime::default(), client))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    match &cli.command {
        Commands::Send {
            to,
            text,
            media,
            account,
            timeout_secs,
        } => {
            let cfg = chanbridge_config::load(cli.config.as_deref())?;
            let outbound = build_outbound(*timeout_secs)?;

            let mut req = OutboundRequest::new(&cfg, to);
            req.text = text.as_deref();
            req.media_url = media.as_deref();
            req.account_id = account.as_deref();

            let result = if req.media_url.is_some() {
                outbound.send_media(req).await?
            } else {
                outbound.send_text(req).await?
            };
            info!(channel = result.channel, message_id = %result.receipt.message_id, "delivered");
            println!("{}", serde_json::to_string_pretty(&result)?);
        },
        Commands::Chunk { limit } => {
            let outbound = build_outbound(30)?;
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;

            let limit = limit.unwrap_or_else(|| outbound.text_chunk_limit());
            let chunks = outbound.chunk(&input, limit);
            for (i, chunk) in chunks.iter().enumerate() {
                println!("--- chunk {} ({} chars) ---", i + 1, chunk.chars().count());
                println!("{chunk}");
            }
        },
    }

    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_parses_media_and_account() {
        let cli = Cli::try_parse_from([
            "chanbridge",
            "send",
            "--to",
            "oc_123",
            "--media",
            "/tmp/photo.png",
            "--account",
            "ops",
        ])
        .unwrap();
        match cli.command {
            Commands::Send {
                to,
                text,
                media,
                account,
                timeout_secs,
            } => {
                assert_eq!(to, "oc_123");
                assert!(text.is_none());
                assert_eq!(media.as_deref(), Some("/tmp/photo.png"));
                assert_eq!(account.as_deref(), Some("ops"));
                assert_eq!(timeout_secs, 30);
            },
            Commands::Chunk { .. } => panic!("expected send"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli =
            Cli::try_parse_from(["chanbridge", "chunk", "--limit", "10", "--json-logs"]).unwrap();
        assert!(cli.json_logs);
        assert_eq!(cli.log_level, "info");
        assert!(matches!(cli.command, Commands::Chunk { limit: Some(10) }));
    }

    #[test]
    fn send_requires_recipient() {
        assert!(Cli::try_parse_from(["chanbridge", "send", "--text", "hi"]).is_err());
    }
}
