//! `boomgate chat` -- send one message through the gateway.
//!
//! Without `--stream` the reply is printed as a single JSON object
//! (`{response, provider, model, elapsed, cached}`). With `--stream` each
//! event is printed as one JSON line as it arrives; Ctrl-C cancels the
//! session.
//!
//! # Examples
//!
//! ```text
//! boomgate chat -m "What is Rust?"
//! boomgate chat -m "Write a poem" --stream
//! boomgate chat -m "hi" --provider Phind --max-retries 1
//! ```

use boomgate_llm::{ChatReply, Gateway, InboundRequest};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Arguments for the `chat` subcommand.
#[derive(Args)]
pub struct ChatArgs {
    /// Message to send.
    #[arg(short, long)]
    pub message: String,

    /// Try this provider first.
    #[arg(long)]
    pub provider: Option<String>,

    /// Request this model from every candidate.
    #[arg(long)]
    pub model: Option<String>,

    /// Retry rounds across the candidate list.
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Per-attempt timeout in milliseconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Stream events as JSON lines.
    #[arg(long)]
    pub stream: bool,

    /// Config file path (overrides auto-discovery).
    #[arg(short, long)]
    pub config: Option<String>,
}

impl ChatArgs {
    fn inbound(&self) -> InboundRequest {
        InboundRequest {
            message: self.message.clone(),
            provider: self.provider.clone(),
            model: self.model.clone(),
            max_retries: self.max_retries,
            timeout: self.timeout,
            streaming: self.stream,
        }
    }
}

/// Run the `chat` subcommand.
pub async fn run(args: ChatArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let gateway = Gateway::from_config(config)?;
    let request = gateway.request_from(args.inbound());

    if !request.streaming {
        let reply = gateway.chat(&request).await?;
        println!("{}", render_reply(&reply)?);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let mut events = gateway.chat_stream(request, cancel.clone())?;

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, cancelling stream");
            interrupt.cancel();
        }
    });

    while let Some(event) = events.recv().await {
        println!("{}", event.to_line());
    }
    if cancel.is_cancelled() {
        anyhow::bail!("stream cancelled");
    }
    Ok(())
}

fn render_reply(reply: &ChatReply) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(reply)?)
}
