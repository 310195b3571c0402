//! ai-chat — 命令行聊天补全工具
//!
//! Usage:
//!   ai-chat [--model <id>] [--stream] <prompt...>
//!
//! Configuration comes from `AI_*` environment variables (see `ClientConfig::from_env`).
//! Set `RUST_LOG=ai_inference_client=debug` to see request logs.

use ai_inference_client::{AiClientBuilder, Message};
use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

struct Args {
    model: String,
    stream: bool,
    prompt: String,
}

fn parse_args(raw: &[String]) -> anyhow::Result<Option<Args>> {
    let mut model = DEFAULT_MODEL.to_string();
    let mut stream = false;
    let mut words = Vec::new();

    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--model" | "-m" => {
                model = iter.next().context("--model needs a value")?.clone();
            }
            "--stream" | "-s" => stream = true,
            "help" | "--help" | "-h" => return Ok(None),
            "version" | "--version" | "-V" => {
                println!("ai-chat {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            other if other.starts_with('-') => bail!("unknown option: {other}"),
            word => words.push(word.to_string()),
        }
    }

    if words.is_empty() {
        return Ok(None);
    }
    Ok(Some(Args {
        model,
        stream,
        prompt: words.join(" "),
    }))
}

fn print_usage() {
    println!(
        r#"ai-chat — 聊天补全命令行工具

USAGE:
    ai-chat [OPTIONS] <PROMPT>...

OPTIONS:
    -m, --model <id>    Model id (default {DEFAULT_MODEL})
    -s, --stream        Print tokens as they arrive
    -h, --help          Show this help message

ENVIRONMENT:
    AI_API_KEY          API key (the OS keyring entry ai-inference/api-key wins)
    AI_BASE_URL         API base URL
    RUST_LOG            Log filter"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let Some(args) = parse_args(&raw)? else {
        print_usage();
        return Ok(());
    };

    let client = AiClientBuilder::from_env()
        .build()
        .context("failed to build client")?;
    let request = client
        .chat(args.model)
        .message(Message::user(args.prompt));

    if args.stream {
        let mut stream = request.execute_stream().await?;
        while let Some(chunk) = stream.next().await? {
            print!("{}", chunk.content().unwrap_or_default());
        }
        println!();
        let limits = stream.rate_limits();
        tracing::info!(
            remaining_requests = limits.remaining_requests,
            remaining_tokens = limits.remaining_tokens,
            reset_tokens = limits.reset_tokens.as_str(),
            "stream finished"
        );
    } else {
        let response = request.execute().await?;
        println!("{}", response.content().unwrap_or_default());
        if let Some(usage) = &response.usage {
            tracing::info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion finished"
            );
        }
    }
    Ok(())
}
