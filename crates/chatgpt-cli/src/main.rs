use anyhow::Result;
use chatgpt_core::{Client, Config, ConversationConfig};
use clap::Parser;
use std::path::PathBuf;

mod app;

#[derive(Parser)]
#[command(name = "chatgpt")]
#[command(about = "Chat with ChatGPT-style completion APIs from the terminal")]
#[command(version)]
struct Cli {
    /// Run a single prompt and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Config file (defaults to <config dir>/chatgpt/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Proxy for API requests (http://, https:// or socks5://)
    #[arg(long)]
    proxy: Option<String>,

    /// Conversation context
    #[arg(long)]
    context: Option<String>,

    /// Reply language
    #[arg(long)]
    language: Option<String>,

    /// Speaker name for your messages
    #[arg(long)]
    user: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load(),
    };
    if let Some(ref model) = cli.model {
        config.model = model.clone();
    }
    if cli.proxy.is_some() {
        config.proxy = cli.proxy.clone();
    }

    let client = Client::new(config)?;
    let model = client.config().model.clone();

    if let Some(prompt) = cli.prompt {
        app::run_single_prompt(&client, &model, &prompt).await?;
    } else {
        let mut settings = ConversationConfig::default().with_model(model);
        settings.context = cli.context;
        settings.language = cli.language;
        app::run_repl(client, settings, cli.user).await?;
    }

    Ok(())
}
