use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, header};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chatrelay::config::{Config, ProviderConfig, ProviderMode};
use chatrelay::relay::{Backend, ChatHandler};
use chatrelay::server::{AppState, build_app};
use chatrelay::function;
use chatrelay_client::{API_URL_ENV, ChatClient, DEFAULT_API_URL};
use chatrelay_types::{CHAT_PATH, HEALTH_PATH};

#[derive(Parser)]
#[command(name = "chatrelay", version, about = "Minimal chat relay server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Run the chat function once: request body on stdin, response body on stdout
    Invoke(InvokeArgs),
    /// Send a message to a running server and print the reply
    Send(SendArgs),
}

#[derive(Args)]
struct BackendArgs {
    /// Path to the config file
    #[arg(long, env = "CHATRELAY_CONFIG", default_value = "chatrelay.yaml")]
    config: PathBuf,

    /// Reply with the local echo instead of calling the provider
    #[arg(long)]
    echo: bool,
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    backend: BackendArgs,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

#[derive(Args)]
struct InvokeArgs {
    #[command(flatten)]
    backend: BackendArgs,

    /// HTTP method of the simulated request
    #[arg(long, default_value = "POST")]
    method: String,
}

#[derive(Args)]
struct SendArgs {
    /// Base URL of the chatrelay server
    #[arg(long, env = API_URL_ENV, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Message to send
    #[arg(required = true)]
    message: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,chatrelay=debug")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Invoke(args) => invoke(args).await,
        Command::Send(args) => send(args).await,
    }
}

async fn load_config(args: &BackendArgs) -> anyhow::Result<Config> {
    let mut config = Config::load(&args.config)
        .await
        .with_context(|| format!("loading {}", args.config.display()))?;
    if args.echo {
        config.provider.mode = ProviderMode::Echo;
    }
    Ok(config)
}

fn build_handler(config: &Config) -> ChatHandler {
    let backend = Backend::from_config(
        &config.provider,
        ProviderConfig::from_env(),
        reqwest::Client::new(),
    );
    ChatHandler::new(
        backend,
        Duration::from_secs(config.provider.timeout_seconds),
    )
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config(&args.backend).await?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let state = AppState::new(build_handler(&config));
    let app = build_app(state, config.server.request_timeout_seconds);

    let bind_addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    let local_addr = listener.local_addr()?;

    info!(addr = %local_addr, "Server running");
    info!(
        "Health check: http://localhost:{}{}",
        local_addr.port(),
        HEALTH_PATH
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn invoke(args: InvokeArgs) -> anyhow::Result<()> {
    let config = load_config(&args.backend).await?;
    let handler = build_handler(&config);

    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("invalid method {:?}", args.method))?;

    let mut body = Vec::new();
    tokio::io::stdin().read_to_end(&mut body).await?;

    let request = Request::builder()
        .method(method)
        .uri(CHAT_PATH)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))?;

    let response = function::invoke(&handler, request).await;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&bytes).await?;
    if !bytes.is_empty() {
        stdout.write_all(b"\n").await?;
    }
    stdout.flush().await?;

    info!(status = status.as_u16(), "Function invoked");
    if !status.is_success() {
        bail!("function returned status {status}");
    }
    Ok(())
}

async fn send(args: SendArgs) -> anyhow::Result<()> {
    let client = ChatClient::new(args.api_url);
    let message = args.message.join(" ");

    let Some(reply) = client.reply_or_fallback(&message).await else {
        bail!("message is empty");
    };
    println!("{reply}");
    Ok(())
}
