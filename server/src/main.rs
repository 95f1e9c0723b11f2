use anyhow::Result;
use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tldr_fetch::FetchConfig;
use tldr_server::{build_app, build_service, ServerConfig};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "tldr-server")]
#[command(about = "Extractive summaries over HTTP", long_about = None)]
struct Args {
    /// Host to bind
    #[arg(long, env = "TLDR_HOST", default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, env = "TLDR_PORT", default_value_t = 8080)]
    port: u16,
    /// Directory for the persistent cache tier (in-memory only when omitted)
    #[arg(long, env = "TLDR_CACHE_DIR")]
    cache_dir: Option<PathBuf>,
    /// Days a cached summary stays valid
    #[arg(long, env = "TLDR_CACHE_TTL_DAYS", default_value_t = 7)]
    cache_ttl_days: u64,
    /// Overall budget for locating, downloading and parsing a PDF
    #[arg(long, env = "TLDR_FETCH_TIMEOUT_SECS", default_value_t = 25)]
    fetch_timeout_secs: u64,
    /// Largest PDF accepted, in bytes
    #[arg(long, env = "TLDR_MAX_PDF_BYTES", default_value_t = 25 * 1024 * 1024)]
    max_pdf_bytes: usize,
    /// User-Agent sent with outbound requests
    #[arg(long, env = "TLDR_USER_AGENT")]
    user_agent: Option<String>,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        let mut fetch = FetchConfig {
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            max_pdf_bytes: self.max_pdf_bytes,
            ..FetchConfig::default()
        };
        if let Some(ua) = &self.user_agent {
            fetch.user_agent = ua.clone();
        }
        ServerConfig {
            cache_dir: self.cache_dir.clone(),
            cache_ttl: Duration::from_secs(self.cache_ttl_days * 24 * 60 * 60),
            fetch,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let service = build_service(&args.server_config())?;
    let app: Router = build_app(Arc::new(service));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
