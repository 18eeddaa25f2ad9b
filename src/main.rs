//! ZeroShark
//!
//! Query threat-intelligence vendors for an indicator, one at a time or as a
//! consolidated report, from the command line or over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zeroshark::api::{AppState, create_router};
use zeroshark::config::{ApiKeys, DEFAULT_TIMEOUT_SECS, Endpoints, Settings};
use zeroshark::providers::{HttpFetcher, ProviderId, ProviderRegistry};
use zeroshark::report::{GeminiSummarizer, ReportGenerator, Summarizer, TemplateSummarizer};
use zeroshark::session::Session;

/// ZeroShark
#[derive(Parser, Debug)]
#[command(name = "zeroshark", version)]
#[command(about = "Query and aggregate threat intelligence lookups")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Per-provider request timeout in seconds
    #[arg(long, env = "PROVIDER_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    provider_timeout_secs: u64,

    /// Send every vendor request to this base URL instead of the real APIs
    #[arg(long, env = "VENDOR_BASE_URL", global = true)]
    vendor_base_url: Option<String>,

    /// Gemini API key; without it reports use the built-in template summary
    #[arg(long, env = "GEMINI_API_KEY", global = true, hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Gemini model used for report summaries
    #[arg(long, env = "GEMINI_MODEL", default_value = GeminiSummarizer::DEFAULT_MODEL, global = true)]
    gemini_model: String,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Server host
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// Server port
        #[arg(long, env = "PORT", default_value = "8080")]
        port: u16,
    },

    /// Look up an indicator with a single provider
    Lookup {
        /// Provider id, e.g. virustotal
        service: ProviderId,

        /// IP, domain, URL or hash
        input: String,

        /// Key for this call only, overriding <SERVICE>_API_KEY
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Query several providers and summarize the results
    Report {
        /// IP, domain, URL or hash
        indicator: String,

        /// Comma-separated provider ids
        #[arg(long, value_delimiter = ',', required = true)]
        services: Vec<String>,
    },

    /// List every known provider
    Services,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Parse arguments
    let args = Args::parse();

    // Initialize tracing. Logs go to stderr so command output stays clean.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "zeroshark=info,tower_http=info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(
            args.log_json
                .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with((!args.log_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    let settings = Settings {
        endpoints: match &args.vendor_base_url {
            Some(base) => Endpoints::all(base),
            None => Endpoints::default(),
        },
        timeout: Duration::from_secs(args.provider_timeout_secs),
    };

    let registry = Arc::new(
        ProviderRegistry::new(&settings).context("Failed to build HTTP client")?,
    );
    let session = Session::new(ApiKeys::from_env());

    match args.command {
        Command::Serve { ref host, port } => {
            let reports = ReportGenerator::new(registry.clone(), summarizer(&args, &settings)?);
            serve(host, port, registry, reports, session).await
        }
        Command::Lookup {
            service,
            ref input,
            ref api_key,
        } => {
            let mut session = session;
            let data = session
                .lookup(&registry, service, input, api_key.as_deref())
                .await
                .with_context(|| format!("{} lookup failed", service.display_name()))?;
            print_json(&data)
        }
        Command::Report {
            ref indicator,
            ref services,
        } => {
            let reports = ReportGenerator::new(registry.clone(), summarizer(&args, &settings)?);
            let keys = session.keys(&ApiKeys::new());
            let report = reports
                .generate_report(indicator, services, &keys)
                .await
                .context("Failed to generate report")?;
            print_json(&report)
        }
        Command::Services => print_json(&registry.catalog()),
    }
}

fn summarizer(args: &Args, settings: &Settings) -> Result<Arc<dyn Summarizer>> {
    match args.gemini_api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(key) => {
            tracing::info!(model = %args.gemini_model, "Gemini summaries enabled");
            let http = HttpFetcher::new(settings.timeout).context("Failed to build HTTP client")?;
            Ok(Arc::new(GeminiSummarizer::new(
                http,
                &settings.endpoints.gemini,
                &args.gemini_model,
                key.to_string(),
            )))
        }
        None => {
            tracing::info!("GEMINI_API_KEY not set, using template summaries");
            Ok(Arc::new(TemplateSummarizer))
        }
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}

async fn serve(
    host: &str,
    port: u16,
    registry: Arc<ProviderRegistry>,
    reports: ReportGenerator,
    session: Session,
) -> Result<()> {
    tracing::info!("Starting ZeroShark");

    let configured = session.stats().configured_providers;
    tracing::info!(providers = ?configured, "API keys loaded from environment");

    // Create application state
    let state = Arc::new(AppState {
        registry,
        reports,
        session: RwLock::new(session),
    });

    // Setup CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Create router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid listen address")?;
    tracing::info!("Listening on http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
