use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use openmusic::cache::{CacheStore, MemoryCache, RedisCache};
use openmusic::cli::{self, Commands, UserCommands};
use openmusic::config::{self, Config};
use openmusic::queue::{MemoryExportQueue, PlaylistExportProducer, RedisExportQueue};
use openmusic::store::PgStore;
use openmusic::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let cfg = config::load()?;
    init_tracing(&cfg)?;

    let result = match args.command {
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(Commands::Migrate) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            db.migrate().await?;
            println!("Migrations applied.");
            Ok(())
        }
        Some(Commands::User { command }) => {
            let db = Arc::new(PgStore::connect(&cfg.database_url).await?);
            let state = AppState::new(
                cfg,
                db,
                Arc::new(MemoryCache::new()),
                Arc::new(MemoryExportQueue::new()),
            );
            handle_user_command(command, &state).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

fn init_tracing(cfg: &Config) -> anyhow::Result<()> {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "openmusic"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .context("failed to install OpenTelemetry tracer")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "openmusic=debug,tower_http=debug".into()),
    );

    let (plain, json) = if cfg.log_json {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .with(telemetry_layer)
        .init();

    Ok(())
}

async fn run_server(cfg: Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Connecting to database...");
    let db = PgStore::connect(&cfg.database_url).await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;

    let cache: Arc<dyn CacheStore>;
    let exports: Arc<dyn PlaylistExportProducer>;
    match cfg.redis_url.as_deref() {
        Some(url) => {
            tracing::info!("Connecting to Redis...");
            let client = redis::Client::open(url)?;
            let conn = redis::aio::ConnectionManager::new(client).await?;
            cache = Arc::new(RedisCache::new(conn.clone()));
            exports = Arc::new(RedisExportQueue::new(conn));
        }
        None => {
            tracing::warn!("REDIS_URL not set, using in-process playlist cache and export queue");
            cache = Arc::new(MemoryCache::new());
            exports = Arc::new(MemoryExportQueue::new());
        }
    }

    let state = Arc::new(AppState::new(cfg, Arc::new(db), cache, exports));

    let app = openmusic::api::router(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors_layer())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("OpenMusic API listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer() -> CorsLayer {
    use axum::http::{HeaderName, Method};
    use tower_http::cors::AllowOrigin;

    let allowed_origin = std::env::var("OPENMUSIC_ALLOWED_ORIGIN")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            let origin_str = origin.to_str().unwrap_or("");
            origin_str == allowed_origin
                || origin_str.starts_with("http://localhost:")
                || origin_str.starts_with("http://127.0.0.1:")
        }))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-request-id"),
        ])
}

/// Middleware: injects a unique X-Request-Id into every response.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = axum::http::HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Middleware: injects security headers into every response.
async fn security_headers_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    use axum::http::HeaderValue;

    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    // Tokens travel in these bodies.
    headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));
    headers.remove("Server");

    resp
}

async fn handle_user_command(cmd: UserCommands, state: &AppState) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Add {
            username,
            password,
            fullname,
        } => {
            let id = state
                .users
                .register(&username, &password, &fullname)
                .await
                .context("failed to register user")?;
            println!(
                "User created:\n  Username: {}\n  ID:       {}",
                username, id
            );
        }
    }
    Ok(())
}
