use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::Context;
use chrono::Utc;
use interaction_service::db::{InteractionStore, PgInteractionStore};
use interaction_service::handlers;
use interaction_service::middleware::{BearerAuthMiddleware, IdentityVerifier, JwtIdentityVerifier};
use interaction_service::moderation::{HttpTextClassifier, ModerationGateway};
use interaction_service::services::{InteractionService, ModerationPolicy};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

struct HealthState {
    db_pool: sqlx::PgPool,
    moderation_configured: bool,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

impl HealthState {
    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.db_pool)
            .await
            .map(|_| ())
    }
}

async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.check_postgres().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "interaction-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => {
            tracing::error!(error = %e, "Health check: PostgreSQL unreachable");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": "interaction-service"
            }))
        }
    }
}

async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let mut checks = HashMap::new();

    let start = Instant::now();
    let pg_result = state.check_postgres().await;
    let pg_latency = Some(start.elapsed().as_millis() as u64);
    let ready = pg_result.is_ok();
    checks.insert(
        "postgresql".to_string(),
        match pg_result {
            Ok(_) => ComponentCheck {
                status: ComponentStatus::Healthy,
                message: "PostgreSQL connection successful".to_string(),
                latency_ms: pg_latency,
            },
            Err(e) => ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("PostgreSQL connection failed: {}", e),
                latency_ms: pg_latency,
            },
        },
    );

    // Without a classifier key reads still work; new posts fail closed.
    checks.insert(
        "moderation".to_string(),
        if state.moderation_configured {
            ComponentCheck {
                status: ComponentStatus::Healthy,
                message: "Classifier configured".to_string(),
                latency_ms: None,
            }
        } else {
            ComponentCheck {
                status: ComponentStatus::Degraded,
                message: "MODERATION_API_KEY not set; post creation will fail".to_string(),
                latency_ms: None,
            }
        },
    );

    let status = match (ready, state.moderation_configured) {
        (false, _) => ComponentStatus::Unhealthy,
        (true, false) => ComponentStatus::Degraded,
        (true, true) => ComponentStatus::Healthy,
    };

    let response = ReadinessResponse {
        ready,
        status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Interaction Service
///
/// Posts, replies and likes with moderation-gated writes.
///
/// # Routes
///
/// - `/api/v1/health`, `/api/v1/health/ready`, `/api/v1/health/live` - probes (no auth)
/// - `/api/v1/users/me` - caller's display profile
/// - `/api/v1/posts/*` - create, feed, detail, replies, like / unlike
/// - `/api/v1/notifications` - likes and replies on the caller's posts
///
/// Runs on port 8090 (configurable via INTERACTION_SERVICE_PORT).
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Container healthcheck via CLI subcommand
    {
        let mut args = std::env::args();
        let _bin = args.next();
        if let Some(cmd) = args.next() {
            if cmd == "healthcheck" || cmd == "healthcheck-http" {
                let port = std::env::var("INTERACTION_SERVICE_PORT")
                    .unwrap_or_else(|_| "8090".to_string());
                let url = format!("http://127.0.0.1:{}/api/v1/health", port);
                let resp = reqwest::Client::new()
                    .get(&url)
                    .send()
                    .await
                    .context("healthcheck HTTP error")?;
                if !resp.status().is_success() {
                    anyhow::bail!("healthcheck HTTP status: {}", resp.status());
                }
                return Ok(());
            }
        }
    }

    init_tracing();

    let config = match interaction_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            anyhow::bail!("failed to load configuration: {}", e);
        }
    };

    tracing::info!("Starting interaction-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let verifier = JwtIdentityVerifier::new(
        config.auth.jwt_public_key_pem.as_deref(),
        config.auth.jwt_issuer.as_deref(),
    )
    .context("failed to load JWT public key")?;
    if !verifier.is_configured() {
        tracing::warn!("JWT public key not configured; authenticated routes will reject every request");
    }
    let verifier: Arc<dyn IdentityVerifier> = Arc::new(verifier);

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .connect(&config.database.url)
        .await
        .context("failed to connect to PostgreSQL")?;
    tracing::info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    if config.moderation.api_key.trim().is_empty() {
        tracing::warn!("MODERATION_API_KEY not set; post creation will fail closed");
    }
    let classifier = HttpTextClassifier::new(&config.moderation)
        .context("failed to build moderation classifier client")?;
    let gateway = ModerationGateway::new(
        Arc::new(classifier),
        Duration::from_millis(config.moderation.timeout_ms),
    );

    let policy = ModerationPolicy::new(config.moderation.reject_severity)
        .context("invalid moderation policy")?;

    let store: Arc<dyn InteractionStore> = Arc::new(PgInteractionStore::new(db_pool.clone()));
    let service = web::Data::new(InteractionService::new(store, gateway, policy));

    let health_state = web::Data::new(HealthState {
        db_pool: db_pool.clone(),
        moderation_configured: !config.moderation.api_key.trim().is_empty(),
    });

    let http_bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", http_bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(service.clone())
            .app_data(health_state.clone())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/ready", web::get().to(readiness_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .service(
                web::scope("/api/v1")
                    .wrap(BearerAuthMiddleware::new(verifier.clone()))
                    .configure(handlers::configure),
            )
    })
    .bind(&http_bind_address)
    .with_context(|| format!("failed to bind {}", http_bind_address))?
    .disable_signals()
    .shutdown_timeout(30)
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Ok(())) => tracing::info!("HTTP server stopped"),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "HTTP server failed");
                    return Err(e.into());
                }
                Err(e) => {
                    tracing::error!(error = %e, "HTTP server task join error");
                    return Err(e.into());
                }
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    db_pool.close().await;
    tracing::info!("Interaction-service shutting down");

    Ok(())
}
