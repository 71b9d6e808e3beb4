use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::Method,
    http::Request,
    http::header::{CONTENT_TYPE, HeaderName, HeaderValue},
    middleware,
    middleware::Next,
    response::Response,
    routing::{get, post},
};
use clap::Parser;
use dotenvy::dotenv;
use qm_common::QuizRegistry;
use qm_common::logging::init_tracing_subscriber;
use qm_metrics::PrometheusHandle;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub mod enrichment;
pub mod error;
pub mod handlers;

use enrichment::{Enricher, LlmRuntimeConfig};
use error::ApiError;
use handlers::{health, quizzes};

const SHUTDOWN_DRAIN_GRACE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Parser)]
#[command(name = "qm-api", about = "HTTP API for the quiz matching engine")]
struct Cli {
    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3002)]
    port: u16,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "QM_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,

    /// Overall budget (ms) for LLM enrichment of one result
    #[arg(long, env = "QM_ENRICH_DEADLINE_MS", default_value_t = 8000)]
    enrich_deadline_ms: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub enrich_deadline: Duration,
    pub llm: LlmRuntimeConfig,
}

impl AppConfig {
    fn from_cli(cli: Cli, llm: LlmRuntimeConfig) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::Config(
                "QM_CORS_ORIGINS must list explicit origins".into(),
            ));
        }

        if cli.enrich_deadline_ms == 0 {
            return Err(ApiError::Config(
                "QM_ENRICH_DEADLINE_MS must be positive".into(),
            ));
        }

        Ok(Self {
            port: cli.port,
            cors_origins,
            enrich_deadline: Duration::from_millis(cli.enrich_deadline_ms),
            llm,
        })
    }

    pub fn for_tests() -> Self {
        Self {
            port: 3002,
            cors_origins: vec!["http://localhost:3000".into()],
            enrich_deadline: Duration::from_millis(8000),
            llm: LlmRuntimeConfig::default(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub registry: &'static QuizRegistry,
    pub config: AppConfig,
    pub enricher: Option<Arc<Enricher>>,
    pub readiness: Arc<AtomicBool>,
}

pub type SharedState = Arc<AppState>;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

async fn attach_request_id_context(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    Ok(error::with_request_id(request_id, next.run(req)).await)
}

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_header = request_id_header.clone();

    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&trace_header)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
            status = tracing::field::Empty,
        )
    });

    let api_routes = Router::new()
        .route("/quizzes", get(quizzes::list_quizzes))
        .route("/quizzes/:domain/questions", get(quizzes::sample_questions))
        .route("/quizzes/:domain/results", post(quizzes::submit_results));

    Router::new()
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/api", api_routes)
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid::default(),
        ))
        .layer(cors)
        .with_state(state)
}

/// 組み込みカタログと、任意の enricher を持つテスト用 state
pub fn test_state_with_enricher(enricher: Option<Arc<Enricher>>) -> SharedState {
    let registry = match qm_common::registry() {
        Ok(registry) => registry,
        Err(err) => panic!("built-in catalogs must validate: {err}"),
    };

    Arc::new(AppState {
        registry,
        config: AppConfig::for_tests(),
        enricher,
        readiness: Arc::new(AtomicBool::new(true)),
    })
}

pub fn test_state() -> SharedState {
    test_state_with_enricher(None)
}

async fn serve_metrics(handle: &'static PrometheusHandle, port: u16) {
    let app = Router::new().route("/metrics", get(move || async move { handle.render() }));
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            info!(%addr, "metrics listening");
            if let Err(err) = axum::serve(listener, app).await {
                warn!(error = %err, "metrics listener stopped");
            }
        }
        Err(err) => warn!(%addr, error = %err, "failed to bind metrics listener"),
    }
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli, LlmRuntimeConfig::from_env())?;
    let registry = qm_common::registry()?;

    let enricher = Enricher::from_config(&config.llm)
        .map_err(|err| ApiError::Config(format!("failed to build llm client: {err}")))?
        .map(Arc::new);

    if let Some(handle) = qm_metrics::init_metrics() {
        tokio::spawn(serve_metrics(handle, qm_metrics::metrics_port()));
    }

    let state = Arc::new(AppState {
        registry,
        config: config.clone(),
        enricher,
        readiness: Arc::new(AtomicBool::new(true)),
    });

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(%addr, llm_enabled = config.llm.enabled, "qm-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state.readiness.store(false, Ordering::SeqCst);

    // readyz を落としてから接続の受付を止める
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get};
    use tower::ServiceExt;

    fn cli(cors: &str, deadline_ms: u64) -> Cli {
        Cli {
            port: 3002,
            cors_origins: cors.into(),
            enrich_deadline_ms: deadline_ms,
        }
    }

    #[tokio::test]
    async fn sets_request_id_when_missing() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(SetRequestIdLayer::new(
                HeaderName::from_static("x-request-id"),
                MakeRequestUuid::default(),
            ));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn config_splits_cors_origins() {
        let config = AppConfig::from_cli(
            cli(" http://a.test, ,http://b.test ", 1500),
            LlmRuntimeConfig::default(),
        )
        .unwrap();

        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.enrich_deadline, Duration::from_millis(1500));
    }

    #[test]
    fn config_rejects_wildcard_origin_and_zero_deadline() {
        assert!(matches!(
            AppConfig::from_cli(cli("*", 8000), LlmRuntimeConfig::default()),
            Err(ApiError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_cli(cli("http://a.test", 0), LlmRuntimeConfig::default()),
            Err(ApiError::Config(_))
        ));
    }
}
