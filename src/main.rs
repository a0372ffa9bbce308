//! Plan Commerce server binary.

use std::error::Error;
use std::sync::Arc;

use http::{HeaderName, HeaderValue};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use plan_commerce::adapters::auth::JwtSessionValidator;
use plan_commerce::adapters::gateway::{HttpPaymentGateway, MockPaymentGateway};
use plan_commerce::adapters::http::{app_router, OrderAppState};
use plan_commerce::adapters::memory::StaticTermsPolicy;
use plan_commerce::adapters::postgres::{
    PostgresOrderRepository, PostgresPlanReader, PostgresTermsPolicy, PostgresUnitOfWorkFactory,
};
use plan_commerce::application::handlers::order::ConfirmationOrchestrator;
use plan_commerce::application::services::{EntitlementProvisioner, OrderLedger, PlanCatalog};
use plan_commerce::config::{AppConfig, ServerConfig};
use plan_commerce::ports::{PaymentGateway, TermsPolicy};

const REQUEST_ID_HEADER: &str = "x-request-id";

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_new(&server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if server.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.server);

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!().run(&pool).await?;
        tracing::info!("Migrations applied");
    }

    let terms: Arc<dyn TermsPolicy> = match config.checkout.required_terms()? {
        Some(required) => Arc::new(StaticTermsPolicy::new(required)),
        None => Arc::new(PostgresTermsPolicy::new(pool.clone())),
    };

    let gateway: Arc<dyn PaymentGateway> = match config.gateway.http_config() {
        Some(http_config) => Arc::new(HttpPaymentGateway::new(http_config)?),
        None => {
            tracing::warn!("Payment gateway running in simulation mode");
            Arc::new(MockPaymentGateway::simulation())
        }
    };

    let catalog = Arc::new(PlanCatalog::new(Arc::new(PostgresPlanReader::new(
        pool.clone(),
    ))));
    let ledger = Arc::new(OrderLedger::new(
        Arc::new(PostgresOrderRepository::new(pool.clone())),
        catalog.clone(),
        terms,
        gateway.provider_name(),
    ));
    let orchestrator = Arc::new(
        ConfirmationOrchestrator::new(
            catalog.clone(),
            ledger.clone(),
            Arc::new(EntitlementProvisioner::new()),
            gateway,
            Arc::new(PostgresUnitOfWorkFactory::new(pool)),
        )
        .with_claim_lease_secs(config.checkout.claim_lease_secs),
    );

    let state = OrderAppState {
        catalog,
        ledger,
        orchestrator,
    };
    let validator = Arc::new(JwtSessionValidator::new(config.auth.jwt_config()));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let app = app_router(state, validator)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(cors_layer(&config.server));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
