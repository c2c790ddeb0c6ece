//! Studio booking HTTP server.
//!
//! Wires configuration, PostgreSQL adapters and the Stripe gateway into the
//! booking API and serves it until SIGINT/SIGTERM.

use std::sync::Arc;

use http::HeaderValue;
use studio_booking::adapters::http::{app_router, BookingAppState};
use studio_booking::adapters::postgres::{
    self, PostgresBookingReader, PostgresBookingStore, PostgresDirectory,
};
use studio_booking::adapters::stripe::{StripeConfig, StripePaymentGateway};
use studio_booking::application::handlers::CheckoutSettings;
use studio_booking::config::{AppConfig, PaymentConfig, ServerConfig};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    info!(
        environment = ?config.server.environment,
        test_mode = config.payment.is_test_mode(),
        "Starting studio booking server"
    );

    // Database
    let pool = postgres::connect(&config.database).await?;
    if config.database.run_migrations {
        postgres::migrate(&pool).await?;
        info!("Migrations applied");
    }

    // Payment gateway
    let gateway = StripePaymentGateway::new(stripe_config(&config.payment))?;

    let state = BookingAppState {
        uow: Arc::new(PostgresBookingStore::new(pool.clone())),
        reader: Arc::new(PostgresBookingReader::new(pool.clone())),
        directory: Arc::new(PostgresDirectory::new(pool)),
        gateway: Arc::new(gateway),
        checkout: CheckoutSettings {
            success_url: config.payment.success_url.clone(),
            cancel_url: config.payment.cancel_url.clone(),
            default_currency: config.payment.default_currency.clone(),
            gateway_timeout: config.payment.gateway_timeout(),
        },
        pending_payment_ttl_hours: config.booking.pending_payment_ttl_hours,
    };

    let app = app_router(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(cors_layer(&config.server));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if server.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn stripe_config(payment: &PaymentConfig) -> StripeConfig {
    let mut stripe = StripeConfig::new(
        payment.stripe_api_key.clone(),
        payment.stripe_webhook_secret.clone(),
    )
    .with_require_livemode(payment.require_livemode)
    .with_request_timeout(payment.gateway_timeout());
    if let Some(base_url) = &payment.stripe_api_base_url {
        stripe = stripe.with_base_url(base_url.clone());
    }
    stripe
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
