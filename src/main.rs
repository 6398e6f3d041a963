use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;

use quotrak::bootstrap;
use quotrak::config;
use quotrak::db;
use quotrak::metering::SessionController;
use quotrak::routes;
use quotrak::services::{QuotaAlertService, QuotaEngine};
use quotrak::store::PgUsageStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Load configuration
    let config = config::Config::from_env().map_err(|e| {
        log::error!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("Starting Quotrak server on {}:{}", config.host, config.port);

    // Create database pool
    let db_pool = db::create_pool(&config.database).await.map_err(|e| {
        log::error!("Database pool error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    // Run migrations
    db::run_migrations(&db_pool).await.map_err(|e| {
        log::error!("Migration error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    // Bootstrap: create initial service token if none exist
    if let Err(e) = bootstrap::create_bootstrap_token_if_needed(&db_pool).await {
        log::error!("Failed to create bootstrap token: {}", e);
    }

    // Quota alert webhook (no-op when unconfigured)
    let alerts = QuotaAlertService::from_config(&config.alerts).map_err(|e| {
        log::error!("Alert configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // The engine owns the only handle to usage counters. One instance per
    // process, injected everywhere, so tests can swap the store.
    let engine = QuotaEngine::new(Arc::new(PgUsageStore::new(
        db_pool.clone(),
        config.metering.store_timeout,
    )));
    let controller = SessionController::new(
        engine.clone(),
        alerts.clone(),
        config.metering.call_tick_interval,
    );

    // Clone values for the closure
    let host = config.host.clone();
    let port = config.port;
    let controller_for_shutdown = controller.clone();

    let server = HttpServer::new(move || {
        // CORS configuration - permissive. Usage dashboards are browser
        // clients and every request still authenticates with a meter key or
        // service token; origin checks add nothing here.
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::HeaderName::from_static("x-meter-key"),
                actix_web::http::header::HeaderName::from_static("x-translation-chars"),
            ])
            .max_age(3600);

        App::new()
            // Share pool, config and engine handles with all handlers
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(engine.clone()))
            .app_data(web::Data::new(controller.clone()))
            .app_data(web::Data::new(alerts.clone()))
            // Raw upload bodies up to the configured cap
            .app_data(web::PayloadConfig::new(config.storage.max_upload_bytes))
            // Middleware
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .wrap(cors)
            // Health check routes (no auth required)
            .service(
                web::scope("/health")
                    .route("", web::get().to(routes::health::liveness))
                    .route("/ready", web::get().to(routes::health::readiness)),
            )
            // Root health check alias
            .route("/health", web::get().to(routes::health::liveness))
            // Service-plane routes (Bearer service token)
            .configure(routes::quota::configure)
            .configure(routes::users::configure)
            .configure(routes::tokens::configure)
            // User-plane routes (meter key)
            .configure(routes::usage::configure)
            .configure(routes::objects::configure)
            .configure(routes::calls::configure)
    })
    .bind((host.as_str(), port))?
    .shutdown_timeout(30)
    .run();

    // Spawn graceful shutdown handler
    let server_handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        log::info!("Shutdown signal received, stopping server...");
        // Cancel metering loops first so terminal states get persisted
        controller_for_shutdown.shutdown().await;
        server_handle.stop(true).await;
    });

    server.await
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                log::error!("Failed to install Ctrl+C handler: {}", e);
                // Wait forever if signal handler fails
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
