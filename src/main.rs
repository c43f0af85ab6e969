use actix_web::{web, App, HttpResponse, HttpServer, middleware::Compress};
use actix_cors::Cors;
use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use tracing_actix_web::TracingLogger;

use somba_forum::catalog::StaticCatalog;
use somba_forum::config::AppConfig;
use somba_forum::openapi::ApiDoc;
use somba_forum::rate_limit::{InMemoryRateLimiter, RateLimiterFacade};
use somba_forum::search::KeywordHelpSearch;
use somba_forum::{config, AppState, SecurityHeaders};

async fn metrics_endpoint(handle: web::Data<PrometheusHandle>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(handle.render())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds; deployments set the environment externally.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cfg = AppConfig::from_env().context("invalid configuration")?;
    info!("Bootstrapping help centre server");
    info!(
        search_ms = cfg.latency.search.as_millis() as u64,
        reply_ms = cfg.latency.reply.as_millis() as u64,
        redirect_ms = cfg.latency.redirect.as_millis() as u64,
        "simulated latencies"
    );
    info!("Frontend URL: {}", cfg.frontend_url.as_deref().unwrap_or("http://localhost:5173"));

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install metrics recorder")?;

    let mut state = AppState::new(Arc::new(StaticCatalog::new()), Arc::new(KeywordHelpSearch::new()))
        .with_latency(cfg.latency)
        .with_session_limits(cfg.sessions);
    if cfg.rate_limit_enabled {
        info!("Rate limiting enabled");
        state = state.with_rate_limiter(RateLimiterFacade::new(InMemoryRateLimiter::new(true), cfg.rate_limits.clone()));
    }
    let state = web::Data::new(state);

    // end idle sessions even when nobody is creating new ones
    let sessions = state.sessions.clone();
    let sweep_every = cfg.sessions.idle_ttl.max(Duration::from_secs(60));
    actix_web::rt::spawn(async move {
        let mut tick = actix_web::rt::time::interval(sweep_every);
        loop {
            tick.tick().await;
            let swept = sessions.sweep_idle();
            if swept > 0 {
                info!(swept, live = sessions.len(), "idle sessions ended");
            }
        }
    });

    let openapi = ApiDoc::openapi();
    info!("OpenAPI document generated");

    let bind_addr = cfg.bind_addr.clone();
    let server = HttpServer::new(move || {
        let cors = {
            let mut c = Cors::default()
                // during local dev allow React/Vite default ports
                .allowed_origin("http://localhost:5173")
                .allowed_origin("http://127.0.0.1:5173")
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allow_any_header()
                .allowed_methods(["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
                .expose_headers(["x-session-id"])
                .max_age(3600);
            if let Some(front) = &cfg.frontend_url {
                c = c.allowed_origin(front);
            }
            c
        };

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(SecurityHeaders::from_config(&cfg))
            .wrap(cors)
            .app_data(state.clone())
            .app_data(web::Data::new(prometheus.clone()))
            .configure(config)
            .route("/metrics", web::get().to(metrics_endpoint))
            .service(SwaggerUi::new("/docs").url("/docs/openapi.json", openapi.clone()))
    })
    .bind(&bind_addr)
    .with_context(|| format!("failed to bind {bind_addr}"))?;

    info!("Listening on http://{bind_addr}");

    server.run().await?;
    Ok(())
}
