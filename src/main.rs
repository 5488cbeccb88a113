use actix_web::{middleware::Compress, App, HttpServer};
use actix_cors::Cors;
use anyhow::Context as _;
use std::sync::Arc;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use memories::config::{Config, StoreConfig};
use memories::openapi::ApiDoc;
use memories::rate_limit::{InMemoryRateLimiter, RateLimitConfig, RateLimiterFacade};
use memories::repo::Repo;
use memories::storage::build_blob_store;
use memories::{pages, routes, telemetry, AppState, SecurityHeaders};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env automatically only in debug builds to reduce manual setup overhead.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    telemetry::init_tracing();
    telemetry::install_prometheus();

    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("configuration error: {e}");
            eprintln!("Please copy .env.example to .env and configure it");
            std::process::exit(1);
        }
    };

    info!("Bootstrapping memories server");
    info!("Frontend URL: {}", cfg.frontend_url.as_deref().unwrap_or("(same origin)"));

    let (repo, blobs) = match bootstrap(&cfg).await {
        Ok(parts) => parts,
        Err(e) => {
            error!("startup failed: {e:#}");
            std::process::exit(1);
        }
    };

    let mut state = AppState::new(repo, blobs);
    if cfg.rate_limit_enabled {
        state = state.with_rate_limiter(RateLimiterFacade::new(
            InMemoryRateLimiter::new(true),
            RateLimitConfig::from_env(),
        ));
    }
    let state = actix_web::web::Data::new(state);

    let openapi = ApiDoc::openapi();
    info!("OpenAPI document generated");

    let security = SecurityHeaders::from_env().with_media_base(&cfg.blobs.public_base());
    let frontend = cfg.frontend_url.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default()
            // during local dev allow a separately served frontend
            .allowed_origin("http://localhost:5173")
            .allowed_origin("http://127.0.0.1:5173")
            .allow_any_header()
            .allowed_methods(["GET", "POST", "OPTIONS"])
            .max_age(3600);
        if let Some(front) = &frontend {
            cors = cors.allowed_origin(front);
        }

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(security.clone())
            .wrap(cors)
            .app_data(state.clone())
            .configure(routes::config)
            .configure(pages::config)
            .service(SwaggerUi::new("/docs").url("/docs/openapi.json", openapi.clone()))
    })
    .bind(cfg.bind_addr.as_str())?;

    info!("Listening on http://{}", cfg.bind_addr);

    server.run().await
}

async fn bootstrap(cfg: &Config) -> anyhow::Result<(Arc<dyn Repo>, Arc<dyn memories::storage::BlobStore>)> {
    let repo = build_repo(&cfg.store).await?;
    let blobs = build_blob_store(&cfg.blobs).await.context("blob store")?;
    Ok((repo, blobs))
}

async fn build_repo(store: &StoreConfig) -> anyhow::Result<Arc<dyn Repo>> {
    match store {
        #[cfg(feature = "inmem-store")]
        StoreConfig::InMemory { data_dir } => {
            info!("Using in-memory repository backend (snapshot in {})", data_dir.display());
            Ok(Arc::new(memories::repo::inmem::InMemRepo::in_dir(data_dir)))
        }
        #[cfg(feature = "postgres-store")]
        StoreConfig::Postgres { url, max_connections } => {
            use sqlx::postgres::PgPoolOptions;
            let pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .connect(url)
                .await
                .context("connecting to DATABASE_URL")?;
            let repo = memories::repo::pg::PgRepo::new(pool);
            repo.migrate().await.context("running migrations")?;
            info!("Using Postgres repository backend");
            Ok(Arc::new(repo))
        }
        #[allow(unreachable_patterns)]
        other => anyhow::bail!("store backend {other:?} is not compiled into this build"),
    }
}
