//! # DevFlow Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use df_api::middleware::{cors_policy, standard_middleware};
use df_api::{configure_routes, AppState};
use df_config::Settings;
use df_core::traits::IdentityProvider;
use df_services::{Forum, Repos};
use secrecy::ExposeSecret;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "db-sqlite")]
use df_db_sqlite::SqliteStore;

#[cfg(feature = "auth-clerk")]
use df_auth_clerk::ClerkWebhookVerifier;

#[cfg(not(feature = "db-sqlite"))]
compile_error!("devflow needs a store plugin; enable the `db-sqlite` feature");

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn identity_provider(settings: &Settings) -> anyhow::Result<Option<Arc<dyn IdentityProvider>>> {
    let secret = settings
        .auth
        .webhook_secret
        .as_ref()
        .filter(|secret| !secret.expose_secret().trim().is_empty());
    let Some(secret) = secret else {
        warn!("auth.webhook_secret is unset or empty; identity webhooks will be rejected");
        return Ok(None);
    };

    #[cfg(feature = "auth-clerk")]
    {
        let verifier = ClerkWebhookVerifier::new(secret)?;
        Ok(Some(Arc::new(verifier)))
    }

    #[cfg(not(feature = "auth-clerk"))]
    {
        let _ = secret;
        warn!("no identity plugin compiled in; identity webhooks will be rejected");
        Ok(None)
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings);

    // 1. Store: one pool for the whole process
    #[cfg(feature = "db-sqlite")]
    let store = Arc::new(SqliteStore::connect(&settings.database.url, settings.database.max_connections).await?);

    // 2. Services over the store ports
    let forum = Forum::new(Repos::from_store(store));

    // 3. Identity provider (webhook verification)
    let identity = identity_provider(&settings)?;

    let state = web::Data::new(AppState { forum, identity });

    let (host, port) = settings.bind_addr();
    info!(%host, port, "DevFlow starting");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors_policy())
            .wrap(standard_middleware())
            .configure(configure_routes)
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}
