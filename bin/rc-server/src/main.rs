//! # rc-server Binary
//!
//! The entry point that assembles the portal from the compiled-in plugins.

mod settings;

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use rc_api::middleware::{cors_policy, standard_middleware};
use rc_api::{configure_routes, AppState};
use secrecy::ExposeSecret;

use settings::Settings;

#[cfg(feature = "db-sqlite")]
use rc_db_sqlite::SqliteStore;

#[cfg(feature = "storage-local")]
use rc_storage_local::LocalMediaStore;

#[cfg(feature = "auth-simple")]
use rc_auth_simple::SimpleAuthProvider;

#[cfg(not(all(feature = "db-sqlite", feature = "storage-local", feature = "auth-simple")))]
compile_error!("rc-server needs a storage, a media and an auth plugin enabled");

const TOKEN_PURGE_EVERY: Duration = Duration::from_secs(15 * 60);

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load()?;

    // 1. Database
    let store = Arc::new(SqliteStore::new(settings.database.url.expose_secret()).await?);

    // 2. Media
    std::fs::create_dir_all(&settings.media.root)?;
    let media = Arc::new(LocalMediaStore::new(
        settings.media.root.clone(),
        settings.media.url_prefix.clone(),
    ));

    // 3. Auth
    let auth = Arc::new(SimpleAuthProvider::new(chrono::Duration::hours(
        settings.auth.token_ttl_hours,
    )));
    let purger = auth.clone();
    actix_web::rt::spawn(async move {
        let mut tick = tokio::time::interval(TOKEN_PURGE_EVERY);
        loop {
            tick.tick().await;
            let dropped = purger.purge_expired();
            if dropped > 0 {
                log::debug!("purged {dropped} expired tokens");
            }
        }
    });

    let state = web::Data::new(AppState::new(store, media, auth));

    let media_root = settings.media.root.clone();
    let url_prefix = settings.media.url_prefix.clone();
    let allowed_origin = settings.cors.allowed_origin.clone();
    let bind = (settings.server.host.clone(), settings.server.port);

    log::info!("rc-server starting on http://{}:{}", bind.0, bind.1);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(standard_middleware())
            .wrap(cors_policy(allowed_origin.as_deref()))
            .app_data(state.clone())
            .service(actix_files::Files::new(&url_prefix, &media_root))
            .configure(configure_routes)
    });
    if let Some(workers) = settings.server.workers {
        server = server.workers(workers);
    }

    server.bind(bind)?.run().await?;
    Ok(())
}
