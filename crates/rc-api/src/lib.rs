//! # rc-api
//!
//! The JSON HTTP surface of the community portal.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;
use rc_core::validation::IMAGE_MAX_BYTES;
use rc_core::AppError;

use crate::error::ApiError;

pub use handlers::AppState;

/// Malformed or mistyped JSON bodies are validation errors (422).
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::debug!("rejected request body: {err}");
        ApiError(AppError::ValidationError(format!("invalid request body: {err}"))).into()
    })
}

/// Configures every route of the portal.
///
/// Scoped so the binary can mount the API under a prefix (e.g. `/api`).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            .app_data(json_config())
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(handlers::register))
                    .route("/login", web::post().to(handlers::login))
                    .route("/logout", web::post().to(handlers::logout)),
            )
            .service(
                web::resource("/me")
                    .route(web::get().to(handlers::me))
                    .route(web::put().to(handlers::update_me)),
            )
            .service(
                web::resource("/me/avatar")
                    .app_data(web::PayloadConfig::new(IMAGE_MAX_BYTES))
                    .route(web::post().to(handlers::upload_avatar)),
            )
            .route("/profiles/{id}", web::get().to(handlers::get_profile))
            .service(
                web::resource("/announcements")
                    .route(web::get().to(handlers::list_announcements))
                    .route(web::post().to(handlers::create_announcement)),
            )
            // Must precede "/announcements/{id}".
            .service(
                web::resource("/announcements/images")
                    .app_data(web::PayloadConfig::new(IMAGE_MAX_BYTES))
                    .route(web::post().to(handlers::upload_announcement_image)),
            )
            .service(
                web::resource("/announcements/{id}")
                    .route(web::get().to(handlers::get_announcement))
                    .route(web::patch().to(handlers::update_announcement))
                    .route(web::delete().to(handlers::delete_announcement)),
            )
            .route("/announcements/{id}/reactions", web::post().to(handlers::toggle_reaction))
            .route("/announcements/{id}/reactions/me", web::get().to(handlers::my_reaction))
            .route("/announcements/{id}/share", web::post().to(handlers::toggle_share))
            .service(
                web::resource("/announcements/{id}/comments")
                    .route(web::get().to(handlers::list_comments))
                    .route(web::post().to(handlers::add_comment)),
            )
            .service(
                web::resource("/comments/{id}")
                    .route(web::patch().to(handlers::update_comment))
                    .route(web::delete().to(handlers::delete_comment)),
            )
            .service(
                web::scope("/admin")
                    .route("/profiles", web::get().to(handlers::admin_list_profiles))
                    .route("/profiles/{id}", web::patch().to(handlers::admin_moderate)),
            ),
    );
}
