/// Route table for the HTTP API
use std::sync::Arc;

use actix_web::dev::HttpServiceFactory;
use actix_web::{web, HttpResponse};
use utoipa::OpenApi;

use crate::handlers;
use crate::middleware::JwtAuth;
use crate::openapi::ApiDoc;
use crate::security::jwt::JwtKeys;

/// Everything under `/api/v1`. Health probes and the OpenAPI document stay
/// outside the authenticated scope.
pub fn api_routes(keys: Arc<JwtKeys>) -> impl HttpServiceFactory {
    web::scope("/api/v1")
        .route("/health", web::get().to(handlers::health::health))
        .route("/health/ready", web::get().to(handlers::health::ready))
        .route("/health/live", web::get().to(handlers::health::live))
        .route(
            "/openapi.json",
            web::get().to(|| async {
                HttpResponse::Ok()
                    .content_type("application/json")
                    .json(ApiDoc::openapi())
            }),
        )
        .service(
            web::scope("/auth")
                .route("/register", web::post().to(handlers::auth::register))
                .route("/login", web::post().to(handlers::auth::login)),
        )
        .service(
            web::scope("")
                .wrap(JwtAuth::new(keys))
                .service(
                    web::scope("/users")
                        .route("/me", web::get().to(handlers::users::me))
                        .route("/me", web::patch().to(handlers::users::update_me)),
                )
                .service(
                    web::scope("/videos")
                        .route(
                            "/upload-request",
                            web::post().to(handlers::videos::upload_request),
                        )
                        .route(
                            "/upload-complete",
                            web::post().to(handlers::videos::upload_complete),
                        )
                        .route("", web::get().to(handlers::videos::list_videos))
                        .route("/{video_id}", web::get().to(handlers::videos::get_video))
                        .route(
                            "/{video_id}/tags/{tag_id}",
                            web::post().to(handlers::videos::add_tag),
                        )
                        .route(
                            "/{video_id}/tags/{tag_id}",
                            web::delete().to(handlers::videos::remove_tag),
                        )
                        .route(
                            "/{video_id}/categories/{category_id}",
                            web::post().to(handlers::videos::add_category),
                        )
                        .route(
                            "/{video_id}/categories/{category_id}",
                            web::delete().to(handlers::videos::remove_category),
                        ),
                )
                .service(
                    web::scope("/tags")
                        .route("", web::post().to(handlers::tags::create_tag))
                        .route("", web::get().to(handlers::tags::list_tags))
                        .route("/{tag_id}", web::get().to(handlers::tags::get_tag))
                        .route("/{tag_id}", web::delete().to(handlers::tags::delete_tag)),
                )
                .service(
                    web::scope("/categories")
                        .route("", web::post().to(handlers::categories::create_category))
                        .route("", web::get().to(handlers::categories::list_categories))
                        .route(
                            "/{category_id}",
                            web::get().to(handlers::categories::get_category),
                        )
                        .route(
                            "/{category_id}",
                            web::delete().to(handlers::categories::delete_category),
                        ),
                ),
        )
}
