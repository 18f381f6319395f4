//! # df-api
//!
//! The JSON routing layer for DevFlow.

pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;

use std::sync::Arc;

use actix_web::web;
use df_core::traits::IdentityProvider;
use df_services::Forum;

use handlers::{answers, questions, search, tags, users, webhooks};

/// State shared across all actix-web workers.
pub struct AppState {
    pub forum: Forum,
    /// `None` when no webhook signing secret is configured
    pub identity: Option<Arc<dyn IdentityProvider>>,
}

/// Configures every route.
///
/// # Developer Note
/// Routes are registered on the given config so the binary can mount them
/// under a prefix (e.g. `/api/v1`). Static segments such as `/questions/hot`
/// are registered before their `{id}` siblings.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/webhooks/clerk", web::post().to(webhooks::identity_webhook))
        .service(
            web::scope("/users")
                .route("", web::get().to(users::list_users))
                .route("/me", web::patch().to(users::update_me))
                .route("/{id}/questions", web::get().to(users::user_questions))
                .route("/{id}/answers", web::get().to(users::user_answers))
                .route("/{id}/top-tags", web::get().to(users::user_top_tags))
                .route("/{clerk_id}", web::get().to(users::user_info)),
        )
        .route("/me/saved", web::get().to(users::saved_questions))
        .service(
            web::scope("/questions")
                .route("", web::get().to(questions::list_questions))
                .route("", web::post().to(questions::create_question))
                .route("/hot", web::get().to(questions::hot_questions))
                .route("/{id}", web::get().to(questions::get_question))
                .route("/{id}", web::patch().to(questions::edit_question))
                .route("/{id}", web::delete().to(questions::delete_question))
                .route("/{id}/view", web::post().to(questions::view_question))
                .route("/{id}/vote", web::post().to(questions::vote_question))
                .route("/{id}/save", web::post().to(questions::toggle_save))
                .route("/{id}/answers", web::get().to(answers::list_answers))
                .route("/{id}/answers", web::post().to(answers::create_answer)),
        )
        .service(
            web::scope("/answers")
                .route("/{id}", web::delete().to(answers::delete_answer))
                .route("/{id}/vote", web::post().to(answers::vote_answer)),
        )
        .service(
            web::scope("/tags")
                .route("", web::get().to(tags::list_tags))
                .route("/popular", web::get().to(tags::popular_tags))
                .route("/{id}/questions", web::get().to(tags::tag_questions)),
        )
        .route("/search", web::get().to(search::global_search));
}
