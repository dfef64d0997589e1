use axum::{routing::get, Router};

use crate::api::handlers::AppState;
use crate::api::{audio_handlers, handlers};
use crate::store::Store;

pub fn create_router<S: Store + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check::<S>))
        // Users
        .route(
            "/api/v1/users",
            get(handlers::list_users::<S>).post(handlers::create_user::<S>),
        )
        .route(
            "/api/v1/users/:user_id",
            get(handlers::get_user::<S>)
                .patch(handlers::update_user::<S>)
                .delete(handlers::delete_user::<S>),
        )
        // Audios, always scoped to their owner
        .route(
            "/api/v1/users/:user_id/audios",
            get(audio_handlers::list_user_audios::<S>)
                .post(audio_handlers::create_user_audio::<S>),
        )
        .route(
            "/api/v1/users/:user_id/audios/:audio_id",
            get(audio_handlers::get_user_audio::<S>).patch(audio_handlers::update_user_audio::<S>),
        )
}
