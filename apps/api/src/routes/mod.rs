pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use crate::auth::handlers as auth;
use crate::jobs::handlers as jobs;
use crate::profile::handlers as profile;
use crate::rate_limit::rate_limit_middleware;
use crate::reference::handlers as reference;
use crate::resume::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Body limit sits above MAX_FILE_MB so oversize files reach the
    // normalizer and get its message.
    let ai_routes = Router::new()
        .route("/summarize-resume", post(resume::handle_summarize_resume))
        .route_layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(DefaultBodyLimit::max(
            state.config.upload_body_limit_mb * 1024 * 1024,
        ));

    let auth_routes = Router::new()
        .route("/register", post(auth::handle_register))
        .route("/login", post(auth::handle_login));

    let profile_routes = Router::new()
        .route(
            "/",
            get(profile::handle_get_profile).put(profile::handle_update_profile),
        )
        .route("/interests", put(profile::handle_update_interests))
        .route("/tags", put(profile::handle_update_tags));

    let jobs_routes = Router::new()
        .route("/discover", get(jobs::handle_discover))
        .route("/:job_id/swipe", post(jobs::handle_swipe))
        .route(
            "/employer",
            get(jobs::handle_employer_jobs).post(jobs::handle_create_job),
        );

    let reference_routes = Router::new()
        .route(
            "/interest-categories/:major",
            get(reference::handle_interest_categories),
        )
        .route("/profile-tags/:major", get(reference::handle_profile_tags));

    Router::new()
        .route("/", get(health::index_handler))
        .route("/health", get(health::health_handler))
        .nest("/api/ai", ai_routes)
        .nest("/api/auth", auth_routes)
        .nest("/api/profile", profile_routes)
        .nest("/api/jobs", jobs_routes)
        .nest("/api/reference", reference_routes)
        .with_state(state)
}
