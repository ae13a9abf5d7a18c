// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, analytics, attempt, auth, exam, question},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, educator_middleware, student_middleware},
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Assembles the main application router.
///
/// * Public: register, login.
/// * Any authenticated user: profile, exam browsing, attempt review, leaderboards.
/// * Students: exam submission.
/// * Educators/admins: question bank, exam authoring, analytics.
/// * Admins: user management.
pub fn create_router(state: AppState) -> Router {
    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .layer(require_auth.clone()),
        );

    let question_routes = Router::new()
        .route(
            "/",
            get(question::list_questions).post(question::create_question),
        )
        .layer(middleware::from_fn(educator_middleware))
        .layer(require_auth.clone());

    let exam_routes = Router::new()
        .route("/", get(exam::list_exams))
        .route("/{id}", get(exam::get_exam))
        .route("/{id}/leaderboard", get(analytics::exam_leaderboard))
        .merge(
            Router::new()
                .route("/{id}/submit", post(attempt::submit_exam))
                .layer(middleware::from_fn(student_middleware)),
        )
        .merge(
            Router::new()
                .route("/", post(exam::create_exam))
                .route("/{id}/publish", put(exam::publish_exam))
                .route("/{id}/analytics", get(analytics::exam_analytics))
                .layer(middleware::from_fn(educator_middleware)),
        )
        // Auth first, then the role gates above
        .layer(require_auth.clone());

    let attempt_routes = Router::new()
        .route("/me", get(attempt::my_attempts))
        .route("/{id}", get(attempt::get_attempt))
        .layer(require_auth.clone());

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", delete(admin::delete_user))
        .layer(middleware::from_fn(admin_middleware))
        .layer(require_auth);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/questions", question_routes)
        .nest("/api/exams", exam_routes)
        .nest("/api/attempts", attempt_routes)
        .nest("/api/admin", admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_origins)),
        )
        .with_state(state)
}
