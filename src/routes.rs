// src/routes.rs

use std::sync::Arc;

use axum::{
    Router, http::Method, middleware,
    routing::{get, post, put},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, material, practice, progress, upload},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, materials, practice, progress, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:5173".parse().unwrap(),
        "http://127.0.0.1:5173".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Brute-force damping on the credential endpoints.
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(5)
        .finish()
        .unwrap();
    let governor_conf = Arc::new(governor_conf);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(GovernorLayer::new(governor_conf))
        // Protected profile route
        .merge(
            Router::new().route("/me", get(auth::me)).layer(
                middleware::from_fn_with_state(state.clone(), auth_middleware),
            ),
        );

    let material_routes = Router::new()
        .route("/", get(material::list_materials))
        .route("/{id}", get(material::get_material))
        .route("/{id}/questions", get(practice::get_questions))
        .route("/{id}/submit", post(practice::submit_practice))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let question_routes = Router::new()
        .route("/{id}/check", post(practice::check_answer))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let progress_routes = Router::new()
        .route("/", get(progress::my_progress))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route(
            "/materials",
            get(admin::list_materials).post(admin::create_material),
        )
        .route(
            "/materials/{id}",
            put(admin::update_material).delete(admin::delete_material),
        )
        .route(
            "/questions",
            get(admin::list_questions).post(admin::create_question),
        )
        .route(
            "/questions/{id}",
            put(admin::update_question).delete(admin::delete_question),
        )
        .route("/users", get(admin::list_users))
        .route("/history", get(admin::attempt_history))
        .route("/uploads", post(upload::upload_file))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/materials", material_routes)
        .nest("/api/questions", question_routes)
        .nest("/api/progress", progress_routes)
        .nest("/api/admin", admin_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
