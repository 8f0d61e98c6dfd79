// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{analytics, exam, questions, tests},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Nests the trainer surface (tests, question banks, analytics) and the
///   trainee surface (exam landing/start/submit).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, session store).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let test_routes = Router::new()
        .route("/", get(tests::list_tests).post(tests::create_test))
        .route(
            "/{id}",
            get(tests::get_test)
                .put(tests::update_test)
                .delete(tests::delete_test),
        )
        .route(
            "/{id}/questions",
            get(questions::list_questions).post(questions::create_question),
        )
        .route("/{id}/questions/import", post(questions::import_questions))
        .route(
            "/{id}/questions/{question_id}",
            delete(questions::delete_question),
        )
        .route("/{id}/analytics", get(analytics::get_test_analytics));

    let exam_routes = Router::new()
        .route("/{code}", get(exam::get_exam_landing))
        .route("/{code}/start", post(exam::start_exam))
        .route("/{code}/submit", post(exam::submit_exam));

    Router::new()
        .nest("/api/tests", test_routes)
        .nest("/api/exam", exam_routes)
        // Global middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
