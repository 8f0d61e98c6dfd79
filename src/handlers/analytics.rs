// src/handlers/analytics.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{question::Question, result::TestResult, test::Test},
    quiz::aggregate::aggregate,
};

/// Builds the trainer dashboard for one test: participation, per-question
/// tallies against the current bank, and the score distribution.
pub async fn get_test_analytics(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let test = sqlx::query_as::<_, Test>(
        r#"
        SELECT id, test_code, name, description, duration_minutes, total_trainees, created_at, updated_at
        FROM tests
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch test: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("Test not found".to_string()))?;

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, test_id, question_text, option1, option2, option3, option4, correct, is_multiple
        FROM questions
        WHERE test_id = $1
        ORDER BY id
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let results = sqlx::query_as::<_, TestResult>(
        r#"
        SELECT id, test_id, attempted_at, score, total, raw_answers, trainee_name, trainee_email
        FROM results
        WHERE test_id = $1
        ORDER BY attempted_at
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(aggregate(&test, &questions, &results)))
}
