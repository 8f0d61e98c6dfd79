// src/handlers/questions.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{CreateQuestionRequest, Question},
    quiz::{answers::AnswerSet, import::parse_question_bank},
    utils::html::clean_html,
};

/// Imports a CSV question bank into a test.
///
/// The whole upload is validated first and inserted in one transaction, so a
/// bad row anywhere leaves the existing bank untouched. Returns the number of
/// questions inserted.
pub async fn import_questions(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    ensure_test_exists(&pool, id).await?;

    let bank = parse_question_bank(&body).map_err(|e| AppError::BadRequest(e.to_string()))?;
    if bank.is_empty() {
        return Err(AppError::BadRequest(
            "The uploaded file contains no question rows".to_string(),
        ));
    }

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!("Failed to open import transaction: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    for q in &bank {
        sqlx::query(
            r#"
            INSERT INTO questions (test_id, question_text, option1, option2, option3, option4, correct, is_multiple)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(&q.question_text)
        .bind(&q.options[0])
        .bind(&q.options[1])
        .bind(&q.options[2])
        .bind(&q.options[3])
        .bind(q.correct.canonical())
        .bind(q.is_multiple())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert imported question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;
    }

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to commit question import: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(test_id = id, inserted = bank.len(), "imported question bank");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "inserted": bank.len() })),
    ))
}

/// Lists a test's question bank. Trainer view: includes the correct sets.
pub async fn list_questions(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_test_exists(&pool, id).await?;

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

    Ok(Json(questions))
}

/// Adds a single question to a test's bank, with the same sanitization and
/// answer-set rules as the CSV import.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let correct = AnswerSet::parse(&payload.correct)
        .map_err(|e| AppError::BadRequest(format!("Invalid correct answers: {e}")))?;

    let question_text = sanitize_field(&payload.question_text, "Question text")?;
    let option1 = sanitize_field(&payload.option1, "Option 1")?;
    let option2 = sanitize_field(&payload.option2, "Option 2")?;
    let option3 = sanitize_field(&payload.option3, "Option 3")?;
    let option4 = sanitize_field(&payload.option4, "Option 4")?;

    ensure_test_exists(&pool, id).await?;

    let question = sqlx::query_as::<_, Question>(
        r#"
        INSERT INTO questions (test_id, question_text, option1, option2, option3, option4, correct, is_multiple)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, test_id, question_text, option1, option2, option3, option4, correct, is_multiple
        "#,
    )
    .bind(id)
    .bind(question_text)
    .bind(option1)
    .bind(option2)
    .bind(option3)
    .bind(option4)
    .bind(correct.canonical())
    .bind(correct.is_multiple())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Deletes one question from a test's bank.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Path((id, question_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1 AND test_id = $2")
        .bind(question_id)
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_test_exists(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM tests WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check test existence: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or(AppError::NotFound("Test not found".to_string()))?;
    Ok(())
}

fn sanitize_field(raw: &str, field: &str) -> Result<String, AppError> {
    let cleaned = clean_html(raw.trim());
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(AppError::BadRequest(format!(
            "{field} is empty after sanitization"
        )));
    }
    Ok(cleaned.to_string())
}
