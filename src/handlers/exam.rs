// src/handlers/exam.rs

use std::collections::{BTreeMap, HashMap};

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    config::EXAM_QUESTION_COUNT,
    error::AppError,
    models::{
        exam::{ExamLandingResponse, ExamStartResponse, SubmitExamRequest},
        question::{PublicQuestion, Question},
        test::{Test, is_valid_test_code},
    },
    quiz::{
        answers::AnswerSet, sample::sample_question_ids, score::score_attempt,
        session::ExamSession,
    },
    state::AppState,
};

/// Shows a test's landing info so the trainee can confirm before the clock
/// starts.
pub async fn get_exam_landing(
    State(pool): State<SqlitePool>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let test = find_test_by_code(&pool, &code).await?;

    let question_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions WHERE test_id = $1")
            .bind(test.id)
            .fetch_one(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count questions: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

    Ok(Json(ExamLandingResponse {
        test_code: test.test_code,
        name: test.name,
        description: test.description,
        duration_minutes: test.duration_minutes,
        question_count,
    }))
}

/// Starts an exam attempt.
///
/// Samples the question set, freezes it in a new session, and returns the
/// questions without their correct answers. Starting again simply deals a
/// fresh independent session.
pub async fn start_exam(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let test = find_test_by_code(&state.pool, &code).await?;

    let bank: Vec<i64> = sqlx::query_scalar("SELECT id FROM questions WHERE test_id = $1")
        .bind(test.id)
        .fetch_all(&state.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list question ids: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    let dealt = sample_question_ids(&bank, EXAM_QUESTION_COUNT).map_err(|_| {
        AppError::Conflict(
            "This test has no questions yet. Please check with your trainer.".to_string(),
        )
    })?;

    let questions = fetch_questions_by_ids(&state.pool, &dealt).await?;
    let mut by_id: HashMap<i64, Question> = questions.into_iter().map(|q| (q.id, q)).collect();
    let questions: Vec<PublicQuestion> = dealt
        .iter()
        .filter_map(|id| by_id.remove(id))
        .map(PublicQuestion::from)
        .collect();

    let allotted_seconds = test.duration_minutes * 60;
    let session_token = state
        .sessions
        .start(ExamSession {
            test_id: test.id,
            test_code: test.test_code,
            question_ids: dealt,
            issued_at: Utc::now(),
            allotted_secs: allotted_seconds,
        })
        .await;

    tracing::info!(
        test_id = test.id,
        questions = questions.len(),
        "exam session started"
    );

    Ok(Json(ExamStartResponse {
        session_token,
        test_name: test.name,
        allotted_seconds,
        questions,
    }))
}

/// Scores a submitted attempt.
///
/// * Canonicalizes the submitted answers (rejecting out-of-range indices)
///   before the session is touched, so a malformed body can be corrected
///   and resent.
/// * Consumes the session; missing, expired, already-used and wrong-test
///   tokens are all refused the same way.
/// * Grades against the dealt question set and records the result.
pub async fn submit_exam(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(payload): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let test = find_test_by_code(&state.pool, &code).await?;

    let mut submitted: BTreeMap<i64, AnswerSet> = BTreeMap::new();
    for (question_id, indices) in &payload.answers {
        let set = AnswerSet::from_indices(indices.iter().copied()).map_err(|e| {
            AppError::BadRequest(format!("Invalid answer for question {question_id}: {e}"))
        })?;
        submitted.insert(*question_id, set);
    }

    let session = state
        .sessions
        .consume(&payload.session_token, &test.test_code)
        .await
        .map_err(|e| {
            tracing::info!(test_id = test.id, reason = %e, "refused exam submission");
            AppError::NoActiveSession("No active exam session. Please restart the test.".to_string())
        })?;

    let questions = fetch_questions_by_ids(&state.pool, &session.question_ids).await?;
    let mut correct_by_question = BTreeMap::new();
    for q in &questions {
        match AnswerSet::parse(&q.correct) {
            Ok(set) => {
                correct_by_question.insert(q.id, set);
            }
            Err(err) => {
                tracing::warn!(
                    question_id = q.id,
                    %err,
                    "question has an unreadable correct set, it cannot be scored"
                );
            }
        }
    }

    let outcome = score_attempt(&session.question_ids, &correct_by_question, &submitted);
    let raw_answers = serde_json::to_string(&outcome.snapshot)?;

    sqlx::query(
        r#"
        INSERT INTO results (test_id, attempted_at, score, total, raw_answers, trainee_name, trainee_email)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(test.id)
    .bind(Utc::now())
    .bind(outcome.score)
    .bind(outcome.total)
    .bind(raw_answers)
    .bind(normalize(payload.trainee_name))
    .bind(normalize(payload.trainee_email))
    .execute(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to record exam result: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(
        test_id = test.id,
        score = outcome.score,
        total = outcome.total,
        "exam submitted"
    );

    Ok(Json(serde_json::json!({
        "score": outcome.score,
        "total": outcome.total,
        "message": "Your responses have been recorded."
    })))
}

/// Resolves a trainee-entered code to its test. Malformed and unknown codes
/// get the same answer so a typo reads the same as a missing test.
async fn find_test_by_code(pool: &SqlitePool, code: &str) -> Result<Test, AppError> {
    if !is_valid_test_code(code) {
        return Err(AppError::NotFound(
            "This Test ID does not exist. Please check with your trainer.".to_string(),
        ));
    }

    sqlx::query_as::<_, Test>(
        r#"
        SELECT id, test_code, name, description, duration_minutes, total_trainees, created_at, updated_at
        FROM tests
        WHERE test_code = $1
        "#,
    )
    .bind(code)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to look up test code: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound(
        "This Test ID does not exist. Please check with your trainer.".to_string(),
    ))
}

async fn fetch_questions_by_ids(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<Question>, AppError> {
    let mut query_builder = QueryBuilder::<Sqlite>::new(
        "SELECT id, test_id, question_text, option1, option2, option3, option4, correct, is_multiple
         FROM questions WHERE id IN (",
    );

    let mut separated = query_builder.separated(",");
    for id in ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");

    query_builder
        .build_query_as::<Question>()
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch dealt questions: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })
}

fn normalize(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
