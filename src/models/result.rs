// src/models/result.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One completed attempt. `raw_answers` is a JSON object mapping question id
/// to the canonical submitted answer set, captured at scoring time so later
/// bank edits cannot rewrite what the trainee actually picked.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TestResult {
    pub id: i64,
    pub test_id: i64,
    pub attempted_at: DateTime<Utc>,
    pub score: i64,
    pub total: i64,
    pub raw_answers: String,
    pub trainee_name: Option<String>,
    pub trainee_email: Option<String>,
}
