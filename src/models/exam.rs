// src/models/exam.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::question::PublicQuestion;

/// Landing view of a test, shown before the trainee commits to starting
/// the clock.
#[derive(Debug, Serialize)]
pub struct ExamLandingResponse {
    pub test_code: String,
    pub name: String,
    pub description: String,
    pub duration_minutes: i64,
    pub question_count: i64,
}

/// The dealt exam: an opaque session token to submit with, the countdown,
/// and the sampled questions in presentation order.
#[derive(Debug, Serialize)]
pub struct ExamStartResponse {
    pub session_token: String,
    pub test_name: String,
    pub allotted_seconds: i64,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitExamRequest {
    pub session_token: String,
    /// Selected option indices keyed by question id, e.g. `{"12": [1, 3]}`.
    /// Questions left unanswered may be omitted or sent as empty lists.
    #[serde(default)]
    pub answers: HashMap<i64, Vec<u8>>,
    #[serde(default)]
    pub trainee_name: Option<String>,
    #[serde(default)]
    pub trainee_email: Option<String>,
}
