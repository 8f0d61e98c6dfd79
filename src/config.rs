// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Number of questions drawn from the bank for one exam attempt.
pub const EXAM_QUESTION_COUNT: usize = 5;

/// Upper bound on random draws when auto-generating a unique test code.
pub const CODE_GENERATION_ATTEMPTS: u32 = 2000;

/// Slack added to the allotted exam duration before a session is
/// considered expired on the server side.
pub const SESSION_GRACE_SECS: i64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:quiz.db?mode=rwc".to_string());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            rust_log,
        }
    }
}
