// src/quiz/session.rs

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::SESSION_GRACE_SECS;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no active exam session for this token")]
    NotFound,
    #[error("exam session has expired")]
    Expired,
    #[error("exam session belongs to a different test")]
    TestMismatch,
}

/// A single trainee's in-flight exam: which test they are sitting, the exact
/// questions they were dealt (in dealt order), and the clock they are on.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamSession {
    pub test_id: i64,
    pub test_code: String,
    pub question_ids: Vec<i64>,
    pub issued_at: DateTime<Utc>,
    pub allotted_secs: i64,
}

impl ExamSession {
    /// A session stays consumable for a short grace window past its allotted
    /// time, covering submissions fired right as the trainee's timer runs out.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let deadline = self.issued_at + Duration::seconds(self.allotted_secs + SESSION_GRACE_SECS);
        now > deadline
    }
}

/// In-memory registry of in-flight exam sessions, keyed by an opaque token
/// handed to the trainee at start. Sessions are process-local and deliberately
/// not persisted: a restart voids them and trainees simply restart the exam.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, ExamSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly dealt exam and returns its session token. Expired
    /// leftovers are swept here so abandoned sessions cannot pile up.
    pub async fn start(&self, session: ExamSession) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        let now = Utc::now();
        let mut sessions = self.inner.lock().await;
        sessions.retain(|_, s| !s.is_expired(now));
        sessions.insert(token.clone(), session);
        token
    }

    /// Redeems a token for its session, exactly once. The session is removed
    /// on success and on expiry, so a token can never score twice; a token
    /// presented against the wrong test is left intact for its own test.
    pub async fn consume(&self, token: &str, test_code: &str) -> Result<ExamSession, SessionError> {
        let now = Utc::now();
        let mut sessions = self.inner.lock().await;

        let expired = match sessions.get(token) {
            None => return Err(SessionError::NotFound),
            Some(s) if s.test_code != test_code => return Err(SessionError::TestMismatch),
            Some(s) => s.is_expired(now),
        };

        let session = sessions.remove(token).ok_or(SessionError::NotFound)?;
        if expired {
            return Err(SessionError::Expired);
        }
        Ok(session)
    }
}
