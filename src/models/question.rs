// src/models/question.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A question bank row. `correct` holds the canonical answer set ("2",
/// "1;3"), and `is_multiple` is derived from its size at write time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub test_id: i64,
    pub question_text: String,
    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,
    pub correct: String,
    pub is_multiple: bool,
}

/// What a trainee sees mid-exam: the full question minus the correct answers.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,
    pub is_multiple: bool,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text,
            option1: q.option1,
            option2: q.option2,
            option3: q.option3,
            option4: q.option4,
            is_multiple: q.is_multiple,
        }
    }
}

/// Manual single-question entry, for topping up an imported bank.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, message = "Question text cannot be empty"))]
    pub question_text: String,

    #[validate(length(min = 1, message = "Option 1 cannot be empty"))]
    pub option1: String,

    #[validate(length(min = 1, message = "Option 2 cannot be empty"))]
    pub option2: String,

    #[validate(length(min = 1, message = "Option 3 cannot be empty"))]
    pub option3: String,

    #[validate(length(min = 1, message = "Option 4 cannot be empty"))]
    pub option4: String,

    /// Correct option indices, e.g. "2" or "1;3".
    #[validate(length(min = 1, message = "Correct answers cannot be empty"))]
    pub correct: String,
}
