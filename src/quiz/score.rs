// src/quiz/score.rs

use std::collections::BTreeMap;

use crate::quiz::answers::AnswerSet;

/// The graded outcome of one exam attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub score: i64,
    pub total: i64,
    /// Per-question record of what the trainee submitted, in canonical form,
    /// keyed by question id. Unanswered questions appear with an empty string
    /// so the snapshot always covers the whole dealt set.
    pub snapshot: BTreeMap<i64, String>,
}

/// Grades an attempt against the dealt questions.
///
/// A question earns one point exactly when the submitted set equals the
/// correct set. An empty submission never scores, and neither does a question
/// whose correct set is missing from the lookup. Submissions for questions
/// that were never dealt are ignored.
pub fn score_attempt(
    dealt: &[i64],
    correct_by_question: &BTreeMap<i64, AnswerSet>,
    submitted: &BTreeMap<i64, AnswerSet>,
) -> ScoreOutcome {
    let mut score = 0;
    let mut snapshot = BTreeMap::new();

    for id in dealt {
        let answer = submitted.get(id);
        if let (Some(answer), Some(correct)) = (answer, correct_by_question.get(id)) {
            if !answer.is_empty() && answer == correct {
                score += 1;
            }
        }
        snapshot.insert(*id, answer.map(AnswerSet::canonical).unwrap_or_default());
    }

    ScoreOutcome {
        score,
        total: dealt.len() as i64,
        snapshot,
    }
}
