// src/quiz/aggregate.rs

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::question::Question;
use crate::models::result::TestResult;
use crate::models::test::Test;
use crate::quiz::answers::AnswerSet;

/// Expected headcount versus how many attempts actually came in.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ParticipationStats {
    pub total_trainees: i64,
    pub participants: i64,
    pub non_participants: i64,
}

/// How one bank question fared across all attempts. Answers are re-graded
/// against the question's current correct set, so editing a question after
/// the fact is reflected here.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct QuestionStat {
    pub question_id: i64,
    pub question_text: String,
    pub attempts: i64,
    pub correct: i64,
    pub wrong: i64,
}

/// Attempt counts bucketed by percentage score. The buckets are exclusive
/// and cover the whole range, so every attempt lands in exactly one.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct ScoreDistribution {
    #[serde(rename = "100%")]
    pub full: i64,
    #[serde(rename = "[75,100)")]
    pub high: i64,
    #[serde(rename = "[50,75)")]
    pub mid: i64,
    #[serde(rename = "[0,50)")]
    pub low: i64,
}

#[derive(Debug, Serialize)]
pub struct TestAnalytics {
    pub test_id: i64,
    pub test_name: String,
    pub participation: ParticipationStats,
    pub questions: Vec<QuestionStat>,
    pub score_distribution: ScoreDistribution,
}

/// Rolls a test's stored results up into the trainer dashboard figures.
///
/// Results with an unreadable answer snapshot still count toward
/// participation and the score distribution (their score and total columns
/// are intact), but are left out of the per-question tallies.
pub fn aggregate(test: &Test, questions: &[Question], results: &[TestResult]) -> TestAnalytics {
    let mut snapshots: Vec<BTreeMap<i64, AnswerSet>> = Vec::with_capacity(results.len());
    for result in results {
        match parse_snapshot_row(&result.raw_answers) {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(reason) => {
                tracing::warn!(
                    result_id = result.id,
                    %reason,
                    "skipping unreadable answer snapshot in analytics"
                );
            }
        }
    }

    let question_stats = questions
        .iter()
        .map(|q| {
            let correct_set = match AnswerSet::parse(&q.correct) {
                Ok(set) => Some(set),
                Err(err) => {
                    tracing::warn!(
                        question_id = q.id,
                        %err,
                        "question has an unreadable correct set, counting all answers as wrong"
                    );
                    None
                }
            };

            let mut attempts = 0;
            let mut correct = 0;
            for snapshot in &snapshots {
                // absent id: the question was not dealt to that trainee;
                // empty set: dealt but left unanswered
                let Some(answer) = snapshot.get(&q.id) else {
                    continue;
                };
                if answer.is_empty() {
                    continue;
                }
                attempts += 1;
                if correct_set.as_ref() == Some(answer) {
                    correct += 1;
                }
            }

            QuestionStat {
                question_id: q.id,
                question_text: q.question_text.clone(),
                attempts,
                correct,
                wrong: attempts - correct,
            }
        })
        .collect();

    let mut distribution = ScoreDistribution::default();
    for result in results {
        let pct = result.score as f64 * 100.0 / result.total.max(1) as f64;
        if pct >= 100.0 - 1e-9 {
            distribution.full += 1;
        } else if pct >= 75.0 {
            distribution.high += 1;
        } else if pct >= 50.0 {
            distribution.mid += 1;
        } else {
            distribution.low += 1;
        }
    }

    let participants = results.len() as i64;
    TestAnalytics {
        test_id: test.id,
        test_name: test.name.clone(),
        participation: ParticipationStats {
            total_trainees: test.total_trainees,
            participants,
            non_participants: (test.total_trainees - participants).max(0),
        },
        questions: question_stats,
        score_distribution: distribution,
    }
}

fn parse_snapshot_row(raw: &str) -> Result<BTreeMap<i64, AnswerSet>, String> {
    let parsed: BTreeMap<i64, String> = serde_json::from_str(raw).map_err(|e| e.to_string())?;

    let mut snapshot = BTreeMap::new();
    for (question_id, value) in parsed {
        match AnswerSet::parse_snapshot(&value) {
            Ok(set) => {
                snapshot.insert(question_id, set);
            }
            // one garbled entry reads as "no answer", the rest of the
            // snapshot still counts
            Err(err) => {
                tracing::warn!(question_id, %err, "skipping malformed answer entry in analytics");
            }
        }
    }
    Ok(snapshot)
}
