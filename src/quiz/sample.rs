// src/quiz/sample.rs

use rand::seq::SliceRandom;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
    #[error("test has no questions to sample from")]
    NoQuestionsAvailable,
}

/// Draws up to `requested` distinct question ids from the bank, uniformly and
/// in randomized order. A bank smaller than `requested` yields the whole bank
/// shuffled rather than an error; an empty bank is refused.
pub fn sample_question_ids(bank: &[i64], requested: usize) -> Result<Vec<i64>, SampleError> {
    if bank.is_empty() {
        return Err(SampleError::NoQuestionsAvailable);
    }

    let mut ids = bank.to_vec();
    ids.shuffle(&mut rand::thread_rng());
    ids.truncate(requested.min(ids.len()));
    Ok(ids)
}
