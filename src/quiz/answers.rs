// src/quiz/answers.rs

use std::collections::BTreeSet;
use thiserror::Error;

/// Errors produced while parsing an answer-index string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnswerSpecError {
    #[error("answer set is empty")]
    Empty,
    #[error("invalid option index '{0}', expected 1-4")]
    InvalidIndex(String),
}

/// A set of chosen option indices (1-4) in canonical form.
///
/// This is the one representation shared by the importer, the scorer and the
/// aggregator. Internally an ordered set; it only becomes the `;`-joined
/// string (`"1;3"`) at the storage boundary via [`AnswerSet::canonical`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnswerSet(BTreeSet<u8>);

impl AnswerSet {
    /// Parses a correct-answer string such as `"2"`, `"1;3"` or `"3, 1"`.
    ///
    /// Tokens are split on `;` or `,` and trimmed; every token must be
    /// exactly one of `1`-`4`. Duplicates collapse, order is ignored.
    pub fn parse(raw: &str) -> Result<Self, AnswerSpecError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AnswerSpecError::Empty);
        }

        let mut set = BTreeSet::new();
        for token in raw.split([';', ',']) {
            let token = token.trim();
            let idx = match token {
                "1" | "2" | "3" | "4" => token.as_bytes()[0] - b'0',
                _ => return Err(AnswerSpecError::InvalidIndex(token.to_string())),
            };
            set.insert(idx);
        }
        Ok(Self(set))
    }

    /// Builds a set from already-numeric indices (a trainee submission).
    /// An empty iterator yields an empty set, which is a legal
    /// "unanswered" value; out-of-range indices are rejected.
    pub fn from_indices<I>(indices: I) -> Result<Self, AnswerSpecError>
    where
        I: IntoIterator<Item = u8>,
    {
        let mut set = BTreeSet::new();
        for idx in indices {
            if !(1..=4).contains(&idx) {
                return Err(AnswerSpecError::InvalidIndex(idx.to_string()));
            }
            set.insert(idx);
        }
        Ok(Self(set))
    }

    /// Lenient variant for stored snapshots, where an empty string means
    /// "question left unanswered" rather than a malformed record.
    pub fn parse_snapshot(raw: &str) -> Result<Self, AnswerSpecError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::parse(raw)
    }

    /// The canonical storage form: ascending, deduplicated, `;`-joined.
    /// An empty set canonicalizes to the empty string.
    pub fn canonical(&self) -> String {
        self.0
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(";")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// A question is multiple-select iff more than one index is correct.
    pub fn is_multiple(&self) -> bool {
        self.0.len() > 1
    }
}
