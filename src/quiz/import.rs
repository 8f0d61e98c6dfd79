// src/quiz/import.rs

use thiserror::Error;

use crate::quiz::answers::{AnswerSet, AnswerSpecError};
use crate::utils::html::clean_html;

/// One validated question bank row, ready for batch insertion.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question_text: String,
    pub options: [String; 4],
    pub correct: AnswerSet,
}

impl NewQuestion {
    pub fn is_multiple(&self) -> bool {
        self.correct.is_multiple()
    }
}

/// Why an uploaded question bank was rejected. The row number refers to the
/// record's position in the uploaded file, header included, so trainers can
/// find the offending line in their spreadsheet.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("row {row}: expected 6 fields (question, 4 options, correct answers), found {found}")]
    MalformedRow { row: usize, found: usize },
    #[error("row {row}: {field} is empty")]
    EmptyField { row: usize, field: &'static str },
    #[error("row {row}: correct answer column is empty")]
    EmptyCorrectSpec { row: usize },
    #[error("row {row}: invalid correct answer index '{token}', expected 1-4")]
    InvalidCorrectIndex { row: usize, token: String },
}

const FIELD_LABELS: [&str; 5] = [
    "question text",
    "option 1",
    "option 2",
    "option 3",
    "option 4",
];

/// Parses and validates a whole question bank upload.
///
/// Expected format: CSV rows of `question,option1,option2,option3,option4,correct`
/// where `correct` holds indices 1-4 joined by `;` or `,`. An optional header
/// row whose first cell equals "question" (case-insensitive) is skipped, and
/// fields beyond the sixth are ignored.
///
/// Every row is validated before anything is written; the first bad row
/// rejects the whole upload so a trainer never ends up with half a bank.
pub fn parse_question_bank(raw: &str) -> Result<Vec<NewQuestion>, ImportError> {
    let mut questions = Vec::new();

    for (idx, record) in read_records(raw).into_iter().enumerate() {
        let row = idx + 1;

        if idx == 0 {
            let is_header = record
                .first()
                .is_some_and(|f| f.trim().eq_ignore_ascii_case("question"));
            if is_header {
                continue;
            }
        }

        if record.len() < 6 {
            return Err(ImportError::MalformedRow {
                row,
                found: record.len(),
            });
        }

        let question_text = sanitize_required(&record[0], row, FIELD_LABELS[0])?;
        let options = [
            sanitize_required(&record[1], row, FIELD_LABELS[1])?,
            sanitize_required(&record[2], row, FIELD_LABELS[2])?,
            sanitize_required(&record[3], row, FIELD_LABELS[3])?,
            sanitize_required(&record[4], row, FIELD_LABELS[4])?,
        ];

        let correct = match AnswerSet::parse(&record[5]) {
            Ok(set) => set,
            Err(AnswerSpecError::Empty) => return Err(ImportError::EmptyCorrectSpec { row }),
            Err(AnswerSpecError::InvalidIndex(token)) => {
                return Err(ImportError::InvalidCorrectIndex { row, token });
            }
        };

        questions.push(NewQuestion {
            question_text,
            options,
            correct,
        });
    }

    Ok(questions)
}

/// Trims and sanitizes a text field, rejecting it when nothing is left.
/// Sanitization runs first so a field that is only markup counts as empty.
fn sanitize_required(raw: &str, row: usize, field: &'static str) -> Result<String, ImportError> {
    let cleaned = clean_html(raw.trim());
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(ImportError::EmptyField { row, field });
    }
    Ok(cleaned.to_string())
}

/// Splits raw CSV text into records of fields.
///
/// Handles double-quoted fields (embedded commas, newlines, `""` escapes),
/// both LF and CRLF row endings, and whitespace between a comma and an
/// opening quote. Blank lines yield no record.
fn read_records(input: &str) -> Vec<Vec<String>> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                // "" inside a quoted field is a literal quote
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                end_record(&mut records, &mut record, &mut field);
            }
            '\n' => end_record(&mut records, &mut record, &mut field),
            _ => field.push(c),
        }
    }
    end_record(&mut records, &mut record, &mut field);

    records
}

fn end_record(records: &mut Vec<Vec<String>>, record: &mut Vec<String>, field: &mut String) {
    if record.is_empty() && field.trim().is_empty() {
        // blank line
        field.clear();
        return;
    }
    record.push(std::mem::take(field));
    records.push(std::mem::take(record));
}
