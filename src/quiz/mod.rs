// src/quiz/mod.rs

//! The exam engine proper: question bank import, random sampling, in-flight
//! session tracking, grading, and result aggregation. Everything here is
//! storage-agnostic; handlers wire it to the database.

pub mod aggregate;
pub mod answers;
pub mod import;
pub mod sample;
pub mod score;
pub mod session;
