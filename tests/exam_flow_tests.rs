// tests/exam_flow_tests.rs

use quizdeck::{config::Config, quiz::session::SessionStore, routes, state::AppState};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::HashMap;
use std::str::FromStr;

/// Helper function to spawn the app on a random port over a fresh in-memory
/// database. Returns the base URL and a handle to the same pool for seeding
/// and inspection.
async fn spawn_app() -> (String, SqlitePool) {
    // A single pooled connection keeps the in-memory database alive and
    // shared between the app and the test.
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        rust_log: "error".to_string(),
    };

    let state = AppState {
        pool: pool.clone(),
        config,
        sessions: SessionStore::new(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

/// Six single-choice questions, all with option 2 correct, so a full hand of
/// 5 can always be scored deterministically whatever the sampler picks.
const BANK: &str = "\
Q1,a,b,c,d,2
Q2,a,b,c,d,2
Q3,a,b,c,d,2
Q4,a,b,c,d,2
Q5,a,b,c,d,2
Q6,a,b,c,d,2
";

/// Creates a test and imports `rows` into its bank. Returns (id, test_code).
async fn seed_test(address: &str, client: &reqwest::Client, rows: &str) -> (i64, String) {
    let created: serde_json::Value = client
        .post(&format!("{}/api/tests", address))
        .json(&serde_json::json!({
            "name": "Safety induction",
            "duration_minutes": 10,
            "total_trainees": 5
        }))
        .send()
        .await
        .expect("Create test failed")
        .json()
        .await
        .expect("Failed to parse create json");

    let id = created["id"].as_i64().expect("id missing");
    let code = created["test_code"].as_str().expect("code missing").to_string();

    let response = client
        .post(&format!("{}/api/tests/{}/questions/import", address, id))
        .body(rows.to_string())
        .send()
        .await
        .expect("Import failed");
    assert_eq!(response.status().as_u16(), 201);

    (id, code)
}

async fn start_exam(
    address: &str,
    client: &reqwest::Client,
    code: &str,
) -> (String, Vec<i64>) {
    let body: serde_json::Value = client
        .post(&format!("{}/api/exam/{}/start", address, code))
        .send()
        .await
        .expect("Start failed")
        .json()
        .await
        .expect("Failed to parse start json");

    let token = body["session_token"].as_str().expect("token missing").to_string();
    let ids = body["questions"]
        .as_array()
        .expect("questions missing")
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect();

    (token, ids)
}

#[tokio::test]
async fn exam_landing_shows_test_info() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_id, code) = seed_test(&address, &client, BANK).await;

    // Act
    let response = client
        .get(&format!("{}/api/exam/{}", address, code))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Safety induction");
    assert_eq!(body["duration_minutes"], 10);
    assert_eq!(body["question_count"], 6);
}

#[tokio::test]
async fn landing_rejects_unknown_and_malformed_codes() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_id, code) = seed_test(&address, &client, BANK).await;
    let unknown = if code == "000000" { "000001" } else { "000000" };

    // Act: a well-formed code that matches nothing
    let response = client
        .get(&format!("{}/api/exam/{}", address, unknown))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "This Test ID does not exist. Please check with your trainer."
    );

    // Act: a malformed code reads the same as a missing one
    let response = client
        .get(&format!("{}/api/exam/12345", address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn start_deals_a_capped_hand_without_answers() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_id, code) = seed_test(&address, &client, BANK).await;

    // Act
    let response = client
        .post(&format!("{}/api/exam/{}/start", address, code))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["session_token"].as_str().unwrap().len(), 32);
    assert_eq!(body["allotted_seconds"], 600);

    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 5);
    for q in questions {
        let fields = q.as_object().unwrap();
        assert!(!fields.contains_key("correct"), "correct answers leaked");
        assert!(fields.contains_key("is_multiple"));
        assert!(fields.contains_key("option4"));
    }
}

#[tokio::test]
async fn start_on_an_empty_bank_conflicts() {
    // Arrange: a test with no questions imported
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let created: serde_json::Value = client
        .post(&format!("{}/api/tests", address))
        .json(&serde_json::json!({ "name": "Empty" }))
        .send()
        .await
        .expect("Create test failed")
        .json()
        .await
        .unwrap();
    let code = created["test_code"].as_str().unwrap();

    // Act
    let response = client
        .post(&format!("{}/api/exam/{}/start", address, code))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn full_exam_flow_scores_and_records_the_attempt() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (id, code) = seed_test(&address, &client, BANK).await;
    let (token, dealt) = start_exam(&address, &client, &code).await;

    let mut answers = HashMap::new();
    for question_id in &dealt {
        answers.insert(question_id.to_string(), vec![2]);
    }

    // Act
    let response = client
        .post(&format!("{}/api/exam/{}/submit", address, code))
        .json(&serde_json::json!({
            "session_token": token,
            "answers": answers,
            "trainee_name": "  Alice  "
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert: scored in full
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["score"], 5);
    assert_eq!(body["total"], 5);

    // Assert: one result row with a parseable snapshot and a trimmed name
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM results WHERE test_id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let (score, name, raw): (i64, Option<String>, String) =
        sqlx::query_as("SELECT score, trainee_name, raw_answers FROM results WHERE test_id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(score, 5);
    assert_eq!(name.as_deref(), Some("Alice"));

    let snapshot: HashMap<i64, String> = serde_json::from_str(&raw).unwrap();
    assert_eq!(snapshot.len(), 5);
    assert!(snapshot.values().all(|v| v == "2"));
}

#[tokio::test]
async fn unanswered_questions_count_against_the_score() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (id, code) = seed_test(&address, &client, BANK).await;
    let (token, dealt) = start_exam(&address, &client, &code).await;

    // Answer only the first two dealt questions
    let mut answers = HashMap::new();
    for question_id in dealt.iter().take(2) {
        answers.insert(question_id.to_string(), vec![2]);
    }

    // Act
    let body: serde_json::Value = client
        .post(&format!("{}/api/exam/{}/submit", address, code))
        .json(&serde_json::json!({ "session_token": token, "answers": answers }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(body["score"], 2);
    assert_eq!(body["total"], 5);

    // The snapshot still covers the whole dealt hand, with empties
    let raw: String = sqlx::query_scalar("SELECT raw_answers FROM results WHERE test_id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let snapshot: HashMap<i64, String> = serde_json::from_str(&raw).unwrap();
    assert_eq!(snapshot.len(), 5);
    assert_eq!(snapshot.values().filter(|v| v.is_empty()).count(), 3);
}

#[tokio::test]
async fn multi_select_scoring_ignores_submission_order() {
    // Arrange: every question expects options 1 and 3
    let bank = "\
M1,a,b,c,d,1;3
M2,a,b,c,d,1;3
M3,a,b,c,d,1;3
M4,a,b,c,d,1;3
M5,a,b,c,d,1;3
M6,a,b,c,d,1;3
";
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_id, code) = seed_test(&address, &client, bank).await;
    let (token, dealt) = start_exam(&address, &client, &code).await;

    let mut answers = HashMap::new();
    for question_id in &dealt {
        answers.insert(question_id.to_string(), vec![3, 1]);
    }

    // Act
    let body: serde_json::Value = client
        .post(&format!("{}/api/exam/{}/submit", address, code))
        .json(&serde_json::json!({ "session_token": token, "answers": answers }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(body["score"], 5);
    assert_eq!(body["total"], 5);
}

#[tokio::test]
async fn a_session_token_only_scores_once() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_id, code) = seed_test(&address, &client, BANK).await;
    let (token, dealt) = start_exam(&address, &client, &code).await;

    let mut answers = HashMap::new();
    for question_id in &dealt {
        answers.insert(question_id.to_string(), vec![2]);
    }
    let payload = serde_json::json!({ "session_token": token, "answers": answers });

    // Act
    let first = client
        .post(&format!("{}/api/exam/{}/submit", address, code))
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request");
    let second = client
        .post(&format!("{}/api/exam/{}/submit", address, code))
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(first.status().as_u16(), 200);
    assert_eq!(second.status().as_u16(), 410);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["error"], "No active exam session. Please restart the test.");
}

#[tokio::test]
async fn starting_again_deals_an_independent_session() {
    // Arrange: two starts on the same test, as two concurrent trainees
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (id, code) = seed_test(&address, &client, BANK).await;
    let (token_a, dealt_a) = start_exam(&address, &client, &code).await;
    let (token_b, dealt_b) = start_exam(&address, &client, &code).await;

    assert_ne!(token_a, token_b);

    // Act: each session submits its own dealt hand
    for (token, dealt) in [(token_a, dealt_a), (token_b, dealt_b)] {
        let mut answers = HashMap::new();
        for question_id in &dealt {
            answers.insert(question_id.to_string(), vec![2]);
        }
        let response = client
            .post(&format!("{}/api/exam/{}/submit", address, code))
            .json(&serde_json::json!({ "session_token": token, "answers": answers }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);
    }

    // Assert: both attempts are recorded
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM results WHERE test_id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn a_token_is_refused_for_another_test() {
    // Arrange: two tests, session opened on the first
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_id_a, code_a) = seed_test(&address, &client, BANK).await;
    let (_id_b, code_b) = seed_test(&address, &client, BANK).await;
    let (token, dealt) = start_exam(&address, &client, &code_a).await;

    let mut answers = HashMap::new();
    for question_id in &dealt {
        answers.insert(question_id.to_string(), vec![2]);
    }
    let payload = serde_json::json!({ "session_token": token, "answers": answers });

    // Act: submit against the wrong test, then the right one
    let wrong = client
        .post(&format!("{}/api/exam/{}/submit", address, code_b))
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request");
    let right = client
        .post(&format!("{}/api/exam/{}/submit", address, code_a))
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request");

    // Assert: the mismatch is refused without voiding the session
    assert_eq!(wrong.status().as_u16(), 410);
    assert_eq!(right.status().as_u16(), 200);
}

#[tokio::test]
async fn invalid_answer_indices_do_not_burn_the_session() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_id, code) = seed_test(&address, &client, BANK).await;
    let (token, dealt) = start_exam(&address, &client, &code).await;

    // Act: option 5 does not exist
    let mut bad_answers = HashMap::new();
    bad_answers.insert(dealt[0].to_string(), vec![5]);
    let bad = client
        .post(&format!("{}/api/exam/{}/submit", address, code))
        .json(&serde_json::json!({
            "session_token": token,
            "answers": bad_answers
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert, then resubmit with the same token
    assert_eq!(bad.status().as_u16(), 400);

    let mut answers = HashMap::new();
    for question_id in &dealt {
        answers.insert(question_id.to_string(), vec![2]);
    }
    let good = client
        .post(&format!("{}/api/exam/{}/submit", address, code))
        .json(&serde_json::json!({ "session_token": token, "answers": answers }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(good.status().as_u16(), 200);
}

#[tokio::test]
async fn an_unknown_token_is_gone() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_id, code) = seed_test(&address, &client, BANK).await;

    // Act
    let response = client
        .post(&format!("{}/api/exam/{}/submit", address, code))
        .json(&serde_json::json!({
            "session_token": "0123456789abcdefghijklmnopqrstuv",
            "answers": {}
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 410);
}
