// tests/session_api_tests.rs

use std::sync::Arc;

use quizmaster::{
    config::Config,
    models::quiz::{AnswerValue, Question, Quiz},
    routes,
    services::memory::{InMemoryAttemptLog, InMemoryCatalog},
    state::AppState,
    utils::jwt::sign_jwt,
};
use serde_json::{Value, json};

const SECRET: &str = "test_secret_for_integration_tests";

fn sample_quizzes() -> Vec<Quiz> {
    let capitals = Quiz {
        id: 1,
        title: "Capitals".to_string(),
        description: Some("World capitals".to_string()),
        category: "Geography".to_string(),
        difficulty: "Easy".to_string(),
        time_limit: 300,
        questions: vec![
            Question {
                id: 1,
                question_text: "Capital of France?".to_string(),
                question_type: "multiple_choice".to_string(),
                options: Some(vec!["Paris".to_string(), "Lyon".to_string()]),
                correct_answer: AnswerValue::Choice(0),
            },
            Question {
                id: 2,
                question_text: "Capital of Japan?".to_string(),
                question_type: "text".to_string(),
                options: None,
                correct_answer: AnswerValue::Text("Tokyo".to_string()),
            },
        ],
    };
    let empty = Quiz {
        id: 2,
        title: "Draft".to_string(),
        description: None,
        category: "History".to_string(),
        difficulty: "Hard".to_string(),
        time_limit: 60,
        questions: vec![],
    };
    vec![capitals, empty]
}

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let quizzes = sample_quizzes();
    let attempt_log = Arc::new(InMemoryAttemptLog::new(&quizzes));
    let catalog = Arc::new(InMemoryCatalog::new(quizzes));

    let config = Config {
        api_base_url: "http://127.0.0.1:1/".to_string(),
        jwt_secret: SECRET.to_string(),
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        allowed_origins: vec!["http://localhost:3000".to_string()],
    };

    let state = AppState::new(config, catalog, attempt_log);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn token(user: &str) -> String {
    sign_jwt(user, SECRET, 600).unwrap()
}

async fn open_session(client: &reqwest::Client, address: &str, token: &str, quiz_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/api/sessions", address))
        .bearer_auth(token)
        .json(&json!({ "quiz_id": quiz_id }))
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
async fn sessions_require_a_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/sessions", address))
        .json(&json!({ "quiz_id": 1 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 401);

    let response = open_session(&client, &address, "not-a-jwt", 1).await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn full_attempt_flow() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = token("alice");

    // 1. Open
    let response = open_session(&client, &address, &token, 1).await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    let id = body["session_id"].as_str().unwrap().to_string();
    assert_eq!(body["session"]["phase"], "not_started");
    assert_eq!(body["session"]["clock"], "05:00");
    assert!(body["session"]["question"].get("correct_answer").is_none());

    let url = format!("{}/api/sessions/{}", address, id);

    // 2. Answering before start conflicts
    let response = client
        .post(format!("{}/answers", url))
        .bearer_auth(&token)
        .json(&json!({ "question_id": 1, "answer": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // 3. Start, answer, move on, answer
    let response = client.post(format!("{}/start", url)).bearer_auth(&token).send().await.unwrap();
    let view: Value = response.json().await.unwrap();
    assert_eq!(view["phase"], "running");

    client
        .post(format!("{}/answers", url))
        .bearer_auth(&token)
        .json(&json!({ "question_id": 1, "answer": 0 }))
        .send()
        .await
        .unwrap();

    let response = client.post(format!("{}/next", url)).bearer_auth(&token).send().await.unwrap();
    let view: Value = response.json().await.unwrap();
    assert_eq!(view["current_index"], 1);
    assert_eq!(view["is_last_question"], true);

    let response = client
        .post(format!("{}/answers", url))
        .bearer_auth(&token)
        .json(&json!({ "question_id": 2, "answer": "tokyo" }))
        .send()
        .await
        .unwrap();
    let view: Value = response.json().await.unwrap();
    assert_eq!(view["answered"], 2);

    // 4. Submit: free text is case-sensitive
    let response = client.post(format!("{}/submit", url)).bearer_auth(&token).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let submission: Value = response.json().await.unwrap();
    assert_eq!(submission["result"]["total_questions"], 2);
    assert_eq!(submission["result"]["correct_answers"], 1);
    assert_eq!(submission["result"]["score"], 50);
    assert!(submission["warning"].is_null());

    // 5. Submitting again returns the same result
    let response = client.post(format!("{}/submit", url)).bearer_auth(&token).send().await.unwrap();
    let again: Value = response.json().await.unwrap();
    assert_eq!(again, submission);

    // 6. History and stats reflect exactly one attempt
    let history: Value = client
        .get(format!("{}/api/me/history", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["quiz_title"], "Capitals");

    let stats: Value = client
        .get(format!("{}/api/me/stats", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["quizzes_completed"], 1);
    assert_eq!(stats["categories_explored"], 1);

    let board: Value = client
        .get(format!("{}/api/leaderboard", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(board[0]["username"], "alice");
    assert_eq!(board[0]["total_score"], 50);
}

#[tokio::test]
async fn sessions_are_private_to_their_owner() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let body: Value = open_session(&client, &address, &token("alice"), 1)
        .await
        .json()
        .await
        .unwrap();
    let url = format!("{}/api/sessions/{}", address, body["session_id"].as_str().unwrap());

    let response = client.get(&url).bearer_auth(token("mallory")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = client.delete(&url).bearer_auth(token("mallory")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = client.delete(&url).bearer_auth(token("alice")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = client.get(&url).bearer_auth(token("alice")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn unknown_and_empty_quizzes_are_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = token("alice");

    let response = open_session(&client, &address, &token, 404).await;
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("404"));

    let response = open_session(&client, &address, &token, 2).await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn quiz_listing_is_public_and_filterable() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let all: Value = client
        .get(format!("{}/api/quizzes", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().unwrap().len(), 2);

    let filtered: Value = client
        .get(format!("{}/api/quizzes?category=Geography&search=capital", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let filtered = filtered.as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["question_count"], 2);
}

#[tokio::test]
async fn bundle_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = token("alice");

    let mut bundle = json!({
        "quiz_data": {
            "title": "Imported",
            "description": "From a file",
            "category": "Science",
            "difficulty": "Easy",
            "time_limit": 120,
            "questions": [
                { "question_text": "2 + 2?", "options": ["3", "4"], "correct_answer": 1 }
            ]
        },
        "metadata": { "exported_by": "QuizMaster", "format_version": "1.0" }
    });

    let response = client
        .post(format!("{}/api/bundles/validate", address))
        .bearer_auth(&token)
        .json(&bundle)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let summary: Value = response.json().await.unwrap();
    assert_eq!(summary["question_count"], 1);

    bundle["quiz_data"]["questions"][0]["options"] = json!(["4"]);
    let response = client
        .post(format!("{}/api/bundles/validate", address))
        .bearer_auth(&token)
        .json(&bundle)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn categories_and_quiz_analytics_are_public() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let categories: Value = client
        .get(format!("{}/api/categories", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(categories, json!(["Geography", "History"]));

    // One scored attempt, then the quiz's analytics reflect it.
    let token = token("alice");
    let body: Value = open_session(&client, &address, &token, 1)
        .await
        .json()
        .await
        .unwrap();
    let url = format!("{}/api/sessions/{}", address, body["session_id"].as_str().unwrap());
    client.post(format!("{}/start", url)).bearer_auth(&token).send().await.unwrap();
    client
        .post(format!("{}/answers", url))
        .bearer_auth(&token)
        .json(&json!({ "question_id": 1, "answer": 0 }))
        .send()
        .await
        .unwrap();
    client.post(format!("{}/submit", url)).bearer_auth(&token).send().await.unwrap();

    let response = client
        .get(format!("{}/api/quizzes/1/analytics", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let analytics: Value = response.json().await.unwrap();
    assert_eq!(analytics["total_attempts"], 1);
    assert_eq!(analytics["average_score"], 50.0);
    assert_eq!(analytics["question_analytics"][0]["correct_rate"], 100.0);
    assert_eq!(analytics["question_analytics"][1]["correct_rate"], 0.0);

    let response = client
        .get(format!("{}/api/quizzes/99/analytics", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
