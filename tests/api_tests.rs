// tests/api_tests.rs

use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use quizboard::{
    config::Config,
    routes,
    state::AppState,
    store::{DataStore, Document, MemoryStore, OrderedQuery, QUESTIONS, QUIZ_RESULTS, StoreError},
    utils::jwt::{ROLE_ADMIN, ROLE_USER, sign_jwt},
};
use async_trait::async_trait;
use serde_json::{Map, Value, json};

const SECRET: &str = "test_secret_for_integration_tests";

struct TestApp {
    address: String,
    store: Arc<MemoryStore>,
    client: reqwest::Client,
}

impl TestApp {
    fn token(&self, user_id: &str, role: &str) -> String {
        sign_jwt(user_id, role, SECRET, 600).expect("Failed to sign token")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn seed_question(&self, text: &str, category: &str, correct: &str) -> String {
        let data = json!({
            "questionText": text,
            "answerA": correct,
            "answerB": "wrong 1",
            "answerC": "wrong 2",
            "answerD": "wrong 3",
            "correctAnswer": correct,
            "category": category,
        });
        let Value::Object(map) = data else {
            unreachable!()
        };
        self.store.add(QUESTIONS, map).await.unwrap()
    }

    async fn seed_result(&self, data: Value) -> String {
        let Value::Object(map) = data else {
            unreachable!()
        };
        self.store.add(QUIZ_RESULTS, map).await.unwrap()
    }

    async fn submit(&self, user_id: &str, category: &str, answers: &HashMap<String, String>) -> Value {
        let response = self
            .client
            .post(self.url("/api/quiz/submit"))
            .bearer_auth(self.token(user_id, ROLE_USER))
            .json(&json!({ "category": category, "answers": answers }))
            .send()
            .await
            .expect("Submit failed");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }
}

fn test_config() -> Config {
    Config {
        database_url: None,
        jwt_secret: SECRET.to_string(),
        rust_log: "error".to_string(),
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        log_dir: "logs".to_string(),
    }
}

/// Serves the router on a random port and returns its base address.
async fn serve(state: AppState) -> String {
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

/// Helper function to spawn the app on a random port for testing.
async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());

    let state = AppState {
        store: store.clone(),
        config: test_config(),
    };

    TestApp {
        address: serve(state).await,
        store,
        client: reqwest::Client::new(),
    }
}

/// A store whose backend is always down.
struct UnavailableStore;

#[async_trait]
impl DataStore for UnavailableStore {
    async fn fetch_all(&self, _collection: &str) -> Result<Vec<Document>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn fetch_by_field(
        &self,
        _collection: &str,
        _field: &str,
        _value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn fetch_ordered(
        &self,
        _collection: &str,
        _query: &OrderedQuery,
    ) -> Result<Vec<Document>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn get(&self, _collection: &str, _id: &str) -> Result<Option<Document>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn add(&self, _collection: &str, _data: Map<String, Value>) -> Result<String, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn set(&self, _collection: &str, _id: &str, _data: Map<String, Value>) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn delete(&self, _collection: &str, _id: &str) -> Result<bool, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }
}

#[tokio::test]
async fn health_check_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn categories_are_public() {
    let app = spawn_app().await;

    let categories: Vec<String> = app
        .client
        .get(app.url("/api/categories"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(categories.len(), 9);
    assert!(categories.contains(&"Video Games".to_string()));
}

#[tokio::test]
async fn protected_routes_require_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/quiz/history"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .client
        .get(app.url("/api/quiz/history"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .client
        .get(app.url("/api/admin/questions"))
        .bearer_auth(app.token("u1", ROLE_USER))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn session_hides_answers_and_caps_length() {
    let app = spawn_app().await;
    for i in 0..25 {
        app.seed_question(&format!("Art question {}", i), "Art", "yes")
            .await;
    }
    app.seed_question("Music question", "Music", "yes").await;

    let response = app
        .client
        .get(app.url("/api/quiz/Art/questions"))
        .bearer_auth(app.token("u1", ROLE_USER))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let questions: Vec<Value> = response.json().await.unwrap();
    assert_eq!(questions.len(), 20);
    for q in &questions {
        assert_eq!(q["category"], "Art");
        assert!(q.get("correctAnswer").is_none());
        assert_eq!(q["options"].as_array().unwrap().len(), 4);
    }

    let response = app
        .client
        .get(app.url("/api/quiz/History/questions"))
        .bearer_auth(app.token("u1", ROLE_USER))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn submit_records_attempt_and_feeds_boards() {
    let app = spawn_app().await;
    let q1 = app.seed_question("Who painted the Mona Lisa?", "Art", "Leonardo").await;
    let q2 = app.seed_question("Starry Night painter?", "Art", "Van Gogh").await;

    let answers: HashMap<String, String> = [
        (q1.clone(), "Leonardo".to_string()),
        (q2.clone(), "wrong 1".to_string()),
    ]
    .into_iter()
    .collect();
    let result = app.submit("u1", "Art", &answers).await;
    assert_eq!(result["score"], 1);
    assert_eq!(result["correctCount"], 1);
    assert_eq!(result["incorrectCount"], 1);
    assert_eq!(result["totalQuestions"], 2);

    let all_right: HashMap<String, String> = [
        (q1.clone(), "Leonardo".to_string()),
        (q2.clone(), "Van Gogh".to_string()),
    ]
    .into_iter()
    .collect();
    app.submit("u2", "Art", &all_right).await;
    app.submit("u1", "Art", &all_right).await;

    // History: newest first, only the caller's attempts.
    let history: Vec<Value> = app
        .client
        .get(app.url("/api/quiz/history"))
        .bearer_auth(app.token("u1", ROLE_USER))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|h| h["userId"] == "u1"));
    let stamp = |v: &Value| {
        chrono::DateTime::parse_from_rfc3339(v["timestamp"].as_str().unwrap()).unwrap()
    };
    assert!(stamp(&history[0]) >= stamp(&history[1]));

    // Top scores per category.
    let top: Vec<Value> = app
        .client
        .get(app.url("/api/quiz/Art/top-scores"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let scores: Vec<i64> = top.iter().map(|t| t["score"].as_i64().unwrap()).collect();
    assert_eq!(scores, vec![2, 2, 1]);
    assert_eq!(top[0]["totalQuestions"], 2);

    // Leaderboard: u1 has 3 points, u2 has 2; neither has a profile name.
    let board: Vec<Value> = app
        .client
        .get(app.url("/api/leaderboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0]["userId"], "u1");
    assert_eq!(board[0]["totalScore"], 3);
    assert_eq!(board[0]["displayName"], "Unknown");
    assert_eq!(board[1]["userId"], "u2");
}

#[tokio::test]
async fn submit_rejects_empty_and_oversized_sessions() {
    let app = spawn_app().await;
    let token = app.token("u1", ROLE_USER);

    let response = app
        .client
        .post(app.url("/api/quiz/submit"))
        .bearer_auth(&token)
        .json(&json!({ "category": "Art", "answers": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let too_many: HashMap<String, String> =
        (0..21).map(|i| (format!("q{}", i), "A".to_string())).collect();
    let response = app
        .client
        .post(app.url("/api/quiz/submit"))
        .bearer_auth(&token)
        .json(&json!({ "category": "Art", "answers": too_many }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    assert!(app.store.fetch_all(QUIZ_RESULTS).await.unwrap().is_empty());
}

#[tokio::test]
async fn leaderboard_uses_profile_names() {
    let app = spawn_app().await;
    let q = app.seed_question("2 + 2?", "IT", "4").await;

    let response = app
        .client
        .put(app.url("/api/profile"))
        .bearer_auth(app.token("u7", ROLE_USER))
        .json(&json!({ "name": "Ada", "email": "ada@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let answers: HashMap<String, String> = [(q, "4".to_string())].into_iter().collect();
    app.submit("u7", "IT", &answers).await;

    let board: Vec<Value> = app
        .client
        .get(app.url("/api/leaderboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(board[0]["displayName"], "Ada");
    assert_eq!(board[0]["totalScore"], 1);
}

#[tokio::test]
async fn profile_round_trip_and_validation() {
    let app = spawn_app().await;
    let token = app.token("u3", ROLE_USER);

    let response = app
        .client
        .get(app.url("/api/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = app
        .client
        .put(app.url("/api/profile"))
        .bearer_auth(&token)
        .json(&json!({ "email": "not-an-email" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = app
        .client
        .put(app.url("/api/profile"))
        .bearer_auth(&token)
        .json(&json!({ "dateOfBirth": "22/05/2023" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    app.client
        .put(app.url("/api/profile"))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Grace",
            "dateOfBirth": "1906-12-09",
            "interests": ["History", "IT"],
        }))
        .send()
        .await
        .unwrap();

    let profile: Value = app
        .client
        .get(app.url("/api/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["id"], "u3");
    assert_eq!(profile["name"], "Grace");
    assert_eq!(profile["dateOfBirth"], "1906-12-09");
    assert_eq!(profile["registeredUser"], true);
}

#[tokio::test]
async fn admin_manages_questions() {
    let app = spawn_app().await;
    let token = app.token("admin", ROLE_ADMIN);

    let question = json!({
        "questionText": "Largest planet?",
        "answerA": "Jupiter",
        "answerB": "Mars",
        "answerC": "Venus",
        "answerD": "Earth",
        "correctAnswer": "Jupiter",
        "category": "Travel",
    });

    let response = app
        .client
        .post(app.url("/api/admin/questions"))
        .bearer_auth(&token)
        .json(&question)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let id = response.json::<Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let mut blank = question.clone();
    blank["answerB"] = json!("   ");
    let response = app
        .client
        .post(app.url("/api/admin/questions"))
        .bearer_auth(&token)
        .json(&blank)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let mut updated = question.clone();
    updated["category"] = json!("geography");
    let response = app
        .client
        .put(app.url(&format!("/api/admin/questions/{}", id)))
        .bearer_auth(&token)
        .json(&updated)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let fetched: Value = app
        .client
        .get(app.url(&format!("/api/admin/questions/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["category"], "Geography");
    assert_eq!(fetched["correctAnswer"], "Jupiter");

    let response = app
        .client
        .delete(app.url(&format!("/api/admin/questions/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .client
        .delete(app.url(&format!("/api/admin/questions/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn cleanup_removes_duplicates_and_invalid_results() {
    let app = spawn_app().await;
    app.seed_question("Q1", "Animals", "c1").await;
    app.seed_question(" Q1 ", "Animals", " c1 ").await;
    app.seed_question("Q2", "Animals", "c1").await;

    for total in [20, 21, 40] {
        let Value::Object(map) = json!({
            "userId": "u1",
            "category": "Animals",
            "score": 5,
            "totalQuestions": total,
            "timestamp": 1_700_000_000_000i64,
        }) else {
            unreachable!()
        };
        app.store.add(QUIZ_RESULTS, map).await.unwrap();
    }
    // Unreadable as an attempt, but still over the session cap.
    app.seed_result(json!({ "category": "Animals", "score": 3, "totalQuestions": 25 }))
        .await;

    let report: Value = app
        .client
        .post(app.url("/api/admin/maintenance/cleanup"))
        .bearer_auth(app.token("admin", ROLE_ADMIN))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(report["questionsScanned"], 3);
    assert_eq!(report["duplicateQuestionsRemoved"], 1);
    assert_eq!(report["resultsScanned"], 4);
    assert_eq!(report["invalidResultsRemoved"], 3);
    assert_eq!(report["errors"].as_array().unwrap().len(), 0);

    assert_eq!(app.store.fetch_all(QUESTIONS).await.unwrap().len(), 2);
    assert_eq!(app.store.fetch_all(QUIZ_RESULTS).await.unwrap().len(), 1);
}

#[tokio::test]
async fn categories_resolve_case_insensitively() {
    let app = spawn_app().await;
    let q = app.seed_question("Who painted Guernica?", "Art", "Picasso").await;
    let token = app.token("u1", ROLE_USER);

    let questions: Vec<Value> = app
        .client
        .get(app.url("/api/quiz/art/questions"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(questions.len(), 1);

    let answers: HashMap<String, String> = [(q, "Picasso".to_string())].into_iter().collect();
    let result = app.submit("u1", " art ", &answers).await;
    assert_eq!(result["category"], "Art");
    assert_eq!(result["score"], 1);

    let top: Vec<Value> = app
        .client
        .get(app.url("/api/quiz/ART/top-scores"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(top.len(), 1);
}

#[tokio::test]
async fn unknown_category_is_rejected() {
    let app = spawn_app().await;
    let token = app.token("u1", ROLE_USER);

    let response = app
        .client
        .get(app.url("/api/quiz/Nonsense/top-scores"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid category");

    let response = app
        .client
        .get(app.url("/api/quiz/Nonsense/questions"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = app
        .client
        .post(app.url("/api/quiz/submit"))
        .bearer_auth(&token)
        .json(&json!({ "category": "Nonsense", "answers": { "q1": "A" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    assert!(app.store.fetch_all(QUIZ_RESULTS).await.unwrap().is_empty());

    let response = app
        .client
        .post(app.url("/api/admin/questions"))
        .bearer_auth(app.token("admin", ROLE_ADMIN))
        .json(&json!({
            "questionText": "Q",
            "answerA": "a",
            "answerB": "b",
            "answerC": "c",
            "answerD": "d",
            "correctAnswer": "a",
            "category": "Nonsense",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    assert!(app.store.fetch_all(QUESTIONS).await.unwrap().is_empty());
}

#[tokio::test]
async fn history_is_newest_first() {
    let app = spawn_app().await;
    for (user, score, millis) in [
        ("u1", 1, 1_700_000_001_000i64),
        ("u1", 3, 1_700_000_003_000),
        ("u2", 9, 1_700_000_009_000),
        ("u1", 2, 1_700_000_002_000),
    ] {
        app.seed_result(json!({
            "userId": user,
            "category": "Music",
            "score": score,
            "totalQuestions": 5,
            "timestamp": millis,
        }))
        .await;
    }

    let history: Vec<Value> = app
        .client
        .get(app.url("/api/quiz/history"))
        .bearer_auth(app.token("u1", ROLE_USER))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let millis: Vec<i64> = history
        .iter()
        .map(|h| {
            chrono::DateTime::parse_from_rfc3339(h["timestamp"].as_str().unwrap())
                .unwrap()
                .timestamp_millis()
        })
        .collect();
    assert_eq!(
        millis,
        vec![1_700_000_003_000, 1_700_000_002_000, 1_700_000_001_000]
    );
    let scores: Vec<i64> = history.iter().map(|h| h["score"].as_i64().unwrap()).collect();
    assert_eq!(scores, vec![3, 2, 1]);
}

#[tokio::test]
async fn store_outage_is_service_unavailable() {
    let address = serve(AppState {
        store: Arc::new(UnavailableStore),
        config: test_config(),
    })
    .await;
    let client = reqwest::Client::new();
    let token = sign_jwt("admin", ROLE_ADMIN, SECRET, 600).unwrap();

    let question = json!({
        "questionText": "Largest planet?",
        "answerA": "Jupiter",
        "answerB": "Mars",
        "answerC": "Venus",
        "answerD": "Earth",
        "correctAnswer": "Jupiter",
        "category": "Travel",
    });

    let response = client
        .post(format!("{}/api/admin/questions", address))
        .bearer_auth(&token)
        .json(&question)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 503);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Error saving question");

    let response = client
        .put(format!("{}/api/admin/questions/q1", address))
        .bearer_auth(&token)
        .json(&question)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 503);

    let response = client
        .delete(format!("{}/api/admin/questions/q1", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 503);

    let response = client
        .get(format!("{}/api/leaderboard", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 503);
}
