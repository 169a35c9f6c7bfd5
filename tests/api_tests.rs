// tests/api_tests.rs

use std::collections::HashMap;
use std::net::SocketAddr;

use inqura_backend::{config::Config, routes, state::AppState, utils::hash::hash_password};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345") and a pool for seeding.
async fn spawn_app() -> (String, PgPool) {
    // Note: For Postgres, you must have a running database.
    // We'll read from DATABASE_URL environment variable.
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    // 1. Create a pool
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    // 2. Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    // 3. Create test configuration and state
    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_email: None,
        admin_password: None,
        upload_dir: std::env::temp_dir()
            .join("inqura_test_uploads")
            .to_string_lossy()
            .to_string(),
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    // 4. Create the router with the app state
    let app = routes::create_router(state);

    // 5. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 6. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    (address, pool)
}

fn unique_email(prefix: &str) -> String {
    format!(
        "{}_{}@inqura.test",
        prefix,
        &uuid::Uuid::new_v4().to_string()[..8]
    )
}

/// Registers a user through the API and returns their token.
async fn register_and_login(address: &str, client: &reqwest::Client, email: &str) -> String {
    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Register failed");

    login(address, client, email, "password123").await
}

async fn login(address: &str, client: &reqwest::Client, email: &str, password: &str) -> String {
    let resp = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Login failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login json");

    resp["token"].as_str().expect("Token not found").to_string()
}

/// Seeds an admin user directly in the database and returns their token.
async fn seed_admin(address: &str, client: &reqwest::Client, pool: &PgPool) -> String {
    let email = unique_email("admin");
    let hash = hash_password("admin_pass_123").unwrap();

    sqlx::query("INSERT INTO users (email, password, role) VALUES ($1, $2, 'admin')")
        .bind(&email)
        .bind(&hash)
        .execute(pool)
        .await
        .unwrap();

    login(address, client, &email, "admin_pass_123").await
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_works() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "email": unique_email("student"),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn register_fails_validation() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Act: Send a malformed email
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "email": "not-an-email",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn register_duplicate_email_conflicts() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("dup");

    let first = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({"email": email, "password": "password123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({"email": email, "password": "password123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("wrongpw");

    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({"email": email, "password": "password123"}))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"email": email, "password": "wrong_password"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn materials_require_auth() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/materials", address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

/// Walks the whole platform: admin content setup, sequential unlocking,
/// adaptive tier ladder, transactional history, and the recap view.
#[tokio::test]
async fn full_platform_flow() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Start from clean content tables so lock positions are deterministic.
    sqlx::query("DELETE FROM attempt_history")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("DELETE FROM progress").execute(&pool).await.unwrap();
    sqlx::query("DELETE FROM questions").execute(&pool).await.unwrap();
    sqlx::query("DELETE FROM materials").execute(&pool).await.unwrap();

    let admin_token = seed_admin(&address, &client, &pool).await;

    // 1. Admin creates two sequential materials
    let m1_id = client
        .post(format!("{}/api/admin/materials", address))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "position": 0,
            "title": "Pengenalan Algoritma",
            "content_hard": "Materi level advanced",
            "content_medium": "Materi level intermediate",
            "content_easy": "Materi level dasar",
            "video_hard": "https://youtu.be/hard123"
        }))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let m2_id = client
        .post(format!("{}/api/admin/materials", address))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "position": 1,
            "title": "Struktur Data",
            "content_hard": "Pohon dan graf",
            "content_medium": "Linked list",
            "content_easy": "Array"
        }))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    // 2. Admin creates Hard questions for material 1
    let mut m1_answers: HashMap<i64, String> = HashMap::new();
    for (prompt, correct) in [("Apa itu algoritma?", "Urutan langkah"), ("Notasi big-O?", "O(n)")] {
        let resp = client
            .post(format!("{}/api/admin/questions", address))
            .bearer_auth(&admin_token)
            .json(&serde_json::json!({
                "material_id": m1_id,
                "question": prompt,
                "options": [correct, "Salah satu", "Salah dua", "Salah tiga"],
                "correct_answer": correct,
                "wrong_feedback": "Baca kembali bagian pertama.",
                "difficulty": "Hard"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201);

        let id = resp.json::<serde_json::Value>().await.unwrap()["id"]
            .as_i64()
            .unwrap();
        m1_answers.insert(id, correct.to_string());
    }

    // Material 2 only carries Medium-tagged questions: the Hard request
    // must fall back to the full bank.
    let mut m2_answers: HashMap<i64, String> = HashMap::new();
    for (prompt, correct) in [("Struktur LIFO?", "Stack"), ("Struktur FIFO?", "Queue")] {
        let id = client
            .post(format!("{}/api/admin/questions", address))
            .bearer_auth(&admin_token)
            .json(&serde_json::json!({
                "material_id": m2_id,
                "question": prompt,
                "options": [correct, "Heap", "Graph", "Trie"],
                "correct_answer": correct,
                "wrong_feedback": "Perhatikan urutan keluar-masuknya.",
                "difficulty": "Medium"
            }))
            .send()
            .await
            .unwrap()
            .json::<serde_json::Value>()
            .await
            .unwrap()["id"]
            .as_i64()
            .unwrap();
        m2_answers.insert(id, correct.to_string());
    }

    // 3. Student registers; dashboard shows material 2 locked
    let student_email = unique_email("student");
    let student_token = register_and_login(&address, &client, &student_email).await;

    let dashboard = client
        .get(format!("{}/api/materials", address))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json::<Vec<serde_json::Value>>()
        .await
        .unwrap();

    assert_eq!(dashboard.len(), 2);
    assert_eq!(dashboard[0]["locked"], false);
    assert_eq!(dashboard[1]["locked"], true);

    // Direct navigation cannot bypass the gate
    let locked = client
        .get(format!("{}/api/materials/{}", address, m2_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(locked.status().as_u16(), 403);

    // 4. First visit serves the Hard variant
    let view = client
        .get(format!("{}/api/materials/{}", address, m1_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(view["tier"], "Hard");
    assert_eq!(view["content"], "Materi level advanced");

    // 5. Practice set hides the answer key
    let paper = client
        .get(format!("{}/api/materials/{}/questions", address, m1_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(paper["tier"], "Hard");
    let questions = paper["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert!(questions[0].get("correct_answer").is_none());

    // 6. Mid-run check returns feedback for a wrong pick
    let some_question_id = questions[0]["id"].as_i64().unwrap();
    let check = client
        .post(format!("{}/api/questions/{}/check", address, some_question_id))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({"answer": "Salah satu bukan jawaban"}))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(check["correct"], false);
    assert!(check["wrong_feedback"].is_string());

    // 7. Perfect run on Hard: lulus, material 2 unlocks
    let result = client
        .post(format!("{}/api/materials/{}/submit", address, m1_id))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({"answers": m1_answers}))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();

    assert_eq!(result["score"], 100);
    assert_eq!(result["status"], "lulus");
    assert_eq!(result["correct_count"], 2);
    assert_eq!(result["total_questions"], 2);

    let dashboard = client
        .get(format!("{}/api/materials", address))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json::<Vec<serde_json::Value>>()
        .await
        .unwrap();
    assert_eq!(dashboard[1]["locked"], false);

    // 8. Material 2 at Hard tier falls back to its untagged-for-Hard bank
    let paper = client
        .get(format!("{}/api/materials/{}/questions", address, m2_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(paper["tier"], "Hard");
    assert_eq!(paper["questions"].as_array().unwrap().len(), 2);

    // 9. Failing the Hard run drops the student to Medium
    let wrong_answers: HashMap<i64, String> = m2_answers
        .keys()
        .map(|id| (*id, "Jawaban ngawur".to_string()))
        .collect();

    let result = client
        .post(format!("{}/api/materials/{}/submit", address, m2_id))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({"answers": wrong_answers}))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();

    assert_eq!(result["score"], 0);
    assert_eq!(result["status"], "mengulang");
    assert_eq!(result["next_tier"], "Medium");
    let feedback = result["feedback"].as_array().unwrap();
    assert!(feedback.iter().all(|f| f["correct"] == false));

    let view = client
        .get(format!("{}/api/materials/{}", address, m2_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(view["tier"], "Medium");
    assert_eq!(view["content"], "Linked list");

    // 10. Passing the Medium run climbs back to Hard without completing
    let result = client
        .post(format!("{}/api/materials/{}/submit", address, m2_id))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({"answers": m2_answers}))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();

    assert_eq!(result["score"], 100);
    assert_eq!(result["status"], "mengulang");
    assert_eq!(result["next_tier"], "Hard");

    // 11. Progress report: one row per material, latest state only
    let report = client
        .get(format!("{}/api/progress", address))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json::<Vec<serde_json::Value>>()
        .await
        .unwrap();

    assert_eq!(report.len(), 2);
    assert_eq!(report[0]["status"], "lulus");
    assert_eq!(report[1]["status"], "mengulang");
    assert_eq!(report[1]["attempts"], 0);

    // 12. Attempt history is append-only: three submissions, three rows
    let history = client
        .get(format!("{}/api/admin/history", address))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap()
        .json::<Vec<serde_json::Value>>()
        .await
        .unwrap();

    let own_rows: Vec<_> = history
        .iter()
        .filter(|h| h["user_email"] == student_email.as_str())
        .collect();
    assert_eq!(own_rows.len(), 3);

    // 13. Students cannot reach the admin surface
    let forbidden = client
        .get(format!("{}/api/admin/users", address))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);
}

#[tokio::test]
async fn admin_file_upload_returns_public_url() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let admin_token = seed_admin(&address, &client, &pool).await;

    let part = reqwest::multipart::Part::bytes(b"fake slides".to_vec())
        .file_name("materi pertemuan 1.pdf");
    let form = reqwest::multipart::Form::new().part("file", part);

    let response = client
        .post(format!("{}/api/admin/uploads", address))
        .bearer_auth(&admin_token)
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 201);
    let body = response.json::<serde_json::Value>().await.unwrap();
    let url = body["file_url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/"));
    // Whitespace is made path-safe
    assert!(!url.contains(' '));
}
