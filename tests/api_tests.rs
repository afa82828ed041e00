use content_portal::{
    AppState, MemoryRepository, MockMailer, MockStorageService,
    auth::issue_token,
    config::AppConfig,
    create_router,
    models::{NewAdmin, Role},
    repository::Repository,
};
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

// --- Test Harness ---

struct TestApp {
    address: String,
    repo: Arc<MemoryRepository>,
    storage: Arc<MockStorageService>,
    mailer: Arc<MockMailer>,
    config: AppConfig,
}

impl TestApp {
    /// Seeds an admin row and returns a bearer token for it.
    async fn seed_with_token(&self, username: &str, role: Role) -> (i64, String) {
        let hash = bcrypt::hash("seed-pass", 4).unwrap();
        let admin = self
            .repo
            .create_admin(NewAdmin {
                username: username.to_string(),
                password_hash: hash,
                role,
                sites: vec!["site-a".to_string()],
            })
            .await
            .unwrap();
        let token = issue_token(&admin, &self.config.jwt_secret).unwrap();
        (admin.id, token)
    }
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new());
    let storage = Arc::new(MockStorageService::new());
    let mailer = Arc::new(MockMailer::new());

    let mut config = AppConfig::default();
    config.contact_audit_log = std::env::temp_dir()
        .join(format!("portal-api-audit-{}.log", Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();

    let state = AppState {
        repo: repo.clone(),
        storage: storage.clone(),
        mailer: mailer.clone(),
        config: config.clone(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        repo,
        storage,
        mailer,
        config,
    }
}

// --- Gateway ---

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_login_flow() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    app.seed_with_token("ops", Role::Admin).await;

    // Wrong password
    let resp = client
        .post(format!("{}/login", app.address))
        .json(&serde_json::json!({"username": "ops", "password": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Unknown username
    let resp = client
        .post(format!("{}/login", app.address))
        .json(&serde_json::json!({"username": "ghost", "password": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Success: token present, password never in the body
    let resp = client
        .post(format!("{}/login", app.address))
        .json(&serde_json::json!({"username": "ops", "password": "seed-pass"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["accessToken"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["username"], "ops");
    assert!(body["user"].get("password").is_none());
}

// --- Access Control ---

#[tokio::test]
async fn test_mutations_require_authentication() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/news", app.address))
        .multipart(Form::new().text("title", "unauthorized"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .get(format!("{}/admin", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_admin_management_policy_over_http() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, super_token) = app.seed_with_token("root", Role::SuperAdmin).await;
    let (admin_id, admin_token) = app.seed_with_token("ops", Role::Admin).await;

    // Ordinary admin cannot list accounts.
    let resp = client
        .get(format!("{}/admin", app.address))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Super admin lists both rows.
    let resp = client
        .get(format!("{}/admin", app.address))
        .bearer_auth(&super_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 2);

    // Creation is super_admin-only, duplicates conflict.
    let resp = client
        .post(format!("{}/admin", app.address))
        .bearer_auth(&super_token)
        .json(&serde_json::json!({"username": "new-ops", "password": "pw123456"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = client
        .post(format!("{}/admin", app.address))
        .bearer_auth(&super_token)
        .json(&serde_json::json!({"username": "new-ops", "password": "pw123456"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // An admin touching its own site scope is denied.
    let resp = client
        .put(format!("{}/admin/{}", app.address, admin_id))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({"sites": ["site-z"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // But may rename itself.
    let resp = client
        .put(format!("{}/admin/{}", app.address, admin_id))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({"username": "ops-renamed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_super_admin_rows_survive_delete_attempts() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (root_id, super_token) = app.seed_with_token("root", Role::SuperAdmin).await;

    let resp = client
        .delete(format!("{}/admin/{}", app.address, root_id))
        .bearer_auth(&super_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert!(app.repo.get_admin(root_id).await.is_some());
}

// --- News Lifecycle ---

#[tokio::test]
async fn test_news_multipart_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, token) = app.seed_with_token("editor", Role::Admin).await;

    // Create with a cover image upload.
    let form = Form::new()
        .text("title", "Launch day")
        .text("description", "We are live")
        .text("fullContent", "<p>Details</p>")
        .part(
            "img",
            Part::bytes(vec![0xFF, 0xD8, 0xFF])
                .file_name("cover.jpg")
                .mime_str("image/jpeg")
                .unwrap(),
        );
    let resp = client
        .post(format!("{}/news", app.address))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: serde_json::Value = resp.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    let first_img = created["img"].as_str().unwrap().to_string();
    assert!(first_img.contains("/uploads/news/"));
    assert_eq!(created["fullContent"], "<p>Details</p>");

    // Public read, newest first.
    let resp = client
        .get(format!("{}/news", app.address))
        .send()
        .await
        .unwrap();
    let list: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(list[0]["id"].as_i64().unwrap(), id);

    // Replacing the cover image cleans up the superseded file.
    let form = Form::new().part(
        "img",
        Part::bytes(vec![0xFF, 0xD8, 0xFE])
            .file_name("cover2.jpg")
            .mime_str("image/jpeg")
            .unwrap(),
    );
    let resp = client
        .put(format!("{}/news/{}", app.address, id))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: serde_json::Value = resp.json().await.unwrap();
    assert_ne!(updated["img"].as_str().unwrap(), first_img);
    assert!(app.storage.removed_urls().contains(&first_img));

    // Delete removes the row and the remaining file.
    let resp = client
        .delete(format!("{}/news/{}", app.address, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client
        .get(format!("{}/news/{}", app.address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_news_requires_title() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, token) = app.seed_with_token("editor", Role::Admin).await;

    let resp = client
        .post(format!("{}/news", app.address))
        .bearer_auth(&token)
        .multipart(Form::new().text("description", "no title"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_news_invalid_id_is_bad_request() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/news/0", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

// --- Categories ---

#[tokio::test]
async fn test_category_lifecycle_over_http() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, token) = app.seed_with_token("editor", Role::Admin).await;

    let form = Form::new()
        .text("title_ru", "Новости")
        .text("title_en", "News")
        .part(
            "img",
            Part::bytes(vec![1, 2, 3])
                .file_name("cat.png")
                .mime_str("image/png")
                .unwrap(),
        );
    let resp = client
        .post(format!("{}/categories", app.address))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: serde_json::Value = resp.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["title"]["en"], "News");
    assert!(created["img"].as_str().unwrap().contains("/uploads/categories/"));

    // Public read.
    let resp = client
        .get(format!("{}/categories/{}", app.address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Partial title update keeps the other locale.
    let resp = client
        .put(format!("{}/categories/{}", app.address, id))
        .bearer_auth(&token)
        .multipart(Form::new().text("title_en", "Products"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(updated["title"]["en"], "Products");
    assert_eq!(updated["title"]["ru"], "Новости");

    let resp = client
        .delete(format!("{}/categories/{}", app.address, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
}

#[tokio::test]
async fn test_category_requires_both_titles() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, token) = app.seed_with_token("editor", Role::Admin).await;

    let resp = client
        .post(format!("{}/categories", app.address))
        .bearer_auth(&token)
        .multipart(Form::new().text("title_ru", "Только русский"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

// --- Contact & Upload ---

#[tokio::test]
async fn test_contact_submission_over_http() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/contact", app.address))
        .json(&serde_json::json!({
            "name": "Alice", "phone": "+100", "message": "Hi there"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(app.mailer.sent_messages().len(), 1);

    // Missing message field is rejected up front.
    let resp = client
        .post(format!("{}/contact", app.address))
        .json(&serde_json::json!({"name": "Bob", "phone": "+2", "message": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_generic_upload_over_http() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let form = Form::new().part(
        "file",
        Part::bytes(b"%PDF-1.4 fake".to_vec())
            .file_name("report.pdf")
            .mime_str("application/pdf")
            .unwrap(),
    );
    let resp = client
        .post(format!("{}/upload", app.address))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["originalName"], "report.pdf");
    assert_eq!(body["mimetype"], "application/pdf");
    assert!(body["url"].as_str().unwrap().contains("/uploads/files/"));
    assert_eq!(body["size"].as_u64().unwrap(), 13);

    // A body without a file part is rejected.
    let resp = client
        .post(format!("{}/upload", app.address))
        .multipart(Form::new().text("note", "no file here"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
