//! Ticket API integration tests.
//!
//! Exercises the full conversation flow over HTTP against a spawned server
//! binary: create, take, reply, message, close, and the error statuses.

use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::{NamedTempFile, TempDir};
use tokio::time::sleep;

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a config with database path
fn config_with_db(port: u16, db_path: &str) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[database]
path = "{}"
"#,
        port, db_path
    )
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_frontdesk"))
        .env("FRONTDESK_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Helper to start a server for testing
async fn start_test_server() -> (u16, tokio::process::Child, TempDir) {
    let port = get_available_port();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let config_content = config_with_db(port, db_path.to_str().unwrap());

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let server = spawn_server(temp_file.path()).await;

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    (port, server, temp_dir)
}

async fn create_ticket(client: &Client, port: u16, user_id: i64, text: &str) -> Value {
    let response = client
        .post(format!("http://127.0.0.1:{}/api/v1/tickets", port))
        .json(&json!({ "user_id": user_id, "text": text }))
        .send()
        .await
        .expect("Failed to create ticket");
    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse JSON")
}

#[tokio::test]
async fn test_create_ticket() {
    let (port, mut server, _temp_dir) = start_test_server().await;

    let client = Client::new();
    let json = create_ticket(&client, port, 42, "My payment did not go through").await;

    assert!(json["id"].is_string());
    assert_eq!(json["user_id"], 42);
    assert_eq!(json["status"], "new");
    assert_eq!(json["last_actor"], "user");
    assert_eq!(json["messages"][0]["sender"], "user");
    assert_eq!(json["messages"][0]["body"], "My payment did not go through");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_duplicate_open_ticket_rejected() {
    let (port, mut server, _temp_dir) = start_test_server().await;

    let client = Client::new();
    create_ticket(&client, port, 42, "first issue").await;

    let response = client
        .post(format!("http://127.0.0.1:{}/api/v1/tickets", port))
        .json(&json!({ "user_id": 42, "text": "second issue" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 409);
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().contains("open ticket"));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_full_conversation_flow() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();

    // User opens a ticket
    let created = create_ticket(&client, port, 7, "login broken").await;
    let id = created["id"].as_str().unwrap();

    // Admin takes it: in_progress, but the turn stays with the user
    let response = client
        .post(format!("http://127.0.0.1:{}/api/v1/tickets/{}/take", port, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let taken: Value = response.json().await.unwrap();
    assert_eq!(taken["status"], "in_progress");
    assert_eq!(taken["last_actor"], "user");

    // Admin replies: turn flips to support
    let response = client
        .post(format!("http://127.0.0.1:{}/api/v1/tickets/{}/reply", port, id))
        .json(&json!({ "text": "try resetting your password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let replied: Value = response.json().await.unwrap();
    assert_eq!(replied["status"], "in_progress");
    assert_eq!(replied["last_actor"], "support");
    assert_eq!(replied["messages"].as_array().unwrap().len(), 2);

    // User answers: turn flips back
    let response = client
        .post(format!(
            "http://127.0.0.1:{}/api/v1/tickets/{}/messages",
            port, id
        ))
        .json(&json!({ "text": "that fixed it, thanks" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let answered: Value = response.json().await.unwrap();
    assert_eq!(answered["last_actor"], "user");
    assert_eq!(answered["messages"].as_array().unwrap().len(), 3);

    // Admin closes
    let response = client
        .post(format!("http://127.0.0.1:{}/api/v1/tickets/{}/close", port, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let closed: Value = response.json().await.unwrap();
    assert_eq!(closed["status"], "closed");
    assert_eq!(closed["closed_reason"], "manual_admin");
    assert!(closed["closed_at"].is_string());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_admin_reply_moves_new_ticket_to_in_progress() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();

    let created = create_ticket(&client, port, 9, "question").await;
    let id = created["id"].as_str().unwrap();

    // Reply without taking first
    let response = client
        .post(format!("http://127.0.0.1:{}/api/v1/tickets/{}/reply", port, id))
        .json(&json!({ "text": "answer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let replied: Value = response.json().await.unwrap();
    assert_eq!(replied["status"], "in_progress");
    assert_eq!(replied["last_actor"], "support");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_take_twice_conflicts() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();

    let created = create_ticket(&client, port, 9, "question").await;
    let id = created["id"].as_str().unwrap();

    let response = client
        .post(format!("http://127.0.0.1:{}/api/v1/tickets/{}/take", port, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .post(format!("http://127.0.0.1:{}/api/v1/tickets/{}/take", port, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    let json: Value = response.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().contains("admin_takes"));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_events_on_closed_ticket_conflict() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();

    let created = create_ticket(&client, port, 9, "question").await;
    let id = created["id"].as_str().unwrap();

    client
        .post(format!("http://127.0.0.1:{}/api/v1/tickets/{}/close", port, id))
        .send()
        .await
        .unwrap();

    // Close again
    let response = client
        .post(format!("http://127.0.0.1:{}/api/v1/tickets/{}/close", port, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().contains("closed"));

    // User message after close
    let response = client
        .post(format!(
            "http://127.0.0.1:{}/api/v1/tickets/{}/messages",
            port, id
        ))
        .json(&json!({ "text": "hello?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_get_nonexistent_ticket() {
    let (port, mut server, _temp_dir) = start_test_server().await;

    let client = Client::new();
    let response = client
        .get(format!(
            "http://127.0.0.1:{}/api/v1/tickets/nonexistent-id",
            port
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().contains("not found"));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_list_tickets_with_status_filter() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();

    let first = create_ticket(&client, port, 1, "issue one").await;
    create_ticket(&client, port, 2, "issue two").await;

    // Close the first
    client
        .post(format!(
            "http://127.0.0.1:{}/api/v1/tickets/{}/close",
            port,
            first["id"].as_str().unwrap()
        ))
        .send()
        .await
        .unwrap();

    let response = client
        .get(format!(
            "http://127.0.0.1:{}/api/v1/tickets?status=new",
            port
        ))
        .send()
        .await
        .unwrap();
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["total"], 1);

    let response = client
        .get(format!(
            "http://127.0.0.1:{}/api/v1/tickets?status=closed",
            port
        ))
        .send()
        .await
        .unwrap();
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["total"], 1);

    // Unknown status is a client error
    let response = client
        .get(format!(
            "http://127.0.0.1:{}/api/v1/tickets?status=working",
            port
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_stats_endpoint() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();

    let first = create_ticket(&client, port, 1, "issue one").await;
    create_ticket(&client, port, 2, "issue two").await;

    client
        .post(format!(
            "http://127.0.0.1:{}/api/v1/tickets/{}/reply",
            port,
            first["id"].as_str().unwrap()
        ))
        .json(&json!({ "text": "answered" }))
        .send()
        .await
        .unwrap();

    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/tickets/stats", port))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["new"], 1);
    assert_eq!(json["in_progress"], 1);
    assert_eq!(json["closed"], 0);
    assert_eq!(json["messages"], 3);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();

    let response = client
        .post(format!("http://127.0.0.1:{}/api/v1/tickets", port))
        .json(&json!({ "user_id": 1, "text": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    server.kill().await.ok();
}
