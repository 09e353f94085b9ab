//! Web API Tests
//!
//! Integration tests for the tree, action, download and media endpoints.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use fileman::file::{ExtensionPolicy, Policy, Root};
use fileman::web::handlers::AppState;
use fileman::web::{create_health_router, create_router};
use fileman::ActionEngine;
use serde_json::Value;
use tempfile::TempDir;

/// Create a test server over a fresh temp root.
fn create_test_server_with(policy: Policy) -> (TestServer, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let root = Root::new(dir.path()).expect("Failed to open root");
    let app_state = Arc::new(AppState::new(ActionEngine::new(root, policy)));

    let router = create_router(app_state, 8 * 1024 * 1024).merge(create_health_router());
    let server = TestServer::new(router).expect("Failed to create test server");

    (server, dir)
}

fn create_test_server() -> (TestServer, TempDir) {
    create_test_server_with(Policy::default())
}

fn action_form(action: &str, path: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("action", action)
        .add_text("path", path)
}

fn file_part(name: &str, content: &[u8]) -> Part {
    Part::bytes(content.to_vec())
        .file_name(name)
        .mime_type("application/octet-stream")
}

async fn post_action(server: &TestServer, form: MultipartForm) -> Value {
    let response = server.post("/api/action").multipart(form).await;
    response.assert_status_ok();
    response.json::<Value>()
}

fn messages(body: &Value) -> Vec<String> {
    body["data"]["messages"]
        .as_array()
        .expect("messages array")
        .iter()
        .map(|m| m.as_str().expect("message string").to_string())
        .collect()
}

fn write(base: &Path, rel: &str, content: &[u8]) {
    let path = base.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

// ============================================================================
// Health / Tree
// ============================================================================

#[tokio::test]
async fn test_health() {
    let (server, _dir) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_tree_of_empty_root() {
    let (server, _dir) = create_test_server();

    let response = server.get("/api/tree").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let data = &body["data"];
    assert_eq!(data["current_id"], 1);
    assert_eq!(data["dir_structure"][""]["id"], 1);
    assert_eq!(data["dir_structure"][""]["open"], true);
    assert_eq!(data["space_consumed"], 0);
    assert_eq!(data["max_space"], 5120);
    assert_eq!(data["show_space"], true);
    assert_eq!(data["limits"]["max_folders"], 50);
    assert!(data["limits"]["extensions"].is_null());
}

#[tokio::test]
async fn test_tree_focuses_current_path() {
    let (server, dir) = create_test_server();
    write(dir.path(), "a/b/x.txt", b"12345");
    fs::create_dir_all(dir.path().join("c")).unwrap();

    let response = server
        .get("/api/tree")
        .add_query_param("current_path", "/a/b/")
        .await;

    let body: Value = response.json();
    let data = &body["data"];
    let root = &data["dir_structure"][""];
    let a = &root["dirs"]["a"];
    let b = &a["dirs"]["b"];

    assert_eq!(a["open"], true);
    assert_eq!(b["open"], true);
    assert_eq!(root["dirs"]["c"]["open"], false);
    assert_eq!(data["current_id"], b["id"]);
    assert_eq!(b["files"], serde_json::json!(["x.txt"]));
    assert_eq!(data["space_consumed"], 5);
}

#[tokio::test]
async fn test_tree_with_invalid_path_focuses_root() {
    let (server, _dir) = create_test_server();

    let response = server
        .get("/api/tree")
        .add_query_param("current_path", "/../../etc")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["current_id"], 1);
}

// ============================================================================
// Actions
// ============================================================================

#[tokio::test]
async fn test_upload_files() {
    let (server, dir) = create_test_server();

    let form = action_form("upload", "/")
        .add_text("file_or_dir", "dir")
        .add_part("ufile", file_part("a.txt", b"hello"))
        .add_part("ufile", file_part("b.txt", b"world"));
    let body = post_action(&server, form).await;

    assert_eq!(messages(&body), vec!["All files uploaded successfully"]);
    assert_eq!(body["data"]["success"], true);
    let mut files: Vec<&str> = body["data"]["dir_structure"][""]["files"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    files.sort();
    assert_eq!(files, vec!["a.txt", "b.txt"]);
    assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"hello");
    assert_eq!(fs::read(dir.path().join("b.txt")).unwrap(), b"world");
}

#[tokio::test]
async fn test_upload_same_name_twice() {
    let (server, dir) = create_test_server();

    for content in [b"first".as_slice(), b"second".as_slice()] {
        let form = action_form("upload", "/").add_part("ufile", file_part("a.txt", content));
        post_action(&server, form).await;
    }

    assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"first");
    assert_eq!(fs::read(dir.path().join("a.0.txt")).unwrap(), b"second");
}

#[tokio::test]
async fn test_upload_rejects_disallowed_extension() {
    let policy = Policy {
        extensions: ExtensionPolicy::only(["txt"]),
        ..Policy::default()
    };
    let (server, dir) = create_test_server_with(policy);

    let form = action_form("upload", "/")
        .add_part("ufile", file_part("ok.txt", b"fine"))
        .add_part("ufile", file_part("run.exe", b"MZ"));
    let body = post_action(&server, form).await;

    assert_eq!(
        messages(&body),
        vec!["File extension not allowed (.exe) : run.exe"]
    );
    assert_eq!(body["data"]["success"], false);
    assert!(dir.path().join("ok.txt").exists());
    assert!(!dir.path().join("run.exe").exists());
}

#[tokio::test]
async fn test_upload_oversized_file() {
    let policy = Policy {
        max_file_size_bytes: 1024,
        ..Policy::default()
    };
    let (server, dir) = create_test_server_with(policy);

    let form = action_form("upload", "/").add_part("ufile", file_part("big.bin", &[7u8; 2048]));
    let body = post_action(&server, form).await;

    assert_eq!(messages(&body), vec!["File size exceeded 1 KB : big.bin"]);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_add_rename_delete_folder() {
    let (server, dir) = create_test_server();

    let form = action_form("add", "/")
        .add_text("file_or_dir", "dir")
        .add_text("name", "photos");
    let body = post_action(&server, form).await;
    assert_eq!(messages(&body), vec!["Folder created successfully : photos"]);
    assert!(body["data"]["dir_structure"][""]["dirs"]["photos"].is_object());

    let form = action_form("rename", "/photos/")
        .add_text("file_or_dir", "dir")
        .add_text("name", "pictures");
    let body = post_action(&server, form).await;
    assert_eq!(
        messages(&body),
        vec!["Folder renamed successfully from photos to pictures"]
    );
    assert!(dir.path().join("pictures").is_dir());

    let form = action_form("delete", "/pictures/").add_text("file_or_dir", "dir");
    let body = post_action(&server, form).await;
    assert_eq!(messages(&body), vec!["Folder deleted successfully : pictures"]);
    assert!(!dir.path().join("pictures").exists());
}

#[tokio::test]
async fn test_delete_root_rejected() {
    let (server, dir) = create_test_server();
    write(dir.path(), "keep.txt", b"x");

    let form = action_form("delete", "/").add_text("file_or_dir", "dir");
    let body = post_action(&server, form).await;

    assert_eq!(messages(&body), vec!["root folder can't be deleted"]);
    assert_eq!(body["data"]["success"], false);
    assert!(dir.path().join("keep.txt").exists());
}

#[tokio::test]
async fn test_move_focuses_destination() {
    let (server, dir) = create_test_server();
    write(dir.path(), "a.txt", b"x");
    fs::create_dir_all(dir.path().join("docs")).unwrap();

    let form = action_form("move", "/a.txt")
        .add_text("file_or_dir", "file")
        .add_text("current_path", "/docs/");
    let body = post_action(&server, form).await;

    assert_eq!(messages(&body), vec!["File moved successfully : a.txt"]);
    let docs = &body["data"]["dir_structure"][""]["dirs"]["docs"];
    assert_eq!(body["data"]["current_id"], docs["id"]);
    assert_eq!(docs["files"], serde_json::json!(["a.txt"]));
}

#[tokio::test]
async fn test_traversal_path_rejected() {
    let (server, dir) = create_test_server();
    write(dir.path(), "a.txt", b"x");

    let form = action_form("delete", "/../a.txt");
    let body = post_action(&server, form).await;

    assert_eq!(messages(&body), vec!["Invalid path : /../a.txt"]);
    assert!(dir.path().join("a.txt").exists());
}

#[tokio::test]
async fn test_unknown_action() {
    let (server, _dir) = create_test_server();

    let response = server
        .post("/api/action")
        .multipart(action_form("format", "/"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(body["error"]["message"], "unknown action: format");
}

#[tokio::test]
async fn test_missing_action() {
    let (server, _dir) = create_test_server();

    let response = server
        .post("/api/action")
        .multipart(MultipartForm::new().add_text("path", "/"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Download / Media
// ============================================================================

#[tokio::test]
async fn test_download_file() {
    let (server, dir) = create_test_server();
    write(dir.path(), "docs/report.txt", b"quarterly numbers");

    let response = server
        .get("/api/download")
        .add_query_param("path", "/docs/report.txt")
        .add_query_param("kind", "file")
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"report.txt\""
    );
    assert!(response
        .header(header::CONTENT_TYPE)
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(response.as_bytes().as_ref(), b"quarterly numbers");
}

#[tokio::test]
async fn test_download_large_file_streams_every_chunk() {
    let (server, dir) = create_test_server();
    let payload: Vec<u8> = (0..300_000u32).map(|i| (i % 253) as u8).collect();
    write(dir.path(), "big.bin", &payload);

    let response = server
        .get("/api/download")
        .add_query_param("path", "/big.bin")
        .await;

    response.assert_status_ok();
    assert_eq!(response.header(header::CONTENT_LENGTH), "300000");
    assert_eq!(response.as_bytes().as_ref(), payload.as_slice());
}

#[tokio::test]
async fn test_download_directory_as_tarball() {
    let (server, dir) = create_test_server();
    write(dir.path(), "photos/2024/a.txt", b"hello");

    let response = server
        .get("/api/download")
        .add_query_param("path", "/photos")
        .add_query_param("kind", "dir")
        .await;

    response.assert_status_ok();
    assert_eq!(response.header(header::CONTENT_TYPE), "application/x-gzip");
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"photos.tar.gz\""
    );

    let bytes = response.as_bytes().to_vec();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(bytes.as_slice()));
    let mut found = false;
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        if entry.path().unwrap().to_string_lossy() == "photos/2024/a.txt" {
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            assert_eq!(content, "hello");
            found = true;
        }
    }
    assert!(found, "archive should contain photos/2024/a.txt");
}

#[tokio::test]
async fn test_download_missing_file() {
    let (server, _dir) = create_test_server();

    let response = server
        .get("/api/download")
        .add_query_param("path", "/ghost.txt")
        .await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_download_invalid_path() {
    let (server, _dir) = create_test_server();

    let response = server
        .get("/api/download")
        .add_query_param("path", "/../etc/passwd")
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_media() {
    let (server, dir) = create_test_server();
    let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    write(dir.path(), "img/logo.png", &png);

    let response = server
        .get("/api/media")
        .add_query_param("path", "/img/logo.png")
        .await;

    response.assert_status_ok();
    assert_eq!(response.header(header::CONTENT_TYPE), "image/png");
    assert_eq!(response.header(header::CACHE_CONTROL), "max-age=3600");
    assert_eq!(response.as_bytes().as_ref(), &png);
}
