//! Integration tests for the workflow editor endpoints
//!
//! Tests cover:
//! - Initial graph with the protected main node
//! - Adding tracks, duplicate rejection, connecting, deleting
//! - Clear confirmation
//! - Export download
//! - Saved workflow surviving a restart

mod helpers;

use axum::http::{header, StatusCode};
use helpers::{extract_json, extract_text, MockProvider, TestApp};
use serde_json::{json, Value};

const COMMANDS: &str = "/api/workflow/commands";

fn track_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Song {}", id),
        "artists": [{ "name": "Alpha" }],
        "album": { "name": "Album", "images": [{ "url": format!("https://i.scdn.co/image/{}", id) }] },
        "external_urls": { "spotify": format!("https://open.spotify.com/track/{}", id) }
    })
}

fn add_track(id: &str) -> Value {
    json!({ "command": "add_track", "track": track_json(id) })
}

fn connect(source: &str, target: &str) -> Value {
    json!({
        "command": "connect",
        "source": source,
        "target": target,
        "sourceHandle": null,
        "targetHandle": null
    })
}

#[tokio::test]
async fn test_initial_workflow_has_main_node() {
    let mock = MockProvider::start().await;
    let app = TestApp::start(&mock).await;

    let response = app.get("/api/workflow", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let view = extract_json(response).await;
    let nodes = view["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0]["id"], "main");
    assert_eq!(nodes[0]["type"], "mainNode");
    assert_eq!(nodes[0]["position"], json!({ "x": 400.0, "y": 100.0 }));
    assert_eq!(nodes[0]["deletable"], false);
    assert_eq!(view["getting_started"].as_array().unwrap().len(), 4);
    assert_eq!(view["sidebar"]["connected"], 0);
}

#[tokio::test]
async fn test_add_track_places_node_on_ring() {
    let mock = MockProvider::start().await;
    let app = TestApp::start(&mock).await;

    let response = app.post_json(COMMANDS, add_track("T1")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let outcome = extract_json(response).await;
    assert_eq!(outcome["changed"], true);
    assert_eq!(outcome["node_count"], 2);
    assert_eq!(outcome["added_node"]["id"], "track-T1");
    assert_eq!(outcome["added_node"]["type"], "trackNode");
    // First track node: angle 0 at radius 200 around (400, 100)
    assert_eq!(outcome["added_node"]["position"], json!({ "x": 600.0, "y": 100.0 }));
}

#[tokio::test]
async fn test_duplicate_track_is_rejected() {
    let mock = MockProvider::start().await;
    let app = TestApp::start(&mock).await;

    app.post_json(COMMANDS, add_track("T1")).await;
    let response = app.post_json(COMMANDS, add_track("T1")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        extract_json(response).await["error"],
        "This track is already added to the workflow!"
    );

    let view = extract_json(app.get("/api/workflow", None).await).await;
    assert_eq!(view["nodes"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_connect_counts_connected_tracks() {
    let mock = MockProvider::start().await;
    let app = TestApp::start(&mock).await;

    app.post_json(COMMANDS, add_track("T1")).await;
    app.post_json(COMMANDS, add_track("T2")).await;

    let response = app.post_json(COMMANDS, connect("track-T1", "main")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = extract_json(response).await;
    assert_eq!(outcome["edge_count"], 1);
    assert_eq!(outcome["connected_count"], 1);
    assert!(outcome["added_edge"]["id"].as_str().unwrap().starts_with("edge-"));

    let view = extract_json(app.get("/api/workflow", None).await).await;
    assert_eq!(view["sidebar"]["connected"], 1);
    assert_eq!(view["edges"][0]["source"], "track-T1");
    assert_eq!(view["edges"][0]["target"], "main");
}

#[tokio::test]
async fn test_connect_to_unknown_node_is_not_found() {
    let mock = MockProvider::start().await;
    let app = TestApp::start(&mock).await;

    let response = app.post_json(COMMANDS, connect("track-ghost", "main")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_selection_keeps_main_node() {
    let mock = MockProvider::start().await;
    let app = TestApp::start(&mock).await;

    app.post_json(COMMANDS, add_track("T1")).await;
    app.post_json(COMMANDS, connect("track-T1", "main")).await;

    let response = app
        .post_json(
            COMMANDS,
            json!({ "command": "delete_selection", "nodes": ["main", "track-T1"] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let outcome = extract_json(response).await;
    assert_eq!(outcome["removed_nodes"], json!(["track-T1"]));
    assert_eq!(outcome["removed_edges"].as_array().unwrap().len(), 1);
    assert_eq!(outcome["node_count"], 1);
    assert_eq!(outcome["edge_count"], 0);
}

#[tokio::test]
async fn test_move_node_updates_position() {
    let mock = MockProvider::start().await;
    let app = TestApp::start(&mock).await;

    app.post_json(COMMANDS, add_track("T1")).await;
    let response = app
        .post_json(
            COMMANDS,
            json!({ "command": "move_node", "id": "track-T1", "position": { "x": 10.0, "y": -5.5 } }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let view = extract_json(app.get("/api/workflow", None).await).await;
    assert_eq!(view["nodes"][1]["position"], json!({ "x": 10.0, "y": -5.5 }));
}

#[tokio::test]
async fn test_clear_needs_confirmation() {
    let mock = MockProvider::start().await;
    let app = TestApp::start(&mock).await;
    app.post_json(COMMANDS, add_track("T1")).await;

    let response = app
        .post_json(COMMANDS, json!({ "command": "clear", "confirmed": false }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let view = extract_json(app.get("/api/workflow", None).await).await;
    assert_eq!(view["nodes"].as_array().unwrap().len(), 2);

    let response = app
        .post_json(COMMANDS, json!({ "command": "clear", "confirmed": true }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let view = extract_json(app.get("/api/workflow", None).await).await;
    assert_eq!(view["nodes"].as_array().unwrap().len(), 1);
    assert_eq!(view["nodes"][0]["id"], "main");
}

#[tokio::test]
async fn test_unknown_command_is_rejected() {
    let mock = MockProvider::start().await;
    let app = TestApp::start(&mock).await;

    let response = app.post_json(COMMANDS, json!({ "command": "rename" })).await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_export_downloads_snapshot() {
    let mock = MockProvider::start().await;
    let app = TestApp::start(&mock).await;
    app.post_json(COMMANDS, add_track("T1")).await;

    let response = app.get("/api/workflow/export", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("musicmash-workflow.json"));

    let text = extract_text(response).await;
    // Pretty-printed for people to read
    assert!(text.contains("\n  "));
    let document: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(document["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(document["edges"], json!([]));
    assert!(document["timestamp"].is_string());
}

#[tokio::test]
async fn test_saved_workflow_survives_restart() {
    let mock = MockProvider::start().await;
    let app = TestApp::start(&mock).await;

    app.post_json(COMMANDS, add_track("T1")).await;
    app.post_json(COMMANDS, add_track("T2")).await;
    app.post_json(COMMANDS, connect("track-T2", "main")).await;
    app.state.editor.flush().await;

    let before = extract_json(app.get("/api/workflow", None).await).await;

    let restarted =
        TestApp::with_pool(app.db.clone(), mock.token_url(), mock.api_base_url()).await;
    let after = extract_json(restarted.get("/api/workflow", None).await).await;

    assert_eq!(after["nodes"], before["nodes"]);
    assert_eq!(after["edges"], before["edges"]);
    assert_eq!(after["sidebar"]["connected"], 1);
}

#[tokio::test]
async fn test_cleared_workflow_stays_cleared_after_restart() {
    let mock = MockProvider::start().await;
    let app = TestApp::start(&mock).await;

    app.post_json(COMMANDS, add_track("T1")).await;
    app.state.editor.flush().await;
    app.post_json(COMMANDS, json!({ "command": "clear", "confirmed": true }))
        .await;

    let restarted =
        TestApp::with_pool(app.db.clone(), mock.token_url(), mock.api_base_url()).await;
    let view = extract_json(restarted.get("/api/workflow", None).await).await;
    assert_eq!(view["nodes"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    let mock = MockProvider::start().await;
    let app = TestApp::start(&mock).await;

    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "musicmash-server");
    assert!(body["version"].is_string());
}
