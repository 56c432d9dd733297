mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

async fn create_board(app: axum::Router, token: &str) -> Value {
    let (status, body) = common::make_request(
        app,
        "POST",
        "/api/boards",
        Some(json!({ "title": "Line 1", "description": "Assembly" }).to_string()),
        Some(token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    serde_json::from_str(&body).unwrap()
}

async fn create_card(app: axum::Router, token: &str, column_id: &str, body: Value) -> Value {
    let mut body = body;
    body["column_id"] = json!(column_id);
    let (status, body) = common::make_request(
        app,
        "POST",
        "/api/cards",
        Some(body.to_string()),
        Some(token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    serde_json::from_str(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _pool, _token) = common::setup_app().await;

    let (status, body) = common::make_request(app.clone(), "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"ok\""));
    assert!(body.contains("\"database\":\"ok\""));

    let (status, _) = common::make_request(app, "GET", "/health/live", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_board_routes_require_token() {
    let (app, _pool, _token) = common::setup_app().await;

    let (status, _) = common::make_request(app.clone(), "GET", "/api/boards", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        common::make_request(app, "GET", "/api/boards", None, Some("garbage-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_and_me() {
    let (app, _pool, _token) = common::setup_app().await;

    let (status, body) = common::make_request(
        app.clone(),
        "POST",
        "/api/auth/register",
        Some(json!({ "username": "operator", "password": "correct-horse" }).to_string()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let (status, body) = common::make_request(
        app.clone(),
        "POST",
        "/api/auth/login",
        Some(json!({ "username": "operator", "password": "wrong-password" }).to_string()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", body);

    let (status, body) = common::make_request(
        app.clone(),
        "POST",
        "/api/auth/login",
        Some(json!({ "username": "operator", "password": "correct-horse" }).to_string()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let auth: Value = serde_json::from_str(&body).unwrap();
    let token = auth["access_token"].as_str().unwrap();

    let (status, body) =
        common::make_request(app, "GET", "/api/auth/me", None, Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    let me: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(me["username"], "operator");
}

#[tokio::test]
async fn test_refresh_rotates_token() {
    let (app, _pool, _token) = common::setup_app().await;

    let (_, body) = common::make_request(
        app.clone(),
        "POST",
        "/api/auth/register",
        Some(json!({ "username": "rotator", "password": "correct-horse" }).to_string()),
        None,
    )
    .await;
    let auth: Value = serde_json::from_str(&body).unwrap();
    let refresh = auth["refresh_token"].as_str().unwrap().to_string();

    let refresh_body = json!({ "refresh_token": refresh }).to_string();
    let (status, _) = common::make_request(
        app.clone(),
        "POST",
        "/api/auth/refresh",
        Some(refresh_body.clone()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
        common::make_request(app, "POST", "/api/auth/refresh", Some(refresh_body), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_board_with_default_columns() {
    let (app, _pool, token) = common::setup_app().await;

    let full = create_board(app.clone(), &token).await;
    let titles: Vec<_> = full["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["To Do", "In Progress", "Testing", "Done"]);

    let (status, body) =
        common::make_request(app, "GET", "/api/boards", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let boards: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0]["title"], "Line 1");
}

#[tokio::test]
async fn test_blank_board_title_is_bad_request() {
    let (app, _pool, token) = common::setup_app().await;

    let (status, body) = common::make_request(
        app,
        "POST",
        "/api/boards",
        Some(json!({ "title": "  " }).to_string()),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(error["status"], 400);
}

#[tokio::test]
async fn test_null_clears_board_description_and_column_limit() {
    let (app, _pool, token) = common::setup_app().await;
    let full = create_board(app.clone(), &token).await;
    let board_id = full["board"]["id"].as_str().unwrap().to_string();
    let todo = full["columns"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = common::make_request(
        app.clone(),
        "PATCH",
        &format!("/api/boards/{}", board_id),
        Some(json!({ "title": "Line 2" }).to_string()),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let board: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(board["description"], "Assembly");

    let (status, body) = common::make_request(
        app.clone(),
        "PATCH",
        &format!("/api/boards/{}", board_id),
        Some(json!({ "description": null }).to_string()),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let board: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(board["title"], "Line 2");
    assert!(board["description"].is_null());

    let (status, body) = common::make_request(
        app.clone(),
        "PATCH",
        &format!("/api/columns/{}", todo),
        Some(json!({ "card_limit": 3 }).to_string()),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let column: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(column["card_limit"], 3);

    let (status, body) = common::make_request(
        app,
        "PATCH",
        &format!("/api/columns/{}", todo),
        Some(json!({ "card_limit": null }).to_string()),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let column: Value = serde_json::from_str(&body).unwrap();
    assert!(column["card_limit"].is_null());
    assert_eq!(column["title"], "To Do");
}

#[tokio::test]
async fn test_card_lifecycle() {
    let (app, _pool, token) = common::setup_app().await;
    let full = create_board(app.clone(), &token).await;
    let todo = full["columns"][0]["id"].as_str().unwrap().to_string();
    let done = full["columns"][3]["id"].as_str().unwrap().to_string();

    let card = create_card(
        app.clone(),
        &token,
        &todo,
        json!({ "title": "Calibrate press", "tags": ["setup"] }),
    )
    .await;
    assert_eq!(card["priority"], "medium");
    assert_eq!(card["column_id"], todo.as_str());
    let card_id = card["id"].as_str().unwrap().to_string();

    let (status, body) = common::make_request(
        app.clone(),
        "PATCH",
        &format!("/api/cards/{}", card_id),
        Some(json!({ "priority": "critical", "assignee": "Mike Wilson" }).to_string()),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let updated: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(updated["priority"], "critical");
    assert_eq!(updated["assignee"], "Mike Wilson");

    let (status, body) = common::make_request(
        app.clone(),
        "PATCH",
        &format!("/api/cards/{}/move", card_id),
        Some(json!({ "column_id": done, "position": 0 }).to_string()),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let moved: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(moved["column_id"], done.as_str());

    let (status, body) = common::make_request(
        app.clone(),
        "GET",
        &format!("/api/columns/{}/cards", done),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let cards: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(cards.len(), 1);

    let (status, _) = common::make_request(
        app.clone(),
        "DELETE",
        &format!("/api/cards/{}", card_id),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = common::make_request(
        app,
        "DELETE",
        &format!("/api/cards/{}", card_id),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reorder_column_endpoint() {
    let (app, _pool, token) = common::setup_app().await;
    let full = create_board(app.clone(), &token).await;
    let todo = full["columns"][0]["id"].as_str().unwrap().to_string();

    let first = create_card(
        app.clone(),
        &token,
        &todo,
        json!({ "title": "First", "position": 0 }),
    )
    .await;
    let second = create_card(
        app.clone(),
        &token,
        &todo,
        json!({ "title": "Second", "position": 1 }),
    )
    .await;

    let order = json!({ "card_ids": [second["id"], first["id"]] }).to_string();
    let (status, _) = common::make_request(
        app.clone(),
        "PUT",
        &format!("/api/columns/{}/order", todo),
        Some(order),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = common::make_request(
        app,
        "GET",
        &format!("/api/columns/{}/cards", todo),
        None,
        Some(&token),
    )
    .await;
    let cards: Vec<Value> = serde_json::from_str(&body).unwrap();
    let titles: Vec<_> = cards.iter().map(|c| c["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Second", "First"]);
}

#[tokio::test]
async fn test_full_board_dashboard_and_filtered_view() {
    let (app, _pool, token) = common::setup_app().await;
    let full = create_board(app.clone(), &token).await;
    let board_id = full["board"]["id"].as_str().unwrap().to_string();
    let todo = full["columns"][0]["id"].as_str().unwrap().to_string();
    let done = full["columns"][3]["id"].as_str().unwrap().to_string();

    create_card(
        app.clone(),
        &token,
        &todo,
        json!({ "title": "Setup Production Line A", "priority": "high", "assignee": "John Smith", "position": 0 }),
    )
    .await;
    create_card(
        app.clone(),
        &token,
        &todo,
        json!({ "title": "Quality Control Review", "assignee": "Sarah Johnson", "position": 1 }),
    )
    .await;
    create_card(
        app.clone(),
        &token,
        &done,
        json!({ "title": "Equipment Calibration", "description": "Monthly calibration", "assignee": "Tom Davis" }),
    )
    .await;

    let (status, body) = common::make_request(
        app.clone(),
        "GET",
        &format!("/api/boards/{}/full", board_id),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let loaded: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(loaded["columns"][0]["cards"].as_array().unwrap().len(), 2);

    let (status, body) = common::make_request(
        app.clone(),
        "GET",
        &format!("/api/boards/{}/dashboard", board_id),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let stats: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["completed"], 1);
    assert_eq!(stats["completion_rate"], 33);
    assert_eq!(stats["in_progress"], 0);
    assert_eq!(stats["columns"][0]["share"], 67);

    let (status, body) = common::make_request(
        app.clone(),
        "GET",
        &format!("/api/boards/{}/filtered?search=CALIBRATION&priority=all", board_id),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let view: Value = serde_json::from_str(&body).unwrap();
    let visible: usize = view["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["cards"].as_array().unwrap().len())
        .sum();
    assert_eq!(visible, 1);
    assert_eq!(view["columns"].as_array().unwrap().len(), 4);
    assert_eq!(view["options"]["assignees"].as_array().unwrap().len(), 3);

    let (status, body) = common::make_request(
        app,
        "GET",
        &format!("/api/boards/{}/filtered?priority=high", board_id),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let view: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(view["columns"][0]["cards"].as_array().unwrap().len(), 1);
    assert!(view["columns"][3]["cards"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_boards_are_private_to_owner() {
    let (app, pool, token) = common::setup_app().await;
    let full = create_board(app.clone(), &token).await;
    let board_id = full["board"]["id"].as_str().unwrap().to_string();

    let other = common::create_test_user(&pool, "other").await;
    let other_token = common::token_for(&pool, &other).await;

    let (status, _) = common::make_request(
        app.clone(),
        "GET",
        &format!("/api/boards/{}/full", board_id),
        None,
        Some(&other_token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) =
        common::make_request(app, "GET", "/api/boards", None, Some(&other_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn test_delete_board_cascades() {
    let (app, pool, token) = common::setup_app().await;
    let full = create_board(app.clone(), &token).await;
    let board_id = full["board"]["id"].as_str().unwrap().to_string();
    let todo = full["columns"][0]["id"].as_str().unwrap().to_string();
    create_card(app.clone(), &token, &todo, json!({ "title": "Doomed" })).await;

    let (status, _) = common::make_request(
        app,
        "DELETE",
        &format!("/api/boards/{}", board_id),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cards")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}
