//! HTTP 接口测试
//!
//! 使用内存仓储构建完整路由，通过 oneshot 驱动请求

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use campus_gamification::{AppState, PointsCalculator, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

// ==================== 辅助函数 ====================

fn create_test_app() -> Router {
    build_router(AppState::in_memory(PointsCalculator::default()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_headers(app, method, uri, body, &[]).await
}

async fn send_with_headers(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn register(app: &Router, user_id: &str, display_name: &str) {
    let (status, _) = send(
        app,
        "POST",
        "/api/v1/users",
        Some(json!({ "userId": user_id, "displayName": display_name })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn award(app: &Router, user_id: &str, event_id: &str, category: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/v1/points/award",
        Some(json!({ "userId": user_id, "eventId": event_id, "category": category })),
    )
    .await
}

async fn create_reward(app: &Router, name: &str, cost: i64, stock: Option<i32>) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/rewards",
        Some(json!({ "name": name, "cost": cost, "stock": stock })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["id"].as_i64().unwrap()
}

// ==================== 探针 ====================

#[tokio::test]
async fn test_health_and_ready() {
    let app = create_test_app();

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["database"], "ok");
}

// ==================== 用户 ====================

#[tokio::test]
async fn test_register_and_get_user() {
    let app = create_test_app();
    register(&app, "s2024001", "Lin").await;

    let (status, body) = send(&app, "GET", "/api/v1/users/s2024001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["displayName"], "Lin");
    assert_eq!(body["data"]["balance"], 0);
}

#[tokio::test]
async fn test_register_duplicate_user() {
    let app = create_test_app();
    register(&app, "s2024001", "Lin").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/users",
        Some(json!({ "userId": "s2024001", "displayName": "Other" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "USER_ALREADY_EXISTS");
}

#[tokio::test]
async fn test_register_validation_error() {
    let app = create_test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/users",
        Some(json!({ "userId": "", "displayName": "Lin" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_get_unknown_user() {
    let app = create_test_app();

    let (status, body) = send(&app, "GET", "/api/v1/users/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "USER_NOT_FOUND");
}

// ==================== 积分发放 ====================

#[tokio::test]
async fn test_award_points_rule_table() {
    let app = create_test_app();
    register(&app, "u1", "Lin").await;

    let (status, body) = award(&app, "u1", "talk-1", "academic").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pointsAwarded"], 15);
    assert_eq!(body["data"]["newCategory"], true);

    let (_, body) = award(&app, "u1", "talk-2", "academic").await;
    assert_eq!(body["data"]["pointsAwarded"], 10);
    assert_eq!(body["data"]["newCategory"], false);

    let (_, body) = award(&app, "u1", "talk-2", "academic").await;
    assert_eq!(body["data"]["pointsAwarded"], 5);
    assert_eq!(body["data"]["entry"]["isRepeat"], true);
    assert_eq!(body["data"]["balance"], 30);

    let (status, body) = send(&app, "GET", "/api/v1/users/u1/points", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["balance"], 30);
    assert_eq!(body["data"]["lifetimePoints"], 30);
    assert_eq!(body["data"]["categories"][0]["category"], "academic");
    assert_eq!(body["data"]["categories"][0]["awardCount"], 3);
}

#[tokio::test]
async fn test_award_invalid_category() {
    let app = create_test_app();
    register(&app, "u1", "Lin").await;

    let (status, body) = award(&app, "u1", "evt-1", "partying").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_CATEGORY");
}

#[tokio::test]
async fn test_award_unknown_user() {
    let app = create_test_app();

    let (status, body) = award(&app, "ghost", "evt-1", "social").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn test_points_history_newest_first() {
    let app = create_test_app();
    register(&app, "u1", "Lin").await;
    award(&app, "u1", "evt-1", "social").await;
    award(&app, "u1", "evt-2", "sports").await;
    award(&app, "u1", "evt-3", "career").await;

    let (status, body) = send(&app, "GET", "/api/v1/users/u1/points/history?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);

    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["eventId"], "evt-3");
    assert_eq!(entries[1]["eventId"], "evt-2");
}

// ==================== 奖品与兑换 ====================

#[tokio::test]
async fn test_redeem_deducts_exact_cost() {
    let app = create_test_app();
    register(&app, "u1", "Lin").await;
    award(&app, "u1", "evt-1", "social").await;
    award(&app, "u1", "evt-2", "sports").await;
    let reward_id = create_reward(&app, "Coffee Voucher", 20, None).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/rewards/{reward_id}/redeem"),
        Some(json!({ "userId": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["redemption"]["status"], "PENDING");
    assert_eq!(body["data"]["redemption"]["cost"], 20);

    let (_, body) = send(&app, "GET", "/api/v1/users/u1", None).await;
    assert_eq!(body["data"]["balance"], 10);
    assert_eq!(body["data"]["lifetimePoints"], 30);
}

#[tokio::test]
async fn test_redeem_insufficient_points_leaves_balance() {
    let app = create_test_app();
    register(&app, "u1", "Lin").await;
    award(&app, "u1", "evt-1", "social").await;
    let reward_id = create_reward(&app, "Hoodie", 100, None).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/rewards/{reward_id}/redeem"),
        Some(json!({ "userId": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_POINTS");

    let (_, body) = send(&app, "GET", "/api/v1/users/u1", None).await;
    assert_eq!(body["data"]["balance"], 15);
}

#[tokio::test]
async fn test_redeem_idempotency_header() {
    let app = create_test_app();
    register(&app, "u1", "Lin").await;
    award(&app, "u1", "evt-1", "social").await;
    let reward_id = create_reward(&app, "Sticker", 5, Some(10)).await;
    let uri = format!("/api/v1/rewards/{reward_id}/redeem");
    let headers = [("Idempotency-Key", "redeem-abc")];

    let (status, first) =
        send_with_headers(&app, "POST", &uri, Some(json!({ "userId": "u1" })), &headers).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["replayed"], false);

    let (status, second) =
        send_with_headers(&app, "POST", &uri, Some(json!({ "userId": "u1" })), &headers).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["replayed"], true);
    assert_eq!(
        first["data"]["redemption"]["id"],
        second["data"]["redemption"]["id"]
    );

    let (_, user) = send(&app, "GET", "/api/v1/users/u1", None).await;
    assert_eq!(user["data"]["balance"], 10);

    let (_, reward) = send(&app, "GET", &format!("/api/v1/rewards/{reward_id}"), None).await;
    assert_eq!(reward["data"]["stock"], 9);
}

#[tokio::test]
async fn test_redeem_unavailable_and_out_of_stock() {
    let app = create_test_app();
    register(&app, "u1", "Lin").await;
    award(&app, "u1", "evt-1", "social").await;

    let limited = create_reward(&app, "Signed Poster", 5, Some(1)).await;
    let uri = format!("/api/v1/rewards/{limited}/redeem");
    let (status, _) = send(&app, "POST", &uri, Some(json!({ "userId": "u1" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, "POST", &uri, Some(json!({ "userId": "u1" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "REWARD_OUT_OF_STOCK");

    let hidden = create_reward(&app, "Pen", 1, None).await;
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/v1/rewards/{hidden}/availability"),
        Some(json!({ "available": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["available"], false);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/rewards/{hidden}/redeem"),
        Some(json!({ "userId": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "REWARD_UNAVAILABLE");

    let (_, body) = send(&app, "GET", "/api/v1/rewards?availableOnly=true", None).await;
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Signed Poster".to_string()]);
}

#[tokio::test]
async fn test_fulfill_redemption_once() {
    let app = create_test_app();
    register(&app, "u1", "Lin").await;
    award(&app, "u1", "evt-1", "social").await;
    let reward_id = create_reward(&app, "Sticker", 5, None).await;

    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/v1/rewards/{reward_id}/redeem"),
        Some(json!({ "userId": "u1" })),
    )
    .await;
    let redemption_id = body["data"]["redemption"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/redemptions/{redemption_id}/fulfill");

    let (status, body) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "FULFILLED");

    let (status, body) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_REDEMPTION_STATUS");

    let (_, body) = send(&app, "GET", "/api/v1/users/u1/redemptions", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "POST", "/api/v1/redemptions/999/fulfill", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "REDEMPTION_NOT_FOUND");
}

#[tokio::test]
async fn test_get_unknown_reward() {
    let app = create_test_app();

    let (status, body) = send(&app, "GET", "/api/v1/rewards/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "REWARD_NOT_FOUND");
}

// ==================== 排行榜 ====================

#[tokio::test]
async fn test_leaderboard_order_and_tie_break() {
    let app = create_test_app();
    for (user_id, name) in [("carol", "Carol"), ("alice", "Alice"), ("bob", "Bob")] {
        register(&app, user_id, name).await;
    }
    // carol: 15 + 15 = 30, alice: 15, bob: 15
    award(&app, "carol", "evt-1", "social").await;
    award(&app, "carol", "evt-2", "sports").await;
    award(&app, "bob", "evt-1", "social").await;
    award(&app, "alice", "evt-3", "career").await;

    let (status, body) = send(&app, "GET", "/api/v1/leaderboard?page=1&pageSize=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);

    let items = body["data"]["items"].as_array().unwrap();
    let order: Vec<_> = items.iter().map(|e| e["userId"].as_str().unwrap()).collect();
    assert_eq!(order, vec!["carol", "alice", "bob"]);
    assert_eq!(items[0]["rank"], 1);
    assert_eq!(items[2]["rank"], 3);
    assert!(items
        .windows(2)
        .all(|w| w[0]["totalPoints"].as_i64() >= w[1]["totalPoints"].as_i64()));

    let (status, body) = send(&app, "GET", "/api/v1/leaderboard/users/bob", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rank"], 3);
}

#[tokio::test]
async fn test_leaderboard_ignores_redemptions_and_recompute() {
    let app = create_test_app();
    register(&app, "u1", "Lin").await;
    register(&app, "u2", "Mei").await;
    award(&app, "u1", "evt-1", "social").await;
    award(&app, "u1", "evt-2", "sports").await;
    let reward_id = create_reward(&app, "Mug", 25, None).await;
    send(
        &app,
        "POST",
        &format!("/api/v1/rewards/{reward_id}/redeem"),
        Some(json!({ "userId": "u1" })),
    )
    .await;

    let (status, body) = send(&app, "POST", "/api/v1/leaderboard/recompute", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["entries"], 1);

    let (_, body) = send(&app, "GET", "/api/v1/leaderboard/users/u1", None).await;
    assert_eq!(body["data"]["totalPoints"], 30);

    let (status, body) = send(&app, "GET", "/api/v1/leaderboard/users/u2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "LEADERBOARD_ENTRY_NOT_FOUND");
}

#[tokio::test]
async fn test_leaderboard_pagination() {
    let app = create_test_app();
    for i in 0..5 {
        let user_id = format!("user-{i}");
        register(&app, &user_id, &user_id).await;
        for j in 0..=i {
            award(&app, &user_id, &format!("evt-{j}"), "social").await;
        }
    }

    let (_, body) = send(&app, "GET", "/api/v1/leaderboard?page=2&pageSize=2", None).await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(body["data"]["totalPages"], 3);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["rank"], 3);
    assert_eq!(items[0]["userId"], "user-2");
}

#[tokio::test]
async fn test_leaderboard_huge_page_returns_empty_page() {
    let app = create_test_app();
    register(&app, "u1", "Lin").await;
    award(&app, "u1", "evt-1", "academic").await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/leaderboard?page=9223372036854775807&pageSize=100",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let app = create_test_app();
    register(&app, "u1", "Lin").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/points/award",
        Some(json!({ "userId": "u1", "eventId": "e1" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("category"));
}

#[tokio::test]
async fn test_malformed_path_and_query_use_error_envelope() {
    let app = create_test_app();

    let (status, body) = send(&app, "GET", "/api/v1/rewards/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(&app, "GET", "/api/v1/leaderboard?page=first", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
