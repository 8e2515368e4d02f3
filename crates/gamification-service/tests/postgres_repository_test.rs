//! PostgreSQL 仓储集成测试
//!
//! 需要真实数据库，默认忽略。
//!
//! ## 运行方式
//!
//! ```bash
//! DATABASE_URL=postgres://... \
//!   cargo test -p campus-gamification-service --test postgres_repository_test -- --ignored
//! ```

use campus_gamification::{
    AppState, GamificationError, PointsCalculator,
    models::{NewReward, NewUser},
};
use campus_shared::database::Database;
use sqlx::PgPool;
use uuid::Uuid;

// ==================== 辅助函数 ====================

fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests")
}

async fn setup() -> (AppState, PgPool) {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    let db = Database::from_pool(pool.clone());
    db.run_migrations().await.unwrap();
    db.verify_collections().await.unwrap();
    (AppState::postgres(db, PointsCalculator::default()), pool)
}

/// 每个测试使用唯一的用户 ID，避免测试间互相影响
fn unique_user_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

async fn register(state: &AppState, user_id: &str) {
    state
        .user_service
        .register(NewUser {
            user_id: user_id.to_string(),
            display_name: "Integration".to_string(),
            email: None,
        })
        .await
        .unwrap();
}

// ==================== 测试 ====================

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_award_updates_all_collections() {
    let (state, pool) = setup().await;
    let user_id = unique_user_id("award");
    register(&state, &user_id).await;

    let first = state
        .points_service
        .award_points(&user_id, "evt-1", "academic")
        .await
        .unwrap();
    let repeat = state
        .points_service
        .award_points(&user_id, "evt-1", "academic")
        .await
        .unwrap();

    assert_eq!(first.points_awarded, 15);
    assert_eq!(repeat.points_awarded, 5);
    assert_eq!(repeat.balance, 20);

    let history_sum: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(points), 0)::BIGINT FROM points_history WHERE user_id = $1",
    )
    .bind(&user_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(history_sum, 20);

    let summary = state
        .user_service
        .get_points_summary(&user_id)
        .await
        .unwrap();
    assert_eq!(summary.categories.len(), 1);
    assert_eq!(summary.categories[0].award_count, 2);

    let standing = state
        .leaderboard_service
        .get_user_standing(&user_id)
        .await
        .unwrap();
    assert_eq!(standing.total_points, 20);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_duplicate_registration() {
    let (state, _pool) = setup().await;
    let user_id = unique_user_id("dup");
    register(&state, &user_id).await;

    let err = state
        .user_service
        .register(NewUser {
            user_id: user_id.clone(),
            display_name: "Again".to_string(),
            email: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, GamificationError::UserAlreadyExists(_)));
}

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_redeem_is_atomic_and_idempotent() {
    let (state, _pool) = setup().await;
    let user_id = unique_user_id("redeem");
    register(&state, &user_id).await;
    state
        .points_service
        .award_points(&user_id, "evt-1", "social")
        .await
        .unwrap();

    let reward = state
        .reward_service
        .create_reward(NewReward {
            name: "Bookmark".to_string(),
            description: None,
            cost: 10,
            available: true,
            stock: Some(1),
        })
        .await
        .unwrap();
    let key = unique_user_id("key");

    let first = state
        .reward_service
        .redeem(&user_id, reward.id, Some(key.clone()))
        .await
        .unwrap();
    let replay = state
        .reward_service
        .redeem(&user_id, reward.id, Some(key))
        .await
        .unwrap();
    assert!(replay.replayed);
    assert_eq!(first.redemption.id, replay.redemption.id);

    let user = state.user_service.get_user(&user_id).await.unwrap();
    assert_eq!(user.balance, 5);

    let err = state
        .reward_service
        .redeem(&user_id, reward.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GamificationError::RewardOutOfStock(_)));

    let fulfilled = state
        .reward_service
        .fulfill_redemption(first.redemption.id)
        .await
        .unwrap();
    assert_eq!(fulfilled.status, campus_gamification::RedemptionStatus::Fulfilled);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_stale_refresh_keeps_highest_total() {
    let (state, _pool) = setup().await;
    let user_id = unique_user_id("stale");
    register(&state, &user_id).await;
    let first = state
        .points_service
        .award_points(&user_id, "evt-1", "academic")
        .await
        .unwrap();
    state
        .points_service
        .award_points(&user_id, "evt-2", "academic")
        .await
        .unwrap();

    state
        .leaderboard_service
        .refresh_user(&user_id, "Integration", first.lifetime_points)
        .await
        .unwrap();

    let standing = state
        .leaderboard_service
        .get_user_standing(&user_id)
        .await
        .unwrap();
    assert_eq!(standing.total_points, 25);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_readiness_uses_database() {
    let (state, _pool) = setup().await;
    let database = state.database.as_ref().unwrap();
    assert!(database.health_check().await.is_ok());
}
