//! Integration tests for the service-plane quota API

use actix_web::{http::StatusCode, test, web, App};
use pretty_assertions::assert_eq;
use serde_json::json;

use quotrak::models::{PlanTier, QuotaAction};
use quotrak::routes;

use crate::common::{fixtures, TestDb};

const FREE_TRANSLATION_LIMIT: i64 = 2_000_000;

#[actix_web::test]
async fn test_check_requires_service_token() {
    let db = TestDb::new().await;
    let engine = fixtures::test_engine(&db.pool);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(engine))
            .app_data(web::Data::new(fixtures::no_alerts()))
            .configure(routes::quota::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/quota/check")
        .set_json(json!({"userId": uuid::Uuid::new_v4(), "action": "CALL"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/quota/check")
        .insert_header(("Authorization", "Bearer not-a-real-token"))
        .set_json(json!({"userId": uuid::Uuid::new_v4(), "action": "CALL"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_check_returns_decision_fields() {
    let db = TestDb::new().await;
    let engine = fixtures::test_engine(&db.pool);
    let token = fixtures::create_service_token(&db.pool).await;
    let user = fixtures::provision_user(&db.pool).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(engine))
            .app_data(web::Data::new(fixtures::no_alerts()))
            .configure(routes::quota::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/quota/check")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "userId": user.user_id,
            "action": "TRANSLATION",
            "amount": 5
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["allowed"], true);
    assert_eq!(
        body["remaining"].as_i64().unwrap(),
        FREE_TRANSLATION_LIMIT - 5
    );
    assert_eq!(body["usagePercent"], 0.0);
    assert_eq!(body["isWarningZone"], false);
}

// A denial is a decision, not a failure: HTTP 200 with allowed = false
#[actix_web::test]
async fn test_denied_check_is_200_with_allowed_false() {
    let db = TestDb::new().await;
    let engine = fixtures::test_engine(&db.pool);
    let token = fixtures::create_service_token(&db.pool).await;
    let user = fixtures::provision_user(&db.pool).await;
    fixtures::set_counter(
        &db.pool,
        user.user_id,
        QuotaAction::Translation,
        FREE_TRANSLATION_LIMIT,
    )
    .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(engine))
            .app_data(web::Data::new(fixtures::no_alerts()))
            .configure(routes::quota::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/quota/check")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "userId": user.user_id,
            "action": "TRANSLATION",
            "amount": 1
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["allowed"], false);
    assert_eq!(body["remaining"], 0);
    assert_eq!(body["isWarningZone"], true);
}

#[actix_web::test]
async fn test_check_for_unprovisioned_user_is_an_integrity_error() {
    let db = TestDb::new().await;
    let engine = fixtures::test_engine(&db.pool);
    let token = fixtures::create_service_token(&db.pool).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(engine))
            .app_data(web::Data::new(fixtures::no_alerts()))
            .configure(routes::quota::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/quota/check")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "userId": uuid::Uuid::new_v4(),
            "action": "STORAGE",
            "amount": 1
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "NotProvisioned");
}

#[actix_web::test]
async fn test_record_then_summary_reflects_usage() {
    let db = TestDb::new().await;
    let engine = fixtures::test_engine(&db.pool);
    let token = fixtures::create_service_token(&db.pool).await;
    let user = fixtures::provision_user(&db.pool).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(engine))
            .app_data(web::Data::new(fixtures::no_alerts()))
            .configure(routes::quota::configure)
            .configure(routes::users::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/quota/record")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "userId": user.user_id,
            "action": "TRANSLATION",
            "amount": 500_000
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}/usage", user.user_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["translation"]["used"], 500_000);
    assert_eq!(body["translation"]["percentage"], 25.0);
    assert_eq!(body["translation"]["status"], "normal");
    assert_eq!(body["overallStatus"], "normal");
    assert_eq!(body["tier"], "Free");
}

#[actix_web::test]
async fn test_record_rejects_non_positive_amount() {
    let db = TestDb::new().await;
    let engine = fixtures::test_engine(&db.pool);
    let token = fixtures::create_service_token(&db.pool).await;
    let user = fixtures::provision_user(&db.pool).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(engine))
            .app_data(web::Data::new(fixtures::no_alerts()))
            .configure(routes::quota::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/quota/record")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "userId": user.user_id,
            "action": "STORAGE",
            "amount": 0
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_tier_change_takes_effect_on_next_check() {
    let db = TestDb::new().await;
    let engine = fixtures::test_engine(&db.pool);
    let token = fixtures::create_service_token(&db.pool).await;
    let user = fixtures::provision_user(&db.pool).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(engine))
            .app_data(web::Data::new(fixtures::no_alerts()))
            .configure(routes::quota::configure),
    )
    .await;

    // 3M chars is over the Free limit but well inside Premium's 5M
    let request_body = json!({
        "userId": user.user_id,
        "action": "TRANSLATION",
        "amount": 3_000_000
    });

    let req = test::TestRequest::post()
        .uri("/api/quota/check")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(&request_body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["allowed"], false);

    fixtures::set_tier(&db.pool, user.user_id, PlanTier::Premium).await;

    let req = test::TestRequest::post()
        .uri("/api/quota/check")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(&request_body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["allowed"], true);
}
