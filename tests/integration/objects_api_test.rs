//! Integration tests for the admission middleware over the objects endpoint
//!
//! The upload path is the full guarded flow: meter-key resolution, declared
//! Content-Length admission, actual-size recording after the write.

use std::time::Duration;

use actix_web::{
    http::{header, StatusCode},
    test, web, App, HttpMessage, HttpRequest, HttpResponse,
};
use pretty_assertions::assert_eq;

use quotrak::middleware::{AmountSource, QuotaGuard};
use quotrak::models::{QuotaAction, QuotaStatus};
use quotrak::routes;
use quotrak::services::UsageService;

use crate::common::{fixtures, TestDb};

const FREE_STORAGE_LIMIT: i64 = 524_288_000;

#[actix_web::test]
async fn test_upload_and_download_roundtrip() {
    let db = TestDb::new().await;
    let engine = fixtures::test_engine(&db.pool);
    let user = fixtures::provision_user(&db.pool).await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = fixtures::test_config(dir.path().to_str().unwrap(), Duration::from_secs(60));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(engine))
            .app_data(web::Data::new(fixtures::no_alerts()))
            .configure(routes::objects::configure),
    )
    .await;

    let payload = b"hello quota world".to_vec();
    let req = test::TestRequest::post()
        .uri("/api/objects")
        .insert_header(("X-Meter-Key", user.meter_key.to_string()))
        .insert_header((header::CONTENT_LENGTH, payload.len().to_string()))
        .set_payload(payload.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(resp.headers().contains_key("x-quota-remaining"));
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["size"].as_i64().unwrap(), payload.len() as i64);
    let object_id = body["id"].as_str().unwrap().to_string();

    // Actual bytes were booked after the write
    let usage = UsageService::get(&db.pool, user.user_id)
        .await
        .expect("usage row must exist");
    assert_eq!(usage.storage_used_bytes, payload.len() as i64);

    let req = test::TestRequest::get()
        .uri(&format!("/api/objects/{}", object_id))
        .insert_header(("X-Meter-Key", user.meter_key.to_string()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = test::read_body(resp).await;
    assert_eq!(bytes.as_ref(), payload.as_slice());
}

#[actix_web::test]
async fn test_upload_denied_with_structured_402_when_exhausted() {
    let db = TestDb::new().await;
    let engine = fixtures::test_engine(&db.pool);
    let user = fixtures::provision_user(&db.pool).await;
    fixtures::set_counter(&db.pool, user.user_id, QuotaAction::Storage, FREE_STORAGE_LIMIT)
        .await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = fixtures::test_config(dir.path().to_str().unwrap(), Duration::from_secs(60));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(engine))
            .app_data(web::Data::new(fixtures::no_alerts()))
            .configure(routes::objects::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/objects")
        .insert_header(("X-Meter-Key", user.meter_key.to_string()))
        .insert_header((header::CONTENT_LENGTH, "1"))
        .set_payload(b"x".to_vec())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Quota Exceeded");
    assert_eq!(body["limitReached"], true);
    assert_eq!(body["remaining"], 0);

    // The denied request stored nothing and recorded nothing
    let usage = UsageService::get(&db.pool, user.user_id)
        .await
        .expect("usage row must exist");
    assert_eq!(usage.storage_used_bytes, FREE_STORAGE_LIMIT);
}

#[actix_web::test]
async fn test_upload_in_warning_zone_carries_advisory_header() {
    let db = TestDb::new().await;
    let engine = fixtures::test_engine(&db.pool);
    let user = fixtures::provision_user(&db.pool).await;
    // 80% of the Free storage limit
    let eighty_percent = FREE_STORAGE_LIMIT / 5 * 4;
    fixtures::set_counter(&db.pool, user.user_id, QuotaAction::Storage, eighty_percent).await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = fixtures::test_config(dir.path().to_str().unwrap(), Duration::from_secs(60));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(engine))
            .app_data(web::Data::new(fixtures::no_alerts()))
            .configure(routes::objects::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/objects")
        .insert_header(("X-Meter-Key", user.meter_key.to_string()))
        .insert_header((header::CONTENT_LENGTH, "4"))
        .set_payload(b"data".to_vec())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(
        resp.headers()
            .get("x-quota-warning")
            .and_then(|h| h.to_str().ok()),
        Some("true")
    );
}

// With the usage store unreachable the guard must reject, never pass the
// upload through unchecked
#[actix_web::test]
async fn test_upload_fails_closed_when_quota_is_unverifiable() {
    let db = TestDb::new().await;
    let store = std::sync::Arc::new(crate::common::MemoryUsageStore::new());
    store.set_failing(true);
    let engine = quotrak::services::QuotaEngine::new(store.clone());
    let user = fixtures::provision_user(&db.pool).await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = fixtures::test_config(dir.path().to_str().unwrap(), Duration::from_secs(60));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(engine))
            .app_data(web::Data::new(fixtures::no_alerts()))
            .configure(routes::objects::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/objects")
        .insert_header(("X-Meter-Key", user.meter_key.to_string()))
        .insert_header((header::CONTENT_LENGTH, "4"))
        .set_payload(b"data".to_vec())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "QuotaUnavailable");

    // Nothing was stored or counted for the rejected request
    let usage = UsageService::get(&db.pool, user.user_id)
        .await
        .expect("usage row must exist");
    assert_eq!(usage.storage_used_bytes, 0);
}

#[actix_web::test]
async fn test_upload_without_meter_key_is_unauthorized() {
    let db = TestDb::new().await;
    let engine = fixtures::test_engine(&db.pool);
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = fixtures::test_config(dir.path().to_str().unwrap(), Duration::from_secs(60));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(engine))
            .app_data(web::Data::new(fixtures::no_alerts()))
            .configure(routes::objects::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/objects")
        .insert_header((header::CONTENT_LENGTH, "4"))
        .set_payload(b"data".to_vec())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_objects_are_namespaced_per_user() {
    let db = TestDb::new().await;
    let engine = fixtures::test_engine(&db.pool);
    let owner = fixtures::provision_user(&db.pool).await;
    let other = fixtures::provision_user(&db.pool).await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = fixtures::test_config(dir.path().to_str().unwrap(), Duration::from_secs(60));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(engine))
            .app_data(web::Data::new(fixtures::no_alerts()))
            .configure(routes::objects::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/objects")
        .insert_header(("X-Meter-Key", owner.meter_key.to_string()))
        .insert_header((header::CONTENT_LENGTH, "6"))
        .set_payload(b"secret".to_vec())
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    let object_id = body["id"].as_str().unwrap().to_string();

    // Another user cannot address the owner's object
    let req = test::TestRequest::get()
        .uri(&format!("/api/objects/{}", object_id))
        .insert_header(("X-Meter-Key", other.meter_key.to_string()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// The guard's declared-units source, as a translation fronting endpoint
// would use it. The stub handler just echoes the attached status: the guard
// never increments on its own.
async fn translate_stub(req: HttpRequest) -> HttpResponse {
    match req.extensions().get::<QuotaStatus>() {
        Some(status) => HttpResponse::Ok().json(status),
        None => HttpResponse::InternalServerError().finish(),
    }
}

#[actix_web::test]
async fn test_header_amount_source_gates_declared_units() {
    let db = TestDb::new().await;
    let engine = fixtures::test_engine(&db.pool);
    let user = fixtures::provision_user(&db.pool).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(engine))
            .app_data(web::Data::new(fixtures::no_alerts()))
            .service(
                web::resource("/api/translations")
                    .wrap(QuotaGuard::new(
                        QuotaAction::Translation,
                        AmountSource::Header("x-translation-chars"),
                    ))
                    .route(web::post().to(translate_stub)),
            ),
    )
    .await;

    // Declared amount within the Free limit passes with the status attached
    let req = test::TestRequest::post()
        .uri("/api/translations")
        .insert_header(("X-Meter-Key", user.meter_key.to_string()))
        .insert_header(("x-translation-chars", "1000"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["allowed"], true);

    // Declared amount over the limit is rejected pre-flight
    let req = test::TestRequest::post()
        .uri("/api/translations")
        .insert_header(("X-Meter-Key", user.meter_key.to_string()))
        .insert_header(("x-translation-chars", "3000000"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);

    // Missing declaration is a validation error
    let req = test::TestRequest::post()
        .uri("/api/translations")
        .insert_header(("X-Meter-Key", user.meter_key.to_string()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // The guard checked three times and incremented nothing
    let usage = UsageService::get(&db.pool, user.user_id)
        .await
        .expect("usage row must exist");
    assert_eq!(usage.translation_chars_count, 0);
}
