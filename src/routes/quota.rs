use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::ServiceAuth;
use crate::error::AppResult;
use crate::models::QuotaAction;
use crate::services::{QuotaAlertService, QuotaEngine};

/// Request body for a quota check. Amount defaults to 0, which asks for the
/// user's current position without projecting a request onto it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaCheckRequest {
    pub user_id: Uuid,
    pub action: QuotaAction,
    #[serde(default)]
    pub amount: i64,
}

/// Request body for recording confirmed consumption
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordUsageRequest {
    pub user_id: Uuid,
    pub action: QuotaAction,
    pub amount: i64,
}

/// POST /api/quota/check - advisory admission decision
///
/// A denial is a valid outcome, not a failure: the decision comes back with
/// 200 and `allowed: false`. Store failures surface as 503.
pub async fn check_quota(
    engine: web::Data<QuotaEngine>,
    alerts: web::Data<QuotaAlertService>,
    body: web::Json<QuotaCheckRequest>,
    _auth: ServiceAuth,
) -> AppResult<HttpResponse> {
    let status = engine
        .check_quota(body.user_id, body.action, body.amount)
        .await?;

    if !status.allowed {
        alerts.notify_exhausted(body.user_id, body.action, &status);
    }

    Ok(HttpResponse::Ok().json(status))
}

/// POST /api/quota/record - book consumption after it actually happened
pub async fn record_usage(
    engine: web::Data<QuotaEngine>,
    body: web::Json<RecordUsageRequest>,
    _auth: ServiceAuth,
) -> AppResult<HttpResponse> {
    engine
        .record_usage(body.user_id, body.action, body.amount)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Configures the quota routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/quota")
            .route("/check", web::post().to(check_quota))
            .route("/record", web::post().to(record_usage)),
    );
}
