use actix_web::{web, HttpResponse};

use crate::auth::MeterAuth;
use crate::error::AppResult;
use crate::services::QuotaEngine;

/// GET /api/usage - Own usage summary (user plane, dashboard feed)
pub async fn get_own_usage(
    engine: web::Data<QuotaEngine>,
    auth: MeterAuth,
) -> AppResult<HttpResponse> {
    let summary = engine.usage_summary(auth.user.id).await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// Configure usage routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/usage").route(web::get().to(get_own_usage)));
}
