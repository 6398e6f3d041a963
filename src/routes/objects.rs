use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::MeterAuth;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::{AmountSource, QuotaGuard};
use crate::models::{QuotaAction, QuotaStatus};
use crate::objects;
use crate::services::QuotaEngine;

/// Response for a stored object
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub id: Uuid,
    pub size: i64,
    /// Admission decision the request passed, so callers can show how close
    /// to the limit they are
    pub quota: Option<QuotaStatus>,
}

/// POST /api/objects - Store an object (quota-guarded)
///
/// The guard admits the request on its declared Content-Length; the counter
/// is booked here with the bytes actually written, and only once the write
/// succeeded.
pub async fn upload_object(
    config: web::Data<Config>,
    engine: web::Data<QuotaEngine>,
    req: HttpRequest,
    auth: MeterAuth,
    body: Bytes,
) -> AppResult<HttpResponse> {
    if body.len() > config.storage.max_upload_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "Upload exceeds the {} byte limit",
            config.storage.max_upload_bytes
        )));
    }

    let object_id = Uuid::new_v4();
    let base_dir = objects::object_dir(config.storage.object_dir.as_deref());

    objects::store_object(&base_dir, auth.user.id, object_id, &body).await?;

    // Book the actual size. If the increment cannot land, drop the file
    // rather than leave stored bytes uncounted.
    if !body.is_empty() {
        if let Err(e) = engine
            .record_usage(auth.user.id, QuotaAction::Storage, body.len() as i64)
            .await
        {
            objects::delete_object(&base_dir, auth.user.id, object_id).await?;
            return Err(e);
        }
    }

    let quota = req.extensions().get::<QuotaStatus>().cloned();

    Ok(HttpResponse::Created().json(UploadResponse {
        id: object_id,
        size: body.len() as i64,
        quota,
    }))
}

/// GET /api/objects/{id} - Fetch one of the caller's objects
pub async fn download_object(
    config: web::Data<Config>,
    path: web::Path<Uuid>,
    auth: MeterAuth,
) -> AppResult<HttpResponse> {
    let object_id = path.into_inner();
    let base_dir = objects::object_dir(config.storage.object_dir.as_deref());

    let data = objects::read_object(&base_dir, auth.user.id, object_id).await?;

    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .body(data))
}

/// Configures the object routes. Only the upload is admission-gated;
/// downloads consume no quota.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/objects")
            .wrap(QuotaGuard::new(
                QuotaAction::Storage,
                AmountSource::ContentLength,
            ))
            .route(web::post().to(upload_object)),
    )
    .service(web::resource("/api/objects/{id}").route(web::get().to(download_object)));
}
