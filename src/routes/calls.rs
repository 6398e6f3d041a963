use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::auth::MeterAuth;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::metering::{CallState, EndReason, SessionController};
use crate::models::CallStatus;
use crate::services::CallService;

/// POST /api/calls - Start a metered call session
///
/// The controller runs the initial quota check; denial means no session and
/// a 402 for the caller. Once active, the session's terminal state is
/// persisted onto the audit row when the metering loop ends.
pub async fn start_call(
    pool: web::Data<DbPool>,
    controller: web::Data<SessionController>,
    auth: MeterAuth,
) -> AppResult<HttpResponse> {
    let call_id = Uuid::new_v4();
    let call = CallService::create(pool.get_ref(), call_id, auth.user.id).await?;

    let mut state_rx = match controller.start(call.id, auth.user.id).await {
        Ok(rx) => rx,
        Err(e) => {
            // The session never went active; keep the audit row honest
            let status = match &e {
                AppError::QuotaExceeded(_) => CallStatus::Exhausted,
                _ => CallStatus::Failed,
            };
            CallService::finish(pool.get_ref(), call.id, status, 0).await?;
            return Err(e);
        }
    };

    // Persist the terminal state when the metering loop ends
    let pool_clone = pool.get_ref().clone();
    let id = call.id;
    tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = state_rx.borrow().clone();
            if let CallState::Terminated {
                reason,
                minutes_charged,
            } = state
            {
                let status = match reason {
                    EndReason::HungUp => CallStatus::Ended,
                    EndReason::Exhausted => CallStatus::Exhausted,
                    EndReason::VerificationFailed => CallStatus::Failed,
                };
                if let Err(e) =
                    CallService::finish(&pool_clone, id, status, minutes_charged as i32).await
                {
                    log::error!("Failed to finalize call {}: {}", id, e);
                }
                break;
            }
        }
    });

    Ok(HttpResponse::Created().json(call))
}

/// GET /api/calls/{id} - Call session state
pub async fn get_call(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    auth: MeterAuth,
) -> AppResult<HttpResponse> {
    let call_id = path.into_inner();
    let call = CallService::get_by_id(pool.get_ref(), call_id).await?;

    if call.user_id != auth.user.id {
        return Err(AppError::NotFound(format!("Call {} not found", call_id)));
    }

    Ok(HttpResponse::Ok().json(call))
}

/// DELETE /api/calls/{id} - Hang up
///
/// Cancels the metering loop: no new tick starts, and at most one in-flight
/// increment completes. 409 when the session already ended.
pub async fn hang_up(
    pool: web::Data<DbPool>,
    controller: web::Data<SessionController>,
    path: web::Path<Uuid>,
    auth: MeterAuth,
) -> AppResult<HttpResponse> {
    let call_id = path.into_inner();
    let call = CallService::get_by_id(pool.get_ref(), call_id).await?;

    if call.user_id != auth.user.id {
        return Err(AppError::NotFound(format!("Call {} not found", call_id)));
    }

    controller.hang_up(call_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Configure call routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/calls")
            .route("", web::post().to(start_call))
            .route("/{id}", web::get().to(get_call))
            .route("/{id}", web::delete().to(hang_up)),
    );
}
