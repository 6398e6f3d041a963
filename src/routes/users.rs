use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::auth::ServiceAuth;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{ProvisionUser, SetSubscription};
use crate::services::{QuotaEngine, SubscriptionService, UsageService, UsersService};

/// POST /api/users - Provision a metered user
///
/// Creates the identity row, zeroed usage counters, and a Free active
/// subscription in one transaction. The response is the only place the
/// meter key is ever returned.
pub async fn provision_user(
    pool: web::Data<DbPool>,
    body: web::Json<ProvisionUser>,
    _auth: ServiceAuth,
) -> AppResult<HttpResponse> {
    let provisioned = UsersService::provision(pool.get_ref(), body.user_id).await?;

    Ok(HttpResponse::Created().json(provisioned))
}

/// GET /api/users/{id}/subscription - Current subscription row
pub async fn get_subscription(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    _auth: ServiceAuth,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    let subscription = SubscriptionService::get(pool.get_ref(), user_id).await?;

    Ok(HttpResponse::Ok().json(subscription))
}

/// PUT /api/users/{id}/subscription - Set tier and status
pub async fn set_subscription(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<SetSubscription>,
    _auth: ServiceAuth,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();

    // Distinguish "unknown user" from a foreign-key failure
    UsersService::get_by_id(pool.get_ref(), user_id).await?;

    let subscription =
        SubscriptionService::set(pool.get_ref(), user_id, body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(subscription))
}

/// GET /api/users/{id}/usage - Usage summary for any user (service plane)
pub async fn get_user_usage(
    engine: web::Data<QuotaEngine>,
    path: web::Path<Uuid>,
    _auth: ServiceAuth,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    let summary = engine.usage_summary(user_id).await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// POST /api/users/{id}/usage/reset - Period rollover
pub async fn reset_usage(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    _auth: ServiceAuth,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    UsageService::reset_period(pool.get_ref(), user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Configure user routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/users")
            .route("", web::post().to(provision_user))
            .route("/{id}/subscription", web::get().to(get_subscription))
            .route("/{id}/subscription", web::put().to(set_subscription))
            .route("/{id}/usage", web::get().to(get_user_usage))
            .route("/{id}/usage/reset", web::post().to(reset_usage)),
    );
}
