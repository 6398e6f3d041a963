use actix_web::{web, HttpResponse};

use crate::auth::ServiceAuth;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::CreateServiceToken;
use crate::services::ServiceTokenService;

/// GET /api/tokens - List service tokens
pub async fn list_tokens(pool: web::Data<DbPool>, _auth: ServiceAuth) -> AppResult<HttpResponse> {
    let tokens = ServiceTokenService::list(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(tokens))
}

/// POST /api/tokens - Create a new service token
pub async fn create_token(
    pool: web::Data<DbPool>,
    body: web::Json<CreateServiceToken>,
    _auth: ServiceAuth,
) -> AppResult<HttpResponse> {
    let token = ServiceTokenService::create(pool.get_ref(), body.into_inner()).await?;

    Ok(HttpResponse::Created().json(token))
}

/// DELETE /api/tokens/{id} - Revoke a service token
pub async fn delete_token(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    _auth: ServiceAuth,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    ServiceTokenService::delete(pool.get_ref(), id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Configure token routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/tokens")
            .route("", web::get().to(list_tokens))
            .route("", web::post().to(create_token))
            .route("/{id}", web::delete().to(delete_token)),
    );
}
