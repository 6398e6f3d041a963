use actix_web::{dev::Payload, web, FromRequest, HttpMessage, HttpRequest};
use std::future::Future;
use std::pin::Pin;

use crate::auth::token::is_valid_token_format;
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::{ServiceToken, User};
use crate::services::{ServiceTokenService, UsersService};

/// Extractor for Bearer service-token authentication (service plane).
///
/// Usage in handlers:
/// ```ignore
/// async fn my_handler(auth: ServiceAuth) -> HttpResponse {
///     // auth.token contains the validated ServiceToken
/// }
/// ```
pub struct ServiceAuth {
    #[allow(dead_code)] // Available for handlers that need token details
    pub token: ServiceToken,
}

impl FromRequest for ServiceAuth {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let pool = match req.app_data::<web::Data<DbPool>>().cloned() {
            Some(pool) => pool,
            None => {
                return Box::pin(async {
                    Err(AppError::Internal(
                        "Database pool not configured".to_string(),
                    ))
                });
            }
        };

        let auth_header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        Box::pin(async move {
            let header = auth_header.ok_or_else(|| {
                AppError::Unauthorized("Missing Authorization header".to_string())
            })?;

            if !header.starts_with("Bearer ") {
                return Err(AppError::Unauthorized(
                    "Invalid Authorization header format, expected 'Bearer <token>'".to_string(),
                ));
            }

            let token_str = header["Bearer ".len()..].trim();

            if !is_valid_token_format(token_str) {
                return Err(AppError::Unauthorized(
                    "Malformed service token, must be 40 lowercase hex chars".to_string(),
                ));
            }

            // Lookup token in database
            let token = ServiceTokenService::get_by_token(pool.get_ref(), token_str)
                .await?
                .ok_or_else(|| AppError::Unauthorized("Invalid service token".to_string()))?;

            // Update last_used_at asynchronously (fire and forget)
            let pool_clone = pool.clone();
            let token_id = token.id;
            tokio::spawn(async move {
                let _ = ServiceTokenService::update_last_used(pool_clone.get_ref(), token_id).await;
            });

            Ok(ServiceAuth { token })
        })
    }
}

/// Extractor for meter-key authentication (user plane).
///
/// Resolves the `X-Meter-Key` header to the owning user. When the quota
/// guard middleware already resolved the caller, the cached user is reused
/// instead of a second lookup.
///
/// Usage in handlers:
/// ```ignore
/// async fn my_handler(auth: MeterAuth) -> HttpResponse {
///     // auth.user is the authenticated metered user
/// }
/// ```
pub struct MeterAuth {
    pub user: User,
}

impl FromRequest for MeterAuth {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Resolved upstream by the quota guard?
        if let Some(user) = req.extensions().get::<User>().cloned() {
            return Box::pin(async move { Ok(MeterAuth { user }) });
        }

        let pool = match req.app_data::<web::Data<DbPool>>().cloned() {
            Some(pool) => pool,
            None => {
                return Box::pin(async {
                    Err(AppError::Internal(
                        "Database pool not configured".to_string(),
                    ))
                });
            }
        };

        let header_key = req
            .headers()
            .get("X-Meter-Key")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        Box::pin(async move {
            let key_str = header_key
                .ok_or_else(|| AppError::Unauthorized("Missing X-Meter-Key header".to_string()))?;

            let meter_key: uuid::Uuid = key_str
                .parse()
                .map_err(|_| AppError::Unauthorized("Invalid meter key format".to_string()))?;

            let user = UsersService::get_by_meter_key(pool.get_ref(), meter_key)
                .await?
                .ok_or_else(|| AppError::Unauthorized("Unknown meter key".to_string()))?;

            Ok(MeterAuth { user })
        })
    }
}
