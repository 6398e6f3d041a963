use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue, CONTENT_LENGTH},
    web, Error, HttpMessage, ResponseError,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::QuotaAction;
use crate::services::{QuotaAlertService, QuotaEngine, UsersService};

/// How the guard derives the unit count a request intends to consume.
/// A closed set: new strategies are added here, not as ad-hoc conditionals
/// at call sites.
#[derive(Debug, Clone, Copy)]
pub enum AmountSource {
    /// Declared body size from the Content-Length header (uploads)
    ContentLength,
    /// Caller-declared unit count in the named header (e.g. character
    /// counts for translation fronting endpoints). The name must be a
    /// lowercase static string.
    Header(&'static str),
    /// One unit per request (e.g. starting a call)
    PerRequest,
}

impl AmountSource {
    fn amount(self, req: &ServiceRequest) -> Result<i64, AppError> {
        let (header, label) = match self {
            AmountSource::PerRequest => return Ok(1),
            AmountSource::ContentLength => (CONTENT_LENGTH, "Content-Length"),
            AmountSource::Header(name) => (HeaderName::from_static(name), name),
        };

        let value: i64 = req
            .headers()
            .get(&header)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                AppError::Validation(format!("Missing or invalid {} header", label))
            })?;

        if value < 0 {
            return Err(AppError::Validation(format!(
                "{} must not be negative",
                label
            )));
        }

        Ok(value)
    }
}

/// Admission gate for single-shot resource-consuming endpoints.
///
/// Pre-flights the quota check before the handler runs. Exhausted quota is
/// rejected with a structured 402; an unverifiable quota (store down) is
/// rejected with 503, so the guarded operation never runs unchecked. The
/// check is advisory and does not increment: the handler records actual
/// consumption once it succeeds.
pub struct QuotaGuard {
    action: QuotaAction,
    amount: AmountSource,
}

impl QuotaGuard {
    pub fn new(action: QuotaAction, amount: AmountSource) -> Self {
        Self { action, amount }
    }
}

impl<S, B> Transform<S, ServiceRequest> for QuotaGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = QuotaGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(QuotaGuardMiddleware {
            service: Rc::new(service),
            action: self.action,
            amount: self.amount,
        }))
    }
}

pub struct QuotaGuardMiddleware<S> {
    service: Rc<S>,
    action: QuotaAction,
    amount: AmountSource,
}

impl<S, B> Service<ServiceRequest> for QuotaGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let action = self.action;
        let amount_source = self.amount;

        Box::pin(async move {
            let pool = match req.app_data::<web::Data<DbPool>>().cloned() {
                Some(pool) => pool,
                None => {
                    return short_circuit(
                        req,
                        AppError::Internal("Database pool not configured".to_string()),
                    );
                }
            };
            let engine = match req.app_data::<web::Data<QuotaEngine>>().cloned() {
                Some(engine) => engine,
                None => {
                    return short_circuit(
                        req,
                        AppError::Internal("Quota engine not configured".to_string()),
                    );
                }
            };
            let alerts = req.app_data::<web::Data<QuotaAlertService>>().cloned();

            // Resolve the caller from the meter key
            let meter_key = req
                .headers()
                .get("X-Meter-Key")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<uuid::Uuid>().ok());

            let meter_key = match meter_key {
                Some(key) => key,
                None => {
                    return short_circuit(
                        req,
                        AppError::Unauthorized(
                            "Missing or invalid X-Meter-Key header".to_string(),
                        ),
                    );
                }
            };

            let user = match UsersService::get_by_meter_key(pool.get_ref(), meter_key).await {
                Ok(Some(user)) => user,
                Ok(None) => {
                    return short_circuit(
                        req,
                        AppError::Unauthorized("Unknown meter key".to_string()),
                    );
                }
                Err(e) => return short_circuit(req, e),
            };

            let amount = match amount_source.amount(&req) {
                Ok(amount) => amount,
                Err(e) => return short_circuit(req, e),
            };

            // Pre-flight check. Store failures propagate as rejections:
            // never let a metered operation run when quota cannot be verified.
            let status = match engine.check_quota(user.id, action, amount).await {
                Ok(status) => status,
                Err(e) => return short_circuit(req, e),
            };

            if !status.allowed {
                log::warn!(
                    "Quota exceeded for user {} ({}): {:.1}% used",
                    user.id,
                    action,
                    status.usage_percent
                );
                if let Some(alerts) = alerts {
                    alerts.notify_exhausted(user.id, action, &status);
                }
                return short_circuit(req, AppError::QuotaExceeded(status));
            }

            let remaining = status.remaining;
            let in_warning_zone = status.is_warning_zone;

            // Hand the resolved caller and decision to the handler
            req.extensions_mut().insert(user);
            req.extensions_mut().insert(status);

            let mut res = service.call(req).await?;

            if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
                res.headers_mut()
                    .insert(HeaderName::from_static("x-quota-remaining"), value);
            }
            if in_warning_zone {
                res.headers_mut().insert(
                    HeaderName::from_static("x-quota-warning"),
                    HeaderValue::from_static("true"),
                );
            }

            Ok(res.map_into_left_body())
        })
    }
}

/// Rejects the request without invoking the wrapped service
fn short_circuit<B>(
    req: ServiceRequest,
    err: AppError,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let (http_req, _) = req.into_parts();
    let response = err.error_response();
    Ok(ServiceResponse::new(http_req, response).map_into_right_body())
}
