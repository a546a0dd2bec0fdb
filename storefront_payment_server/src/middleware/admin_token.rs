//! Admin token middleware for Actix Web.
//!
//! Staff tools (e.g. the manual payment status override) present a shared secret in the `X-Admin-Token` header. This
//! middleware compares it against the configured [`AdminToken`], which must be registered as app data.
//!
//! If no admin token is configured, every request through this middleware is refused.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use sfp_common::Secret;

use crate::errors::ServerError;

pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// The shared secret for admin-only routes.
#[derive(Clone, Debug, Default)]
pub struct AdminToken(pub Secret<String>);

pub struct AdminTokenMiddlewareFactory {
    header: String,
}

impl AdminTokenMiddlewareFactory {
    pub fn new() -> Self {
        Self::with_header(ADMIN_TOKEN_HEADER)
    }

    pub fn with_header(header: &str) -> Self {
        AdminTokenMiddlewareFactory { header: header.into() }
    }
}

impl Default for AdminTokenMiddlewareFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminTokenMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AdminTokenMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminTokenMiddlewareService { header: self.header.clone(), service: Rc::new(service) }))
    }
}

pub struct AdminTokenMiddlewareService<S> {
    header: String,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AdminTokenMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let header = self.header.clone();
        Box::pin(async move {
            trace!("🔐️ Checking admin token for {}", req.path());
            let token = req.app_data::<web::Data<AdminToken>>().ok_or_else(|| {
                warn!("🔐️ No admin token was registered with the server. Denying access.");
                ServerError::BackendError("Admin token is not configured.".into())
            })?;
            if !token.0.is_set() {
                warn!("🔐️ Admin override attempted, but SFP_ADMIN_TOKEN is not set. Denying access.");
                return Err(ServerError::InsufficientPermissions("Admin access is disabled.".into()).into());
            }
            let presented = req.headers().get(&header).and_then(|v| v.to_str().ok()).ok_or_else(|| {
                warn!("🔐️ No admin token found in request. Denying access.");
                ServerError::InsufficientPermissions("No admin token found.".into())
            })?;
            if token.0.matches(presented) {
                trace!("🔐️ Admin token check for request ✅️");
                service.call(req).await
            } else {
                warn!("🔐️ Invalid admin token found in request. Denying access.");
                Err(ServerError::InsufficientPermissions("Invalid admin token.".into()).into())
            }
        })
    }
}
