//! Premium-tier gate for the paid dashboard endpoints.
//!
//! The client declares its tier with the `X-TradeSage-Tier` header; only
//! `premium` passes. Demo deployments (`APP_MODE=demo`) skip the check so
//! local runs can exercise the paid widgets. Everything else gets 402.

use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    web, Error,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use futures_util::FutureExt;

use crate::config::settings::Settings;

pub const TIER_HEADER: &str = "X-TradeSage-Tier";

pub struct PremiumTier;

impl<S> Transform<S, ServiceRequest> for PremiumTier
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
{
    type Response  = ServiceResponse;
    type Error     = Error;
    type InitError = ();
    type Transform = PremiumTierMw<S>;
    type Future    = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, srv: S) -> Self::Future {
        ok(PremiumTierMw { inner: srv })
    }
}

pub struct PremiumTierMw<S> {
    inner: S,
}

impl<S> Service<ServiceRequest> for PremiumTierMw<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
{
    type Response = ServiceResponse;
    type Error    = Error;
    type Future   = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let is_premium = req
            .headers()
            .get(TIER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("premium"))
            .unwrap_or(false);

        let is_demo = req
            .app_data::<web::Data<Settings>>()
            .map(|s| s.is_demo())
            .unwrap_or(false);

        if is_premium || is_demo {
            let fut = self.inner.call(req);
            async move { fut.await }.boxed_local()
        } else {
            // rejected requests never reach the handler
            async move {
                Err(actix_web::error::ErrorPaymentRequired(
                    "premium subscription required",
                ))
            }
            .boxed_local()
        }
    }
}
