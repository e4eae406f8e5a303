/// Correlation middleware
///
/// Accepts an `X-Correlation-ID` header or assigns a fresh one, opens a
/// per-request tracing span carrying it, and logs completion with latency.
/// Events emitted anywhere below (handlers, services, stores) inherit the
/// span fields, so one id ties the whole request together.
use std::rc::Rc;
use std::time::Instant;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error,
};
use futures::future::LocalBoxFuture;
use tracing::Instrument;
use uuid::Uuid;

const CORRELATION_HEADER: &str = "x-correlation-id";

pub struct CorrelationMiddleware;

impl<S, B> Transform<S, ServiceRequest> for CorrelationMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = CorrelationMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(CorrelationMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct CorrelationMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for CorrelationMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let correlation_id = req
            .headers()
            .get(CORRELATION_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let start_time = Instant::now();
        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            method = %req.method(),
            path = %req.path(),
        );

        let service = self.service.clone();

        Box::pin(
            async move {
                match service.call(req).await {
                    Ok(mut res) => {
                        if let Ok(value) = HeaderValue::from_str(&correlation_id) {
                            res.headers_mut()
                                .insert(HeaderName::from_static(CORRELATION_HEADER), value);
                        }

                        tracing::info!(
                            status = res.status().as_u16(),
                            elapsed_ms = start_time.elapsed().as_millis() as u64,
                            "Request completed"
                        );
                        Ok(res)
                    }
                    Err(e) => {
                        tracing::warn!(
                            elapsed_ms = start_time.elapsed().as_millis() as u64,
                            error = %e,
                            "Request failed"
                        );
                        Err(e)
                    }
                }
            }
            .instrument(span),
        )
    }
}
