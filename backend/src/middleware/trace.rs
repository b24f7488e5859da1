//! Request correlation middleware.
//!
//! Companion apps may send a `trace-id` header so their logs line up with the
//! gateway's; collars never do. A well-formed incoming id is kept, anything
//! else is replaced by a fresh one. The id in effect is scoped over the
//! handler (see [`TraceId`]) and echoed on the response.

use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Instrument, debug, info_span, warn};

use crate::domain::{TRACE_ID_HEADER, TraceId};

/// Middleware factory.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use collar_gateway::middleware::Trace;
///
/// let app = App::new().wrap(Trace);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

/// Service produced by [`Trace`].
pub struct TraceMiddleware<S> {
    service: S,
}

fn incoming_trace_id(req: &ServiceRequest) -> Option<TraceId> {
    req.headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(TraceId::from_header)
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = incoming_trace_id(&req).unwrap_or_else(TraceId::generate);
        let span = info_span!(
            "request",
            trace_id = %trace_id,
            method = %req.method(),
            path = %req.path()
        );
        let started = Instant::now();
        // Created outside the scope but polled inside it, which is what counts.
        let fut = self.service.call(req);
        Box::pin(
            TraceId::scope(trace_id, async move {
                let mut res = fut.await?;
                match HeaderValue::from_str(&trace_id.to_string()) {
                    Ok(value) => {
                        res.headers_mut()
                            .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
                    }
                    Err(error) => warn!(%error, "trace id is not a valid header value"),
                }
                debug!(
                    status = res.status().as_u16(),
                    elapsed = ?started.elapsed(),
                    "request finished"
                );
                Ok(res)
            })
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Error as DomainError;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    async fn echo_current() -> HttpResponse {
        match TraceId::current() {
            Some(id) => HttpResponse::Ok().body(id.to_string()),
            None => HttpResponse::InternalServerError().finish(),
        }
    }

    async fn fail() -> Result<HttpResponse, DomainError> {
        Err(DomainError::internal("device_status: database error"))
    }

    async fn call(path: &str, header: Option<&str>) -> ServiceResponse {
        let app = test::init_service(
            App::new()
                .wrap(Trace)
                .route("/echo", web::get().to(echo_current))
                .route("/fail", web::get().to(fail)),
        )
        .await;
        let mut req = test::TestRequest::get().uri(path);
        if let Some(value) = header {
            req = req.insert_header((TRACE_ID_HEADER, value));
        }
        test::call_service(&app, req.to_request()).await
    }

    fn header_of(res: &ServiceResponse) -> String {
        res.headers()
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .expect("trace id header")
            .to_owned()
    }

    #[actix_web::test]
    async fn handler_sees_the_echoed_id() {
        let res = call("/echo", None).await;
        let echoed = header_of(&res);

        let body = test::read_body(res).await;
        assert_eq!(body, echoed.as_bytes());
    }

    #[actix_web::test]
    async fn caller_supplied_id_is_kept() {
        let supplied = "3f2b8c1e-9d4a-4f6e-8a7b-1c2d3e4f5a6b";

        let res = call("/echo", Some(supplied)).await;

        assert_eq!(header_of(&res), supplied);
    }

    #[rstest]
    #[case("collar-01")]
    #[case("00000000-0000-0000-0000-000000000000")]
    #[actix_web::test]
    async fn unusable_caller_id_is_replaced(#[case] supplied: &str) {
        let res = call("/echo", Some(supplied)).await;

        let echoed = header_of(&res);
        assert_ne!(echoed, supplied);
        assert!(TraceId::from_header(&echoed).is_some());
    }

    #[actix_web::test]
    async fn error_envelope_carries_the_id() {
        let res = call("/fail", None).await;
        let echoed = header_of(&res);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["traceId"].as_str(), Some(echoed.as_str()));
        assert_eq!(body["message"], "Internal server error");
    }
}
