//! Shared harness for the HTTP integration suites.
//!
//! Wires the real domain services over [`InMemoryStore`] so requests travel
//! the full handler, service and port stack without a database.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test, web};
use chrono::{DateTime, TimeZone, Utc};
use collar_gateway::domain::{
    DeviceQueryService, SignatureVerifier, TelemetryIngestionService, WalkSessionService,
};
use collar_gateway::inbound::http::configure;
use collar_gateway::inbound::http::state::HttpState;
use collar_gateway::test_support::{FixtureClock, InMemoryStore};
use serde_json::Value;

/// Morning of the fixture day, in UTC.
pub fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Store, clock and state behind one test app.
pub struct Gateway {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixtureClock>,
    pub state: HttpState,
}

impl Gateway {
    pub fn new(verifier: SignatureVerifier) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixtureClock::at(morning()));
        let telemetry = TelemetryIngestionService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
            verifier,
            clock.clone(),
        );
        let walks = WalkSessionService::new(Arc::clone(&store), Arc::clone(&store), clock.clone());
        let devices = DeviceQueryService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
            clock.clone(),
        );
        let state = HttpState::new(Arc::new(telemetry), Arc::new(walks), Arc::new(devices));
        Self {
            store,
            clock,
            state,
        }
    }

    pub fn unsigned() -> Self {
        Self::new(SignatureVerifier::disabled())
    }
}

/// Build the routed app over `state`.
pub async fn init_app(
    state: HttpState,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure),
    )
    .await
}

/// Response status and JSON body.
pub async fn call_json<S, B>(app: &S, req: test::TestRequest) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(app, req.to_request()).await;
    let status = res.status().as_u16();
    let bytes = test::read_body(res).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}
