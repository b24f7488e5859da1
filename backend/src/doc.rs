//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every gateway endpoint together with the schema
//! mirrors from `inbound::http::schemas`, so domain types stay free of
//! utoipa derives. The document is served by Swagger UI in debug builds and
//! printed by `cargo run --bin openapi-dump`.

use crate::inbound::http::devices::WalkHistoryBody;
use crate::inbound::http::health::{HealthReport, SignatureStatus, StoreStatus};
use crate::inbound::http::schemas::{
    DeviceStatusSnapshotSchema, ErrorCodeSchema, ErrorSchema, GradeCountsSchema,
    GradeLetterSchema, LocationHistorySchema, LocationRecordSchema, ScratchDailySchema,
    ScratchHistorySchema, ScratchSummarySchema, SleepHistorySchema, SleepSessionSchema,
    SleepSummarySchema, StatsSourceSchema, WalkSourceSchema, WalkSummarySchema,
    WalkerStatsSchema,
};
use crate::inbound::http::telemetry::TelemetryAcceptedBody;
use crate::inbound::http::walks::{
    EndWalkRequestBody, EndWalkResponseBody, StartWalkResponseBody, WalkSessionBody,
};
use utoipa::OpenApi;

/// OpenAPI document for the gateway.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Collar telemetry gateway",
        description = "Ingests collar reports and serves device status, history and walk grades."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::telemetry::ingest_telemetry,
        crate::inbound::http::devices::device_status,
        crate::inbound::http::devices::device_locations,
        crate::inbound::http::devices::device_sleep,
        crate::inbound::http::devices::device_scratches,
        crate::inbound::http::devices::device_walks,
        crate::inbound::http::devices::walker_stats,
        crate::inbound::http::walks::start_walk,
        crate::inbound::http::walks::end_walk,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        TelemetryAcceptedBody,
        DeviceStatusSnapshotSchema,
        LocationRecordSchema,
        LocationHistorySchema,
        SleepSessionSchema,
        SleepSummarySchema,
        SleepHistorySchema,
        ScratchDailySchema,
        ScratchSummarySchema,
        ScratchHistorySchema,
        GradeLetterSchema,
        GradeCountsSchema,
        WalkSourceSchema,
        WalkSummarySchema,
        StatsSourceSchema,
        WalkerStatsSchema,
        WalkSessionBody,
        WalkHistoryBody,
        StartWalkResponseBody,
        EndWalkRequestBody,
        EndWalkResponseBody,
        HealthReport,
        StoreStatus,
        SignatureStatus,
    )),
    tags(
        (name = "telemetry", description = "Collar report ingestion"),
        (name = "devices", description = "Device status and history"),
        (name = "walks", description = "Client-driven walk sessions"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
