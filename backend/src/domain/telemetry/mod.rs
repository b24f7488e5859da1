//! Telemetry decoding: versioned wire shapes and the canonical record.

mod canonical;
mod normalize;
mod payload;

pub use canonical::{
    AnomalyReading, BatteryReading, CanonicalStatus, GpsFix, NetworkReading, ScratchReading,
    SleepReading, SleepSessionReading, WalkReading,
};
pub use normalize::{NormalizeError, normalize};
pub use payload::{FlatReport, NestedReport, PayloadError, PayloadShape, TelemetryReport};
