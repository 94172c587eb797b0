//! Per-device-family converters.
//!
//! fromZigbee converters turn a [`lumi_core::ReportMessage`] into a
//! [`lumi_core::NormalizedPayload`]; toZigbee converters turn a user
//! command into a [`lumi_core::WriteRequest`]. Neither side talks to the
//! radio: sending is the host's job.

use thiserror::Error;

use lumi_codec::feeder::FeederError;
use lumi_codec::region::RegionError;
use lumi_codec::trv::ScheduleError;

pub mod basic;
pub mod cube;
pub mod feeder;
pub mod presence;
pub mod trv;

/// Why a user command could not be turned into a write.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The command value is not one this device accepts
    #[error("unsupported value for {key}: {value}")]
    UnsupportedValue { key: &'static str, value: String },
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Region(#[from] RegionError),
    #[error(transparent)]
    Feeder(#[from] FeederError),
}
