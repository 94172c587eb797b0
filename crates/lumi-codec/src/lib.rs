//! Binary codecs for Lumi / Aqara vendor protocols.
//!
//! Everything in this crate is a pure function over byte buffers:
//!
//! - [`miot`] — the type-tagged "miot struct" buffer format used for
//!   heartbeats and composite config reports
//! - [`trv`] — the thermostat weekly-schedule record (26 bytes) with its
//!   human-readable string form, and the vendor firmware version scheme
//! - [`region`] — the presence-sensor detection-region commands (7 bytes)
//! - [`feeder`] — the pet-feeder tunnel frames carried on attribute 0xFFF1
//!
//! Decode anomalies never raise; they are reported through the
//! [`lumi_core::DiagnosticSink`] and the offending record is skipped.
//! Validation of user-supplied configuration returns typed errors instead.

pub mod feeder;
pub mod miot;
pub mod region;
pub mod trv;

pub use feeder::{build_feeder_frame, parse_feeder_frame, FeederFrame};
pub use miot::decode_miot_struct;
pub use region::{RegionDefinition, RegionError, RegionEvent, Zone};
pub use trv::{Day, ScheduleConfig, ScheduleError, ScheduleEvent};
