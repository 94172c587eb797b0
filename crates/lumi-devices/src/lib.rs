//! Device-level semantics for Lumi / Aqara Zigbee devices.
//!
//! This crate turns raw attribute reports into normalized payloads and
//! user commands into attribute writes:
//!
//! - [`dispatch`] — the capability table mapping (model, attribute index)
//!   to an interpretation, with recursion over nested composite buffers
//! - [`catalog`] — per-model metadata (battery discharge curve)
//! - [`battery`] — voltage to percentage conversion curves
//! - [`converters`] — per-family fromZigbee / toZigbee converters built on
//!   top of the dispatch table and the [`lumi_codec`] codecs

pub mod battery;
pub mod catalog;
pub mod converters;
pub mod dispatch;

pub use battery::{voltage_to_percentage, VoltageCurve};
pub use catalog::{find_model, ModelMeta};
pub use converters::ConvertError;
pub use dispatch::{interpret, DecodeOptions, DecodeScope, MAX_NESTING_DEPTH};
