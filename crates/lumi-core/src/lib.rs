//! Shared vocabulary for the Lumi Zigbee converter layer.
//!
//! This crate defines the types that flow between the transport framework,
//! the binary codecs and the semantic dispatch layer:
//!
//! - **AttributeMap / AttrValue**: raw attribute reports as delivered by the
//!   transport (or produced by the vendor struct decoder)
//! - **NormalizedPayload**: the flat property map handed to the publish
//!   pipeline
//! - **DeviceContext**: the per-device mutable slot for cross-message state
//! - **DiagnosticSink**: typed sink for decode anomalies, so tests can
//!   assert on diagnostics without coupling to a logging framework
//! - **ReportMessage / WriteRequest**: the narrow interface to the Zigbee
//!   transport

pub mod context;
pub mod diagnostics;
pub mod value;
pub mod zigbee;

pub use context::{DeviceContext, PendingModeSwitch, TransportError};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, MemorySink, TracingSink};
pub use value::{AttrValue, AttributeMap, NormalizedPayload};
pub use zigbee::{
    AttributeWrite, ReportMessage, WriteRequest, ZclValue, CLUSTER_BASIC, CLUSTER_LUMI,
    MANUFACTURER_CODE,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
