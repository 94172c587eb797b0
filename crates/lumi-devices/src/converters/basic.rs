//! Generic vendor-cluster converters shared by most device families.

use lumi_codec::decode_miot_struct;
use lumi_core::{NormalizedPayload, ReportMessage};

use crate::dispatch::{interpret, DecodeScope};

/// Attribute report on the vendor cluster, already split into attributes
/// by the transport.
pub fn specific_report(
    message: &ReportMessage,
    scope: &mut DecodeScope<'_>,
) -> NormalizedPayload {
    interpret(&message.data, scope)
}

/// Raw struct buffer delivered on the basic cluster (attribute 0xFF01 /
/// 0xFF02 style heartbeats from older firmware).
pub fn basic_raw(buffer: &[u8], scope: &mut DecodeScope<'_>) -> NormalizedPayload {
    let data = decode_miot_struct(scope.model, buffer, scope.sink);
    interpret(&data, scope)
}
