//! Presence sensor (FP1) region converters.
//!
//! Detection regions are rectangles over a 4x7 grid of zones. The sensor
//! reports region events on a dedicated attribute; region definitions are
//! written as 7-byte commands. Everything else the FP1 reports goes through
//! the regular dispatch table.

use serde_json::{json, Value};

use lumi_codec::region::{
    self, RegionError, RegionEvent, REGION_CONFIG_ATTRIBUTE, REGION_EVENT_ATTRIBUTE,
};
use lumi_core::diagnostics::hex_sequence;
use lumi_core::{DiagnosticKind, NormalizedPayload, ReportMessage, WriteRequest, ZclValue};

use crate::dispatch::DecodeScope;

/// Region event reports: attribute 0x0151 carries `[region_id, event
/// code]`. Anything malformed is diagnosed and dropped; a report can still
/// carry other usable attributes.
pub fn region_events(message: &ReportMessage, scope: &mut DecodeScope<'_>) -> NormalizedPayload {
    let mut payload = NormalizedPayload::new();

    let Some(value) = message.data.get(&REGION_EVENT_ATTRIBUTE) else {
        return payload;
    };
    let Some(bytes) = value.as_bytes() else {
        scope.diag(
            DiagnosticKind::MalformedValue,
            format!("region event: expected buffer, got {}", value.type_name()),
        );
        return payload;
    };
    if bytes.len() < 2 {
        scope.diag(
            DiagnosticKind::MalformedValue,
            format!("region event: need 2 bytes, got [{}]", hex_sequence(bytes)),
        );
        return payload;
    }

    let region_id = bytes[0];
    let Some(event) = RegionEvent::from_code(bytes[1]) else {
        scope.diag(
            DiagnosticKind::OutOfRange,
            format!("region event: unknown event code {}", bytes[1]),
        );
        return payload;
    };

    payload.insert(
        "action".into(),
        json!(format!("region_{}_{}", region_id, event.name())),
    );
    payload
}

/// Creates or replaces a region. The input is validated before any write
/// is built; the returned error names the offending field.
pub fn region_upsert(input: &Value) -> Result<WriteRequest, RegionError> {
    let definition = region::parse_upsert_input(input)?;
    let command = region::encode_upsert(&definition);
    Ok(WriteRequest::lumi(
        REGION_CONFIG_ATTRIBUTE,
        ZclValue::octets(command.to_vec()),
    ))
}

/// Deletes a region by id.
pub fn region_delete(input: &Value) -> Result<WriteRequest, RegionError> {
    let region_id = region::parse_delete_input(input)?;
    let command = region::encode_delete(region_id);
    Ok(WriteRequest::lumi(
        REGION_CONFIG_ATTRIBUTE,
        ZclValue::octets(command.to_vec()),
    ))
}
