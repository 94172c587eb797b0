//! Pet feeder (ZNCWWSQ01LM) converters.
//!
//! The feeder tunnels its own attribute space through octet-string frames
//! on attribute 0xFFF1. Frame layout and the inner attribute codes live in
//! [`lumi_codec::feeder`]; this module maps them to payload properties and
//! builds outbound frames with the per-device sequence counter.

use serde_json::{json, Value};

use lumi_codec::feeder::{
    self, attr, build_feeder_frame, parse_feeder_frame, FeedingScheduleEntry, FEEDER_ATTRIBUTE,
};
use lumi_core::{DeviceContext, DiagnosticKind, NormalizedPayload, ReportMessage, WriteRequest, ZclValue};

use crate::converters::ConvertError;
use crate::dispatch::DecodeScope;

fn read_u8(value: &[u8]) -> Option<u64> {
    value.first().map(|b| u64::from(*b))
}

fn read_u16_be(value: &[u8]) -> Option<u64> {
    Some(u64::from(u16::from_be_bytes(value.get(..2)?.try_into().ok()?)))
}

fn read_u32_be(value: &[u8]) -> Option<u64> {
    Some(u64::from(u32::from_be_bytes(value.get(..4)?.try_into().ok()?)))
}

fn schedule_json(entries: &[FeedingScheduleEntry]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|entry| {
                json!({
                    "days": entry.days,
                    "hour": entry.hour,
                    "minute": entry.minute,
                    "size": entry.size,
                })
            })
            .collect(),
    )
}

/// Inbound tunnel frames on attribute 0xFFF1.
pub fn report(message: &ReportMessage, scope: &mut DecodeScope<'_>) -> NormalizedPayload {
    let mut payload = NormalizedPayload::new();

    let Some(value) = message.data.get(&FEEDER_ATTRIBUTE) else {
        return payload;
    };
    let Some(raw) = value.as_bytes() else {
        scope.diag(
            DiagnosticKind::MalformedValue,
            format!("feeder frame: expected buffer, got {}", value.type_name()),
        );
        return payload;
    };
    let frame = match parse_feeder_frame(raw) {
        Ok(frame) => frame,
        Err(error) => {
            scope.diag(
                DiagnosticKind::MalformedValue,
                format!("feeder frame: {error}"),
            );
            return payload;
        }
    };

    let malformed = || {
        scope.sink.record(lumi_core::Diagnostic {
            model: scope.model.to_string(),
            kind: DiagnosticKind::MalformedValue,
            detail: format!("feeder attribute 0x{:08x}: short value", frame.attr_code),
        });
    };

    match frame.attr_code {
        // feed command acknowledged
        attr::FEED => {
            payload.insert("feed".into(), json!(""));
        }
        attr::FEEDING_REPORT => {
            // ASCII digits: source in [0..2], portion count at [3]
            let report = String::from_utf8_lossy(&frame.value);
            let source = report.get(0..2).and_then(|s| s.parse::<u8>().ok());
            match source {
                Some(0) => payload.insert("feeding_source".into(), json!("schedule")),
                Some(1) => payload.insert("feeding_source".into(), json!("manual")),
                Some(2) => payload.insert("feeding_source".into(), json!("remote")),
                _ => None,
            };
            if let Some(size) = report.get(3..4).and_then(|s| s.parse::<u8>().ok()) {
                payload.insert("feeding_size".into(), json!(size));
            }
        }
        attr::PORTIONS_PER_DAY => match read_u16_be(&frame.value) {
            Some(portions) => {
                payload.insert("portions_per_day".into(), json!(portions));
            }
            None => malformed(),
        },
        attr::WEIGHT_PER_DAY => match read_u32_be(&frame.value) {
            Some(weight) => {
                payload.insert("weight_per_day".into(), json!(weight));
            }
            None => malformed(),
        },
        attr::ERROR => match read_u8(&frame.value) {
            Some(error) => {
                payload.insert("error".into(), json!(error == 1));
            }
            None => malformed(),
        },
        attr::SCHEDULE => {
            let text = String::from_utf8_lossy(&frame.value);
            let entries = feeder::parse_feeding_schedule(&text);
            payload.insert("schedule".into(), schedule_json(&entries));
        }
        attr::LED_INDICATOR => match read_u8(&frame.value) {
            Some(led) => {
                payload.insert(
                    "led_indicator".into(),
                    json!(if led == 1 { "ON" } else { "OFF" }),
                );
            }
            None => malformed(),
        },
        attr::CHILD_LOCK => match read_u8(&frame.value) {
            Some(lock) => {
                payload.insert(
                    "child_lock".into(),
                    json!(if lock == 1 { "LOCK" } else { "UNLOCK" }),
                );
            }
            None => malformed(),
        },
        attr::MODE => match read_u8(&frame.value) {
            Some(mode) => {
                payload.insert(
                    "mode".into(),
                    json!(if mode == 1 { "schedule" } else { "manual" }),
                );
            }
            None => malformed(),
        },
        attr::SERVING_SIZE => match read_u8(&frame.value) {
            Some(size) => {
                payload.insert("serving_size".into(), json!(size));
            }
            None => malformed(),
        },
        attr::PORTION_WEIGHT => match read_u8(&frame.value) {
            Some(weight) => {
                payload.insert("portion_weight".into(), json!(weight));
            }
            None => malformed(),
        },
        other => scope.diag(
            DiagnosticKind::UnknownAttribute,
            format!("unknown feeder attribute 0x{other:08x}"),
        ),
    }

    payload
}

// ---- writes ----------------------------------------------------------------

fn frame_write(
    ctx: &mut DeviceContext,
    attr_code: i32,
    value: &[u8],
) -> Result<WriteRequest, ConvertError> {
    let frame = build_feeder_frame(ctx.next_feeder_seq(), attr_code, value)?;
    Ok(WriteRequest::lumi(FEEDER_ATTRIBUTE, ZclValue::octets(frame)))
}

/// Dispenses one feeding immediately.
pub fn feed(ctx: &mut DeviceContext) -> Result<WriteRequest, ConvertError> {
    frame_write(ctx, attr::FEED, &[1])
}

pub fn set_led_indicator(ctx: &mut DeviceContext, on: bool) -> Result<WriteRequest, ConvertError> {
    frame_write(ctx, attr::LED_INDICATOR, &[if on { 0 } else { 1 }])
}

pub fn set_child_lock(ctx: &mut DeviceContext, locked: bool) -> Result<WriteRequest, ConvertError> {
    frame_write(ctx, attr::CHILD_LOCK, &[if locked { 1 } else { 0 }])
}

pub fn set_mode(ctx: &mut DeviceContext, mode: &str) -> Result<WriteRequest, ConvertError> {
    let code = match mode {
        "manual" => 0,
        "schedule" => 1,
        _ => {
            return Err(ConvertError::UnsupportedValue {
                key: "mode",
                value: mode.to_string(),
            })
        }
    };
    frame_write(ctx, attr::MODE, &[code])
}

/// Portions dispensed per feeding.
pub fn set_serving_size(ctx: &mut DeviceContext, portions: u32) -> Result<WriteRequest, ConvertError> {
    frame_write(ctx, attr::SERVING_SIZE, &portions.to_be_bytes())
}

/// Grams per portion.
pub fn set_portion_weight(ctx: &mut DeviceContext, grams: u32) -> Result<WriteRequest, ConvertError> {
    frame_write(ctx, attr::PORTION_WEIGHT, &grams.to_be_bytes())
}

/// Writes the full feeding schedule. The wire form is the comma-separated
/// hex string with a trailing NUL.
pub fn set_schedule(
    ctx: &mut DeviceContext,
    entries: &[FeedingScheduleEntry],
) -> Result<WriteRequest, ConvertError> {
    let mut value = feeder::encode_feeding_schedule(entries).into_bytes();
    value.push(0);
    frame_write(ctx, attr::SCHEDULE, &value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumi_core::{AttrValue, MemorySink, CLUSTER_LUMI};

    use crate::dispatch::DecodeOptions;

    const MODEL: &str = "ZNCWWSQ01LM";

    fn run(frame: Vec<u8>) -> (NormalizedPayload, MemorySink) {
        let sink = MemorySink::new();
        let mut ctx = DeviceContext::new();
        let mut scope = DecodeScope::new(MODEL, DecodeOptions::default(), &mut ctx, &sink);
        let message = ReportMessage::new(
            CLUSTER_LUMI,
            [(FEEDER_ATTRIBUTE, AttrValue::Bytes(frame))].into_iter().collect(),
        );
        let payload = report(&message, &mut scope);
        (payload, sink)
    }

    fn inbound(attr_code: i32, value: &[u8]) -> Vec<u8> {
        build_feeder_frame(9, attr_code, value).unwrap()
    }

    #[test]
    fn test_portions_and_weight() {
        let (payload, _) = run(inbound(attr::PORTIONS_PER_DAY, &[0x00, 0x05]));
        assert_eq!(payload["portions_per_day"], json!(5));

        let (payload, _) = run(inbound(attr::WEIGHT_PER_DAY, &[0x00, 0x00, 0x01, 0x2C]));
        assert_eq!(payload["weight_per_day"], json!(300));
    }

    #[test]
    fn test_feeding_report_source_and_size() {
        let (payload, _) = run(inbound(attr::FEEDING_REPORT, b"01,4,"));
        assert_eq!(payload["feeding_source"], json!("manual"));
        assert_eq!(payload["feeding_size"], json!(4));
    }

    #[test]
    fn test_schedule_roundtrip_through_report() {
        let entries = vec![
            FeedingScheduleEntry { days: "everyday", hour: 8, minute: 30, size: 2 },
            FeedingScheduleEntry { days: "workdays", hour: 19, minute: 0, size: 1 },
        ];
        let text = feeder::encode_feeding_schedule(&entries);
        let (payload, _) = run(inbound(attr::SCHEDULE, text.as_bytes()));
        assert_eq!(
            payload["schedule"],
            json!([
                {"days": "everyday", "hour": 8, "minute": 30, "size": 2},
                {"days": "workdays", "hour": 19, "minute": 0, "size": 1},
            ])
        );
    }

    #[test]
    fn test_short_frame_diagnosed() {
        let (payload, sink) = run(vec![0x00, 0x02, 0x01]);
        assert!(payload.is_empty());
        assert_eq!(sink.count_of(DiagnosticKind::MalformedValue), 1);
    }

    #[test]
    fn test_led_and_lock_codes_inverted_on_write() {
        let mut ctx = DeviceContext::new();
        let write = set_led_indicator(&mut ctx, true).unwrap();
        let AttrValue::Bytes(frame) = &write.attributes[0].value.value else {
            panic!("expected octet frame");
        };
        // ON is wire code 0
        assert_eq!(frame[8], 0);
        assert_eq!(frame[2], 1); // first sequence number

        let write = set_child_lock(&mut ctx, true).unwrap();
        let AttrValue::Bytes(frame) = &write.attributes[0].value.value else {
            panic!("expected octet frame");
        };
        assert_eq!(frame[8], 1);
        assert_eq!(frame[2], 2); // counter advanced
    }

    #[test]
    fn test_schedule_write_has_trailing_nul() {
        let mut ctx = DeviceContext::new();
        let entries = vec![FeedingScheduleEntry { days: "everyday", hour: 8, minute: 0, size: 1 }];
        let write = set_schedule(&mut ctx, &entries).unwrap();
        let AttrValue::Bytes(frame) = &write.attributes[0].value.value else {
            panic!("expected octet frame");
        };
        assert_eq!(*frame.last().unwrap(), 0);
        assert_eq!(&frame[8..18], b"7f08000100");
    }
}
