//! Radiator thermostat (SRTS-A01) converters.
//!
//! The thermostat does not use the shared attribute-index scheme: its
//! settings live on dedicated vendor attributes in the 0x0270 range, so
//! reports are mapped here directly instead of going through the dispatch
//! table. Heartbeats (attribute 247) still carry a struct buffer and are
//! decoded with the shared codec.

use serde_json::json;

use lumi_codec::{decode_miot_struct, trv};
use lumi_core::{
    AttrValue, DiagnosticKind, NormalizedPayload, ReportMessage, WriteRequest, ZclValue,
};

use crate::converters::ConvertError;
use crate::dispatch::DecodeScope;

pub const ATTR_SYSTEM_MODE: u16 = 0x0271;
pub const ATTR_PRESET: u16 = 0x0272;
pub const ATTR_WINDOW_DETECTION: u16 = 0x0273;
pub const ATTR_VALVE_DETECTION: u16 = 0x0274;
pub const ATTR_VALVE_ALARM: u16 = 0x0275;
pub const ATTR_SCHEDULE_SETTINGS: u16 = 0x0276;
pub const ATTR_CHILD_LOCK: u16 = 0x0277;
pub const ATTR_AWAY_PRESET_TEMPERATURE: u16 = 0x0279;
pub const ATTR_WINDOW_OPEN: u16 = 0x027A;
pub const ATTR_CALIBRATED: u16 = 0x027B;
pub const ATTR_SCHEDULE: u16 = 0x027D;
pub const ATTR_SENSOR: u16 = 0x027E;
pub const ATTR_BATTERY: u16 = 0x040A;
pub const ATTR_HEARTBEAT: u16 = 247;
const ATTR_FILE_VERSION: u16 = 0x00EE;

fn numeric(scope: &DecodeScope<'_>, index: u16, value: &AttrValue) -> Option<f64> {
    let number = value.as_f64();
    if number.is_none() {
        scope.diag(
            DiagnosticKind::MalformedValue,
            format!("attribute {index}: expected numeric, got {}", value.type_name()),
        );
    }
    number
}

/// Splits the raw preset code into the preset name and the setup flag.
///
/// Code 3 is the factory state shown as "F11" on the display, not a preset
/// a user can select, so it surfaces as a separate flag.
fn decode_preset(scope: &DecodeScope<'_>, payload: &mut NormalizedPayload, code: f64) {
    payload.insert("setup".into(), json!(code == 3.0));
    let preset = match code as u64 {
        0 => Some("manual"),
        1 => Some("auto"),
        2 => Some("away"),
        3 => None,
        other => {
            scope.diag(
                DiagnosticKind::OutOfRange,
                format!("unknown thermostat preset code {other}"),
            );
            None
        }
    };
    if let Some(preset) = preset {
        payload.insert("preset".into(), json!(preset));
    }
}

/// Heartbeat struct buffer (attribute 247). The firmware version found
/// here replaces the placeholder the basic cluster advertises, so it goes
/// into the device context instead of the payload.
fn decode_heartbeat(scope: &mut DecodeScope<'_>, payload: &mut NormalizedPayload, buffer: &[u8]) {
    let data = decode_miot_struct(scope.model, buffer, scope.sink);
    for (&index, value) in &data {
        match index {
            3 => {
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert("device_temperature".into(), json!(number));
                }
            }
            5 => {
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert("power_outage_count".into(), json!(number - 1.0));
                }
            }
            13 => {
                if let Some(number) = numeric(scope, index, value) {
                    let raw = number as u32;
                    scope.ctx.file_version = Some(raw);
                    scope.ctx.software_build_id = Some(trv::decode_firmware_version(raw));
                }
            }
            101 => {
                if let Some(number) = numeric(scope, index, value) {
                    decode_preset(scope, payload, number);
                }
            }
            102 => {
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert("local_temperature".into(), json!(number / 100.0));
                }
            }
            103 => {
                // Tracks the active setpoint, except it reads 5 in off
                // mode. Kept separate from occupied_heating_setpoint to
                // avoid fighting with the thermostat cluster.
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert("internal_heating_setpoint".into(), json!(number / 100.0));
                }
            }
            104 => {
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert("valve_alarm".into(), json!(number == 1.0));
                }
            }
            105 => {
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert("battery".into(), json!(number));
                }
            }
            // unidentified counters and flags seen in the field
            10 | 17 | 106 => {}
            other => scope.diag(
                DiagnosticKind::UnknownAttribute,
                format!("unknown heartbeat field {other}"),
            ),
        }
    }
}

/// Attribute report on the vendor cluster.
pub fn report(message: &ReportMessage, scope: &mut DecodeScope<'_>) -> NormalizedPayload {
    let mut payload = NormalizedPayload::new();

    for (&index, value) in &message.data {
        match index {
            ATTR_SYSTEM_MODE => {
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert(
                        "system_mode".into(),
                        json!(if number == 1.0 { "heat" } else { "off" }),
                    );
                }
            }
            ATTR_PRESET => {
                if let Some(number) = numeric(scope, index, value) {
                    decode_preset(scope, &mut payload, number);
                }
            }
            ATTR_WINDOW_DETECTION => {
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert("window_detection".into(), json!(number == 1.0));
                }
            }
            ATTR_VALVE_DETECTION => {
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert("valve_detection".into(), json!(number == 1.0));
                }
            }
            ATTR_VALVE_ALARM => {
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert("valve_alarm".into(), json!(number == 1.0));
                }
            }
            ATTR_SCHEDULE_SETTINGS => {
                let Some(buffer) = value.as_bytes() else {
                    scope.diag(
                        DiagnosticKind::MalformedValue,
                        format!("attribute {index}: expected schedule buffer"),
                    );
                    continue;
                };
                // empty on the first report after pairing
                if buffer.is_empty() {
                    continue;
                }
                match trv::decode_schedule(buffer) {
                    Ok(schedule) => {
                        payload.insert(
                            "schedule_settings".into(),
                            json!(trv::stringify_schedule(&schedule)),
                        );
                    }
                    Err(error) => scope.diag(
                        DiagnosticKind::MalformedValue,
                        format!("undecodable schedule buffer: {error}"),
                    ),
                }
            }
            ATTR_CHILD_LOCK => {
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert("child_lock".into(), json!(number == 1.0));
                }
            }
            ATTR_AWAY_PRESET_TEMPERATURE => {
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert(
                        "away_preset_temperature".into(),
                        json!(format!("{:.1}", number / 100.0)),
                    );
                }
            }
            ATTR_WINDOW_OPEN => {
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert("window_open".into(), json!(number == 1.0));
                }
            }
            ATTR_CALIBRATED => {
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert("calibrated".into(), json!(number == 1.0));
                }
            }
            ATTR_SCHEDULE => {
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert("schedule".into(), json!(number == 1.0));
                }
            }
            ATTR_SENSOR => {
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert(
                        "sensor".into(),
                        json!(if number == 1.0 { "external" } else { "internal" }),
                    );
                }
            }
            ATTR_BATTERY => {
                if let Some(number) = numeric(scope, index, value) {
                    payload.insert("battery".into(), json!(number));
                }
            }
            ATTR_HEARTBEAT => {
                let Some(buffer) = value.as_bytes() else {
                    scope.diag(
                        DiagnosticKind::MalformedValue,
                        format!("attribute {index}: expected heartbeat buffer"),
                    );
                    continue;
                };
                decode_heartbeat(scope, &mut payload, buffer);
            }
            ATTR_FILE_VERSION => {
                if let Some(number) = numeric(scope, index, value) {
                    scope.ctx.file_version = Some(number as u32);
                }
            }
            // noise attributes with no known meaning
            0xFFF2 | 0x00FF | 0x027C | 0x0280 => {}
            other => scope.diag(
                DiagnosticKind::UnknownAttribute,
                format!("unknown thermostat attribute {other}"),
            ),
        }
    }

    payload
}

// ---- writes ----------------------------------------------------------------

pub fn set_system_mode(mode: &str) -> Result<WriteRequest, ConvertError> {
    let code = match mode {
        "off" => 0,
        "heat" => 1,
        _ => {
            return Err(ConvertError::UnsupportedValue {
                key: "system_mode",
                value: mode.to_string(),
            })
        }
    };
    Ok(WriteRequest::lumi(ATTR_SYSTEM_MODE, ZclValue::u8(code)))
}

pub fn set_preset(preset: &str) -> Result<WriteRequest, ConvertError> {
    let code = match preset {
        "manual" => 0,
        "auto" => 1,
        "away" => 2,
        _ => {
            return Err(ConvertError::UnsupportedValue {
                key: "preset",
                value: preset.to_string(),
            })
        }
    };
    Ok(WriteRequest::lumi(ATTR_PRESET, ZclValue::u8(code)))
}

pub fn set_window_detection(enable: bool) -> WriteRequest {
    WriteRequest::lumi(ATTR_WINDOW_DETECTION, ZclValue::u8(enable as u8))
}

pub fn set_valve_detection(enable: bool) -> WriteRequest {
    WriteRequest::lumi(ATTR_VALVE_DETECTION, ZclValue::u8(enable as u8))
}

pub fn set_child_lock(enable: bool) -> WriteRequest {
    WriteRequest::lumi(ATTR_CHILD_LOCK, ZclValue::u8(enable as u8))
}

/// Hundredths of a degree on the wire.
pub fn set_away_preset_temperature(celsius: f64) -> WriteRequest {
    WriteRequest::lumi(
        ATTR_AWAY_PRESET_TEMPERATURE,
        ZclValue::u32((celsius * 100.0).round() as u32),
    )
}

pub fn set_schedule(enable: bool) -> WriteRequest {
    WriteRequest::lumi(ATTR_SCHEDULE, ZclValue::u8(enable as u8))
}

/// Parses and validates the human-readable schedule string, then encodes
/// the 26-byte record. Invalid schedules fail before any write is built.
pub fn set_schedule_settings(text: &str) -> Result<WriteRequest, ConvertError> {
    let schedule = trv::parse_schedule(text)?;
    trv::validate_schedule(&schedule)?;
    let buffer = trv::encode_schedule(&schedule);
    Ok(WriteRequest::lumi(
        ATTR_SCHEDULE_SETTINGS,
        ZclValue::octets(buffer.to_vec()),
    ))
}
