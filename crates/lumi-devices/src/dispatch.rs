//! Table-driven attribute interpretation.
//!
//! The vendor reuses numeric attribute indices across unrelated device
//! families: index 100 is a relay state on a wall switch, a temperature on
//! a weather sensor and a contact flag on a door sensor. Interpretation is
//! therefore resolved through a capability table built once at startup:
//! a shared default handler per index, shadowed by per-model overrides.
//!
//! Composite attributes (0xF7, 0xFF01, 0xFF02) carry nested encoded
//! buffers; those are decoded and fed back through the same table, merged
//! into the outer payload with last-write-wins semantics and a hard
//! recursion bound.
//!
//! A handler never aborts the pass: malformed or out-of-range values drop
//! the affected payload key and surface as diagnostics.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::{json, Value};
use tracing::debug;

use lumi_codec::{decode_miot_struct, trv};
use lumi_core::{
    AttrValue, AttributeMap, DeviceContext, Diagnostic, DiagnosticKind, DiagnosticSink,
    NormalizedPayload,
};

use crate::battery::{voltage_to_percentage, VoltageCurve};
use crate::catalog;

/// Nested composite buffers deeper than this are dropped.
pub const MAX_NESTING_DEPTH: usize = 3;

/// Decode-time options supplied by the user's device configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Flip cover position/direction semantics
    pub invert_cover: bool,
}

/// Everything one decode pass needs besides the attribute map itself.
pub struct DecodeScope<'a> {
    pub model: &'a str,
    pub battery_curve: Option<VoltageCurve>,
    pub options: DecodeOptions,
    pub ctx: &'a mut DeviceContext,
    pub sink: &'a dyn DiagnosticSink,
}

impl<'a> DecodeScope<'a> {
    pub fn new(
        model: &'a str,
        options: DecodeOptions,
        ctx: &'a mut DeviceContext,
        sink: &'a dyn DiagnosticSink,
    ) -> Self {
        let battery_curve = catalog::find_model(model).and_then(|meta| meta.battery_curve);
        Self {
            model,
            battery_curve,
            options,
            ctx,
            sink,
        }
    }

    pub(crate) fn diag(&self, kind: DiagnosticKind, detail: String) {
        self.sink.record(Diagnostic {
            model: self.model.to_string(),
            kind,
            detail,
        });
    }
}

/// Interprets a raw attribute map into the normalized payload.
pub fn interpret(data: &AttributeMap, scope: &mut DecodeScope<'_>) -> NormalizedPayload {
    let mut payload = NormalizedPayload::new();
    interpret_into(data, scope, &mut payload, 0);
    debug!(model = scope.model, keys = payload.len(), "interpreted attribute report");
    payload
}

fn interpret_into(
    data: &AttributeMap,
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    depth: usize,
) {
    for (&index, value) in data {
        match TABLE.handler(scope.model, index) {
            Some(handler) => handler(scope, payload, depth, index, value),
            None => scope.diag(
                DiagnosticKind::UnknownAttribute,
                format!("unknown attribute {index} ({})", value.type_name()),
            ),
        }
    }
}

type Handler = fn(&mut DecodeScope<'_>, &mut NormalizedPayload, usize, u16, &AttrValue);

struct DispatchTable {
    defaults: HashMap<u16, Handler>,
    overrides: HashMap<&'static str, HashMap<u16, Handler>>,
}

impl DispatchTable {
    fn handler(&self, model: &str, index: u16) -> Option<Handler> {
        self.overrides
            .get(model)
            .and_then(|table| table.get(&index))
            .or_else(|| self.defaults.get(&index))
            .copied()
    }
}

static TABLE: Lazy<DispatchTable> = Lazy::new(build_table);

// ---- helpers ---------------------------------------------------------------

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

fn set_number(payload: &mut NormalizedPayload, key: &str, value: f64) {
    if let Some(number) = serde_json::Number::from_f64(value) {
        payload.insert(key.to_string(), Value::Number(number));
    }
}

fn on_off(value: f64) -> Value {
    json!(if value == 1.0 { "ON" } else { "OFF" })
}

/// Two decimal places, matching the precision the vendor UI shows.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn lookup_set(
    scope: &DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    index: u16,
    value: &AttrValue,
    key: &str,
    pairs: &[(u64, &str)],
) {
    let Some(number) = numeric(scope, index, value) else {
        return;
    };
    match pairs.iter().find(|(code, _)| *code as f64 == number) {
        Some((_, name)) => {
            payload.insert(key.to_string(), json!(name));
        }
        None => scope.diag(
            DiagnosticKind::OutOfRange,
            format!("attribute {index}: no {key} mapping for {number}"),
        ),
    }
}

fn set_battery_from_voltage(
    scope: &DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    voltage: f64,
) {
    if let Some(curve) = scope.battery_curve {
        payload.insert("battery".into(), json!(voltage_to_percentage(voltage, curve)));
    }
}

/// Generates a handler that stores the numeric value under a fixed key,
/// optionally scaled.
macro_rules! numeric_handler {
    ($name:ident, $key:literal) => {
        numeric_handler!($name, $key, |v: f64| v);
    };
    ($name:ident, $key:literal, $transform:expr) => {
        fn $name(
            scope: &mut DecodeScope<'_>,
            payload: &mut NormalizedPayload,
            _depth: usize,
            index: u16,
            value: &AttrValue,
        ) {
            if let Some(number) = numeric(scope, index, value) {
                #[allow(clippy::redundant_closure_call)]
                set_number(payload, $key, ($transform)(number));
            }
        }
    };
}

/// Generates a handler that stores `value == 1` as a boolean.
macro_rules! bool_handler {
    ($name:ident, $key:literal) => {
        fn $name(
            scope: &mut DecodeScope<'_>,
            payload: &mut NormalizedPayload,
            _depth: usize,
            index: u16,
            value: &AttrValue,
        ) {
            if let Some(number) = numeric(scope, index, value) {
                payload.insert($key.into(), json!(number == 1.0));
            }
        }
    };
}

/// Generates a handler backed by a fixed code -> name lookup.
macro_rules! lookup_handler {
    ($name:ident, $key:literal, $pairs:expr) => {
        fn $name(
            scope: &mut DecodeScope<'_>,
            payload: &mut NormalizedPayload,
            _depth: usize,
            index: u16,
            value: &AttrValue,
        ) {
            lookup_set(scope, payload, index, value, $key, $pairs);
        }
    };
}

// ---- shared handlers -------------------------------------------------------

fn h_ignore(
    _scope: &mut DecodeScope<'_>,
    _payload: &mut NormalizedPayload,
    _depth: usize,
    _index: u16,
    _value: &AttrValue,
) {
}

numeric_handler!(h_detection_period, "detection_period");
numeric_handler!(h_device_temperature, "device_temperature");
numeric_handler!(h_power, "power");
numeric_handler!(h_detection_interval, "detection_interval");
numeric_handler!(h_voltage_decivolt, "voltage", |v: f64| v * 0.1);
numeric_handler!(h_current_milli, "current", |v: f64| v * 0.001);
numeric_handler!(h_current_direct, "current");
numeric_handler!(h_overload_protection, "overload_protection", round2);
numeric_handler!(h_smoke_density, "smoke_density");
numeric_handler!(h_gas_density, "gas_density");
numeric_handler!(h_occupancy, "occupancy");
numeric_handler!(h_brightness, "brightness");
numeric_handler!(h_color_temp, "color_temp");
numeric_handler!(h_battery_direct, "battery");
numeric_handler!(h_battery_half, "battery", |v: f64| round2(v / 2.0));
numeric_handler!(h_voltage_direct, "voltage");
numeric_handler!(h_illuminance_x50, "illuminance_lux", |v: f64| v * 50.0);
numeric_handler!(h_illuminance_lux, "illuminance_lux");

bool_handler!(h_power_outage_memory, "power_outage_memory");
bool_handler!(h_auto_off, "auto_off");
bool_handler!(h_led_disabled_night, "led_disabled_night");
bool_handler!(h_consumer_connected, "consumer_connected");
bool_handler!(h_lock_relay, "lock_relay");
bool_handler!(h_trigger_indicator, "trigger_indicator");
bool_handler!(h_water_leak, "water_leak");
bool_handler!(h_gas, "gas");
bool_handler!(h_smoke, "smoke");
bool_handler!(h_test, "test");
bool_handler!(h_buzzer_manual_mute, "buzzer_manual_mute");
bool_handler!(h_buzzer_manual_alarm, "buzzer_manual_alarm");
bool_handler!(h_heartbeat_indicator, "heartbeat_indicator");
bool_handler!(h_linkage_alarm, "linkage_alarm");
bool_handler!(h_linkage_alarm_state, "linkage_alarm_state");
bool_handler!(h_charging_status, "charging_status");
bool_handler!(h_tamper, "tamper");

lookup_handler!(h_mode_switch, "mode_switch", &[(4, "anti_flicker_mode"), (1, "quick_mode")]);
lookup_handler!(h_switch_type, "switch_type", &[(1, "toggle"), (2, "momentary")]);
lookup_handler!(h_click_mode, "click_mode", &[(1, "fast"), (2, "multi")]);
lookup_handler!(
    h_motion_sensitivity,
    "motion_sensitivity",
    &[(1, "low"), (2, "medium"), (3, "high")]
);
lookup_handler!(h_gas_sensitivity, "gas_sensitivity", &[(1, "15%LEL"), (2, "10%LEL")]);
lookup_handler!(
    h_detection_distance,
    "detection_distance",
    &[(1, "10mm"), (2, "20mm"), (3, "30mm")]
);
lookup_handler!(h_state_work, "state", &[(0, "work"), (1, "preparation")]);
lookup_handler!(
    h_presence_event,
    "presence_event",
    &[
        (0, "enter"),
        (1, "leave"),
        (2, "left_enter"),
        (3, "right_leave"),
        (4, "right_enter"),
        (5, "left_leave"),
        (6, "approach"),
        (7, "away"),
    ]
);
lookup_handler!(h_monitoring_mode, "monitoring_mode", &[(0, "undirected"), (1, "left_right")]);
lookup_handler!(
    h_approach_distance,
    "approach_distance",
    &[(0, "far"), (1, "medium"), (2, "near")]
);
lookup_handler!(h_motor_speed, "motor_speed", &[(0, "low"), (1, "medium"), (2, "high")]);
lookup_handler!(h_dimmer_mode, "dimmer_mode", &[(3, "rgbw"), (1, "dual_ct")]);
lookup_handler!(
    h_operation_mode_relay,
    "operation_mode",
    &[(1, "control_relay"), (0, "decoupled")]
);
lookup_handler!(
    h_operation_mode_cube,
    "operation_mode",
    &[(0, "action_mode"), (1, "scene_mode")]
);
lookup_handler!(
    h_hooks_state,
    "hooks_state",
    &[(0, "unlocked"), (1, "locked"), (2, "locking"), (3, "unlocking")]
);

fn h_voltage_battery(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    if let Some(voltage) = numeric(scope, index, value) {
        set_number(payload, "voltage", voltage);
        set_battery_from_voltage(scope, payload, voltage);
    }
}

fn h_power_outage_count(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    // The hardware counts from 1; the first heartbeat after pairing reports
    // a single "outage" that never happened.
    if let Some(count) = numeric(scope, index, value) {
        set_number(payload, "power_outage_count", count - 1.0);
    }
}

fn h_trigger_count(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    // Reported as a struct list; element 1 holds the counter. Devices
    // behind a Lumi router garble the upper bits, so only the low 16 are
    // trusted.
    let AttrValue::List(elements) = value else {
        scope.diag(
            DiagnosticKind::MalformedValue,
            format!("attribute {index}: expected struct list, got {}", value.type_name()),
        );
        return;
    };
    let Some(count) = elements.get(1).and_then(AttrValue::as_i64) else {
        scope.diag(
            DiagnosticKind::MalformedValue,
            format!("attribute {index}: struct list has no numeric element 1"),
        );
        return;
    };
    let truncated = (count as u64) & 0xFFFF;
    set_number(payload, "trigger_count", truncated as f64 - 1.0);
}

fn h_state_default(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    if let Some(number) = numeric(scope, index, value) {
        payload.insert("state".into(), on_off(number));
    }
}

/// Generates the `state_<endpoint>` handlers for multi-gang switches.
macro_rules! gang_state_handler {
    ($name:ident, $key:literal) => {
        fn $name(
            scope: &mut DecodeScope<'_>,
            payload: &mut NormalizedPayload,
            _depth: usize,
            index: u16,
            value: &AttrValue,
        ) {
            if let Some(number) = numeric(scope, index, value) {
                payload.insert($key.into(), on_off(number));
            }
        }
    };
}

gang_state_handler!(h_state_left, "state_left");
gang_state_handler!(h_state_right, "state_right");
gang_state_handler!(h_state_center, "state_center");
gang_state_handler!(h_state_relay, "state_relay");
gang_state_handler!(h_state_usb, "state_usb");
gang_state_handler!(h_state_l1, "state_l1");
gang_state_handler!(h_state_l2, "state_l2");

fn h_temperature_filtered(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    let Some(raw) = numeric(scope, index, value) else {
        return;
    };
    let temperature = raw / 100.0;
    // The sensor occasionally publishes wildly unrealistic readings.
    if temperature > -65.0 && temperature < 65.0 {
        set_number(payload, "temperature", temperature);
    } else {
        scope.diag(
            DiagnosticKind::OutOfRange,
            format!("attribute {index}: implausible temperature {temperature}"),
        );
    }
}

fn h_humidity_filtered(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    let Some(raw) = numeric(scope, index, value) else {
        return;
    };
    let humidity = raw / 100.0;
    if (0.0..=100.0).contains(&humidity) {
        set_number(payload, "humidity", humidity);
    } else {
        scope.diag(
            DiagnosticKind::OutOfRange,
            format!("attribute {index}: implausible humidity {humidity}"),
        );
    }
}

numeric_handler!(h_pressure, "pressure", |v: f64| v / 100.0);

fn h_contact(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    if let Some(number) = numeric(scope, index, value) {
        payload.insert("contact".into(), json!(number == 0.0));
    }
}

fn h_illuminance_clamped(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    // Some firmware reports huge bogus values in the dark.
    if let Some(raw) = numeric(scope, index, value) {
        let illuminance = if raw > 65000.0 { 0.0 } else { raw };
        set_number(payload, "illuminance", illuminance);
    }
}

fn h_illuminance_both(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    if let Some(raw) = numeric(scope, index, value) {
        set_number(payload, "illuminance", raw);
        // Deprecated alias still published for existing automations.
        set_number(payload, "illuminance_lux", raw);
    }
}

fn h_presence(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    let Some(number) = numeric(scope, index, value) else {
        return;
    };
    let presence = match number as u64 {
        0 => json!(false),
        1 => json!(true),
        // 255 means "detection restarted, state unknown"
        255 => Value::Null,
        other => {
            scope.diag(
                DiagnosticKind::OutOfRange,
                format!("attribute {index}: unexpected presence code {other}"),
            );
            return;
        }
    };
    payload.insert("presence".into(), presence);
}

fn h_energy(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    if let Some(energy) = numeric(scope, index, value) {
        set_number(payload, "energy", energy);
    }
}

fn h_energy_milli(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    if let Some(energy) = numeric(scope, index, value) {
        set_number(payload, "energy", energy / 1000.0);
    }
}

fn h_flip_indicator_light(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    if let Some(number) = numeric(scope, index, value) {
        payload.insert("flip_indicator_light".into(), on_off(number));
    }
}

fn h_button_lock(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    // Inverted on purpose: 1 means the physical button is unlocked.
    if let Some(number) = numeric(scope, index, value) {
        payload.insert(
            "button_lock".into(),
            json!(if number == 1.0 { "OFF" } else { "ON" }),
        );
    }
}

fn h_button_switch_mode(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    if let Some(number) = numeric(scope, index, value) {
        payload.insert(
            "button_switch_mode".into(),
            json!(if number == 1.0 { "relay_and_usb" } else { "relay" }),
        );
    }
}

fn h_smoke_density_full(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    const DBM: [f64; 11] = [
        0.0, 0.085, 0.088, 0.093, 0.095, 0.100, 0.105, 0.110, 0.115, 0.120, 0.125,
    ];
    let Some(density) = numeric(scope, index, value) else {
        return;
    };
    set_number(payload, "smoke_density", density);
    if let Some(dbm) = DBM.get(density as usize) {
        set_number(payload, "smoke_density_dbm", *dbm);
    }
}

fn h_curtain_firmware(
    scope: &mut DecodeScope<'_>,
    _payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    // The basic cluster advertises a placeholder version for this device;
    // the real one only appears here.
    if let Some(raw) = numeric(scope, index, value) {
        let raw = raw as u32;
        scope.ctx.file_version = Some(raw);
        scope.ctx.software_build_id = Some(trv::decode_firmware_version(raw));
    }
}

fn h_hand_open(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    if let Some(number) = numeric(scope, index, value) {
        payload.insert("hand_open".into(), json!(number == 0.0));
    }
}

fn h_cover_position(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    let Some(raw) = numeric(scope, index, value) else {
        return;
    };
    let invert = scope.options.invert_cover;
    let position = if invert { 100.0 - raw } else { raw };
    set_number(payload, "position", position);
    let open = position > 0.0;
    let state = if invert {
        if open { "CLOSE" } else { "OPEN" }
    } else if open {
        "OPEN"
    } else {
        "CLOSE"
    };
    payload.insert("state".into(), json!(state));
}

fn h_target_position(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    if let Some(raw) = numeric(scope, index, value) {
        let position = if scope.options.invert_cover { 100.0 - raw } else { raw };
        set_number(payload, "target_position", position);
    }
}

fn h_motor_state_default(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    let pairs: &[(u64, &str)] = if scope.options.invert_cover {
        &[(0, "stopped"), (1, "closing"), (2, "opening")]
    } else {
        &[(0, "stopped"), (1, "opening"), (2, "closing")]
    };
    lookup_set(scope, payload, index, value, "motor_state", pairs);
    if let Some(number) = value.as_f64() {
        payload.insert("running".into(), json!(number != 0.0));
    }
}

fn h_motor_state_curtain(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    let pairs: &[(u64, &str)] = if scope.options.invert_cover {
        &[(0, "opening"), (1, "closing"), (2, "stopped")]
    } else {
        &[(0, "closing"), (1, "opening"), (2, "stopped")]
    };
    lookup_set(scope, payload, index, value, "motor_state", pairs);
    if let Some(number) = value.as_f64() {
        payload.insert("running".into(), json!(number < 2.0));
    }
}

fn h_manual_action(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    let pairs: &[(u64, &str)] = if scope.options.invert_cover {
        &[(1, "manual_close"), (2, "manual_open")]
    } else {
        &[(1, "manual_open"), (2, "manual_close")]
    };
    lookup_set(scope, payload, index, value, "action", pairs);
}

fn h_hooks(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    depth: usize,
    index: u16,
    value: &AttrValue,
) {
    h_hooks_state(scope, payload, depth, index, value);
    lookup_set(
        scope,
        payload,
        index,
        value,
        "hooks_lock",
        &[(0, "UNLOCK"), (1, "LOCK"), (2, "UNLOCK"), (3, "LOCK")],
    );
}

fn h_side_up(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    if let Some(side) = numeric(scope, index, value) {
        payload.insert("action".into(), json!("side_up"));
        set_number(payload, "side", side + 1.0);
    }
}

// ---- nested composite buffers ----------------------------------------------

fn recurse(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    depth: usize,
    index: u16,
    nested: &AttributeMap,
) {
    if depth >= MAX_NESTING_DEPTH {
        scope.diag(
            DiagnosticKind::MalformedValue,
            format!("attribute {index}: nesting depth limit reached, dropping inner buffer"),
        );
        return;
    }
    interpret_into(nested, scope, payload, depth + 1);
}

fn h_composite_buffer(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    depth: usize,
    index: u16,
    value: &AttrValue,
) {
    let Some(bytes) = value.as_bytes() else {
        scope.diag(
            DiagnosticKind::MalformedValue,
            format!("attribute {index}: expected buffer, got {}", value.type_name()),
        );
        return;
    };
    let nested = decode_miot_struct(scope.model, bytes, scope.sink);
    recurse(scope, payload, depth, index, &nested);
}

fn h_composite_cube(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    depth: usize,
    index: u16,
    value: &AttrValue,
) {
    let Some(bytes) = value.as_bytes() else {
        scope.diag(
            DiagnosticKind::MalformedValue,
            format!("attribute {index}: expected buffer, got {}", value.type_name()),
        );
        return;
    };
    let nested = decode_miot_struct(scope.model, bytes, scope.sink);

    // The cube only accepts the operation-mode write in the configuration
    // window this report opens. Run the deferred write now; keep it queued
    // if it fails so the next report retries.
    if let Some(mut task) = scope.ctx.pending_mode_switch.take() {
        match (task.apply)() {
            Ok(()) => {
                payload.insert("operation_mode".into(), json!(task.new_mode));
            }
            Err(_) => {
                scope.ctx.pending_mode_switch = Some(task);
            }
        }
    } else if let Some(mode) = nested.get(&155) {
        lookup_set(
            scope,
            payload,
            155,
            mode,
            "operation_mode",
            &[(0, "action_mode"), (1, "scene_mode")],
        );
    }

    recurse(scope, payload, depth, index, &nested);
}

fn h_composite_map(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    depth: usize,
    index: u16,
    value: &AttrValue,
) {
    let AttrValue::Map(nested) = value else {
        scope.diag(
            DiagnosticKind::MalformedValue,
            format!("attribute {index}: expected attribute map, got {}", value.type_name()),
        );
        return;
    };
    recurse(scope, payload, depth, index, nested);
}

fn h_struct_list(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    // Fixed-position struct: element 1 voltage, element 4 outage counter.
    // The other positions are not understood well enough to publish.
    let AttrValue::List(elements) = value else {
        scope.diag(
            DiagnosticKind::MalformedValue,
            format!("attribute {index}: expected struct list, got {}", value.type_name()),
        );
        return;
    };
    if let Some(voltage) = elements.get(1).and_then(AttrValue::as_f64) {
        set_number(payload, "voltage", voltage);
        set_battery_from_voltage(scope, payload, voltage);
    }
    if let Some(count) = elements.get(4).and_then(AttrValue::as_f64) {
        set_number(payload, "power_outage_count", count - 1.0);
    }
}

fn h_switch_type_gated(
    scope: &mut DecodeScope<'_>,
    payload: &mut NormalizedPayload,
    _depth: usize,
    index: u16,
    value: &AttrValue,
) {
    // Other values occasionally appear here and carry no meaning.
    if let Some(number) = value.as_f64() {
        if number == 1.0 || number == 2.0 {
            lookup_set(
                scope,
                payload,
                index,
                value,
                "switch_type",
                &[(1, "toggle"), (2, "momentary")],
            );
        }
    }
}

// ---- table construction ----------------------------------------------------

fn gate(
    overrides: &mut HashMap<&'static str, HashMap<u16, Handler>>,
    models: &[&'static str],
    index: u16,
    handler: Handler,
) {
    for model in models {
        overrides.entry(model).or_default().insert(index, handler);
    }
}

fn build_table() -> DispatchTable {
    let mut defaults: HashMap<u16, Handler> = HashMap::new();
    let mut overrides: HashMap<&'static str, HashMap<u16, Handler>> = HashMap::new();

    // Shared interpretations, valid unless a model says otherwise.
    defaults.insert(0, h_detection_period as Handler);
    defaults.insert(1, h_voltage_battery);
    defaults.insert(3, h_device_temperature);
    defaults.insert(5, h_power_outage_count);
    defaults.insert(100, h_state_default);
    defaults.insert(149, h_energy);
    defaults.insert(150, h_voltage_decivolt);
    defaults.insert(151, h_current_milli);
    defaults.insert(152, h_power);
    defaults.insert(240, h_flip_indicator_light);
    defaults.insert(247, h_composite_buffer);
    defaults.insert(258, h_detection_interval);
    defaults.insert(293, h_click_mode);
    defaults.insert(512, h_operation_mode_relay);
    defaults.insert(513, h_power_outage_memory);
    defaults.insert(514, h_auto_off);
    defaults.insert(515, h_led_disabled_night);
    defaults.insert(519, h_consumer_connected);
    defaults.insert(523, h_overload_protection);
    defaults.insert(550, h_button_switch_mode);
    defaults.insert(645, h_lock_relay);
    defaults.insert(1028, h_motor_state_default);
    defaults.insert(1289, h_dimmer_mode);
    defaults.insert(65281, h_composite_map);
    defaults.insert(65282, h_struct_list);

    // Gas and smoke alarms.
    let gas = &["JT-BZ-01AQ/A"];
    let smoke = &["JY-GZ-01AQ"];
    let alarms = &["JT-BZ-01AQ/A", "JY-GZ-01AQ"];
    gate(&mut overrides, gas, 2, h_power_outage_count);
    gate(&mut overrides, gas, 159, h_gas_sensitivity);
    gate(&mut overrides, gas, 160, h_gas);
    gate(&mut overrides, smoke, 160, h_smoke);
    gate(&mut overrides, gas, 161, h_gas_density);
    gate(&mut overrides, smoke, 161, h_smoke_density_full);
    gate(&mut overrides, alarms, 162, h_test);
    gate(&mut overrides, alarms, 163, h_buzzer_manual_mute);
    gate(&mut overrides, gas, 164, h_state_work);
    gate(&mut overrides, smoke, 164, h_heartbeat_indicator);
    gate(&mut overrides, smoke, 165, h_linkage_alarm);
    gate(&mut overrides, gas, 166, h_linkage_alarm);
    gate(&mut overrides, gas, 268, h_gas_sensitivity);
    gate(&mut overrides, alarms, 294, h_buzzer_manual_mute);
    gate(&mut overrides, alarms, 295, h_test);
    gate(&mut overrides, gas, 313, h_state_work);
    gate(&mut overrides, gas, 314, h_gas);
    gate(&mut overrides, smoke, 314, h_smoke);
    gate(&mut overrides, gas, 315, h_gas_density);
    gate(&mut overrides, smoke, 315, h_smoke_density_full);
    gate(&mut overrides, smoke, 316, h_heartbeat_indicator);
    gate(&mut overrides, alarms, 317, h_buzzer_manual_alarm);
    gate(&mut overrides, alarms, 331, h_linkage_alarm);
    gate(&mut overrides, alarms, 332, h_linkage_alarm_state);

    // Models whose index 3 reading is a constant and meaningless.
    gate(
        &mut overrides,
        &["WXCJKG11LM", "WXCJKG12LM", "WXCJKG13LM", "MCCGQ14LM", "GZCGQ01LM", "JY-GZ-01AQ", "CTP-R01"],
        3,
        h_ignore,
    );

    // Wall switches with a soft/anti-flicker mode toggle.
    gate(
        &mut overrides,
        &[
            "WS-USC01", "WS-USC02", "WS-EUK01", "WS-EUK02", "QBKG27LM", "QBKG28LM", "QBKG29LM",
            "QBKG25LM", "QBKG38LM", "QBKG39LM", "ZNQBKG42LM", "ZNQBKG43LM", "ZNQBKG44LM",
            "ZNQBKG45LM",
        ],
        4,
        h_mode_switch,
    );

    gate(&mut overrides, &["MCCGQ11LM", "SJCGQ11LM"], 6, h_trigger_count);
    gate(
        &mut overrides,
        &["SSM-U01", "DLKZMK11LM", "SSM-U02", "DLKZMK12LM"],
        10,
        h_switch_type_gated,
    );
    gate(&mut overrides, &["RTCGQ11LM"], 11, h_illuminance_both);
    gate(&mut overrides, &["ZNCLBL01LM"], 13, h_curtain_firmware);
    gate(&mut overrides, &["ZNCLBL01LM"], 238, h_curtain_firmware);
    gate(&mut overrides, &["ZNLDP13LM"], 13, h_ignore);

    // Index 100: per-family meanings.
    gate(
        &mut overrides,
        &["QBKG18LM", "QBKG20LM", "QBKG31LM", "QBKG39LM", "QBKG41LM", "QBKG12LM", "QBKG03LM", "QBKG25LM"],
        100,
        h_state_left,
    );
    gate(&mut overrides, &["QBCZ15LM"], 100, h_state_relay);
    gate(&mut overrides, &["LLKZMK11LM"], 100, h_state_l1);
    gate(&mut overrides, &["WXKG14LM", "WXKG16LM", "WXKG17LM"], 100, h_click_mode);
    gate(
        &mut overrides,
        &[
            "WXCJKG11LM", "WXCJKG12LM", "WXCJKG13LM", "ZNMS12LM", "ZNCLBL01LM", "RTCGQ11LM",
            "RTCGQ12LM", "RTCGQ13LM", "RTCGQ14LM", "SJCGQ11LM",
        ],
        100,
        h_ignore,
    );
    gate(&mut overrides, &["RTCGQ15LM"], 100, h_occupancy);
    let weather = &["WSDCGQ01LM", "WSDCGQ11LM", "WSDCGQ12LM", "VOCKQJK11LM"];
    gate(&mut overrides, weather, 100, h_temperature_filtered);
    gate(&mut overrides, &["MCCGQ11LM", "MCCGQ14LM"], 100, h_contact);
    gate(&mut overrides, &["SJCGQ13LM"], 100, h_water_leak);
    gate(&mut overrides, &["JTYJ-GD-01LM/BW"], 100, h_smoke_density);
    gate(&mut overrides, &["GZCGQ01LM"], 100, h_illuminance_lux);

    // Index 101.
    gate(
        &mut overrides,
        &["QBKG18LM", "QBKG20LM", "QBKG31LM", "QBKG39LM", "QBKG41LM", "QBKG12LM", "QBKG03LM"],
        101,
        h_state_right,
    );
    gate(&mut overrides, &["QBCZ15LM"], 101, h_state_usb);
    gate(&mut overrides, &["QBKG25LM", "QBKG33LM", "QBKG34LM"], 101, h_state_center);
    gate(&mut overrides, &["LLKZMK11LM"], 101, h_state_l2);
    gate(
        &mut overrides,
        &["RTCGQ12LM", "RTCGQ14LM", "RTCGQ15LM"],
        101,
        h_illuminance_clamped,
    );
    gate(&mut overrides, weather, 101, h_humidity_filtered);
    gate(&mut overrides, &["ZNJLBL01LM", "ZNCLDJ12LM"], 101, h_battery_direct);
    gate(&mut overrides, &["ZNCLBL01LM"], 101, h_battery_half);
    gate(&mut overrides, &["RTCZCGQ11LM"], 101, h_presence);
    gate(&mut overrides, &["ZNXDD01LM"], 101, h_brightness);

    // Index 102.
    gate(&mut overrides, &["QBKG25LM", "QBKG33LM", "QBKG34LM"], 102, h_state_right);
    gate(&mut overrides, &["WSDCGQ01LM", "WSDCGQ11LM"], 102, h_pressure);
    // The scaled pressure attribute on the standard cluster is more
    // accurate for this model.
    gate(&mut overrides, &["WSDCGQ12LM"], 102, h_ignore);
    gate(&mut overrides, &["RTCZCGQ11LM"], 102, h_motion_sensitivity);
    gate(&mut overrides, &["ZNXDD01LM"], 102, h_color_temp);

    // Presence sensor (FP1) config attributes, old and new firmware ids.
    gate(&mut overrides, &["RTCZCGQ11LM"], 103, h_monitoring_mode);
    gate(&mut overrides, &["RTCZCGQ11LM"], 105, h_approach_distance);
    gate(&mut overrides, &["RTCZCGQ11LM"], 322, h_presence);
    gate(&mut overrides, &["RTCZCGQ11LM"], 323, h_presence_event);
    gate(&mut overrides, &["RTCZCGQ11LM"], 324, h_monitoring_mode);
    gate(&mut overrides, &["RTCZCGQ11LM"], 326, h_approach_distance);
    gate(&mut overrides, &["RTCZCGQ11LM"], 268, h_motion_sensitivity);

    // Motion sensors.
    gate(&mut overrides, &["RTCGQ13LM"], 105, h_motion_sensitivity);
    gate(&mut overrides, &["RTCGQ14LM"], 105, h_detection_interval);
    gate(&mut overrides, &["RTCGQ14LM"], 106, h_motion_sensitivity);
    gate(&mut overrides, &["RTCGQ14LM"], 107, h_trigger_indicator);
    gate(&mut overrides, &["RTCGQ13LM", "RTCGQ14LM"], 268, h_motion_sensitivity);
    gate(&mut overrides, &["RTCGQ14LM"], 338, h_trigger_indicator);

    // Contact sensor (T1).
    gate(&mut overrides, &["MCCGQ13LM"], 159, h_detection_distance);
    gate(&mut overrides, &["MCCGQ13LM"], 320, h_tamper);

    // Electric measurement exceptions.
    gate(&mut overrides, &["LLKZMK12LM"], 149, h_energy_milli);
    gate(&mut overrides, &["JTYJ-GD-01LM/BW"], 150, h_ignore);
    gate(&mut overrides, &["LLKZMK11LM"], 151, h_current_direct);
    gate(&mut overrides, &["DJT11LM"], 152, h_ignore);

    // Cube controller.
    gate(&mut overrides, &["CTP-R01"], 247, h_composite_cube);
    gate(&mut overrides, &["CTP-R01"], 328, h_operation_mode_cube);
    gate(&mut overrides, &["CTP-R01"], 329, h_side_up);

    // Plugs with a physical button lock.
    gate(
        &mut overrides,
        &["ZNCZ15LM", "QBCZ14LM", "QBCZ15LM", "SP-EUC01"],
        512,
        h_button_lock,
    );

    // Curtain drivers.
    gate(&mut overrides, &["ZNCLBL01LM"], 107, h_cover_position);
    gate(&mut overrides, &["ZNCLBL01LM"], 1025, h_hand_open);
    gate(&mut overrides, &["ZNJLBL01LM"], 1032, h_motor_speed);
    gate(&mut overrides, &["ZNJLBL01LM"], 1033, h_charging_status);
    gate(&mut overrides, &["ZNJLBL01LM"], 1034, h_battery_direct);
    gate(&mut overrides, &["ZNCLBL01LM"], 1035, h_voltage_direct);
    gate(&mut overrides, &["ZNCLBL01LM"], 1055, h_target_position);
    gate(&mut overrides, &["ZNCLBL01LM"], 1056, h_ignore);
    gate(&mut overrides, &["ZNCLBL01LM"], 1057, h_motor_state_curtain);
    gate(&mut overrides, &["ZNCLBL01LM"], 1061, h_manual_action);
    gate(&mut overrides, &["ZNCLBL01LM"], 1063, h_ignore);
    gate(&mut overrides, &["ZNCLBL01LM"], 1064, h_hooks);
    gate(&mut overrides, &["ZNCLBL01LM"], 1065, h_illuminance_x50);

    DispatchTable { defaults, overrides }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumi_core::MemorySink;

    fn run(model: &str, data: AttributeMap) -> NormalizedPayload {
        run_with_options(model, data, DecodeOptions::default())
    }

    fn run_with_options(
        model: &str,
        data: AttributeMap,
        options: DecodeOptions,
    ) -> NormalizedPayload {
        let sink = MemorySink::new();
        let mut ctx = DeviceContext::new();
        let mut scope = DecodeScope::new(model, options, &mut ctx, &sink);
        interpret(&data, &mut scope)
    }

    fn map(entries: &[(u16, AttrValue)]) -> AttributeMap {
        entries.iter().cloned().collect()
    }

    #[test]
    fn test_voltage_reports_battery_percentage() {
        let payload = run("RTCGQ14LM", map(&[(1, AttrValue::U64(2995))]));
        assert_eq!(payload["voltage"], json!(2995.0));
        assert_eq!(payload["battery"], json!(97));
    }

    #[test]
    fn test_voltage_without_curve_skips_battery() {
        let payload = run("SP-EUC01", map(&[(1, AttrValue::U64(2995))]));
        assert_eq!(payload["voltage"], json!(2995.0));
        assert!(!payload.contains_key("battery"));
    }

    #[test]
    fn test_power_outage_count_is_zero_based() {
        let payload = run("RTCGQ14LM", map(&[(5, AttrValue::U64(4))]));
        assert_eq!(payload["power_outage_count"], json!(3.0));
    }

    #[test]
    fn test_index_100_is_model_dependent() {
        // wall switch: left gang state
        let payload = run("QBKG18LM", map(&[(100, AttrValue::U64(1))]));
        assert_eq!(payload["state_left"], json!("ON"));
        // door sensor: contact, inverted
        let payload = run("MCCGQ11LM", map(&[(100, AttrValue::U64(0))]));
        assert_eq!(payload["contact"], json!(true));
        // weather sensor: temperature in hundredths
        let payload = run("WSDCGQ11LM", map(&[(100, AttrValue::I64(2166))]));
        assert_eq!(payload["temperature"], json!(21.66));
        // unlisted model falls back to plain on/off state
        let payload = run("ZNCZ15LM", map(&[(100, AttrValue::U64(1))]));
        assert_eq!(payload["state"], json!("ON"));
    }

    #[test]
    fn test_implausible_temperature_dropped_with_diagnostic() {
        let sink = MemorySink::new();
        let mut ctx = DeviceContext::new();
        let mut scope =
            DecodeScope::new("WSDCGQ11LM", DecodeOptions::default(), &mut ctx, &sink);
        let payload = interpret(&map(&[(100, AttrValue::I64(12_000))]), &mut scope);
        assert!(!payload.contains_key("temperature"));
        assert_eq!(sink.count_of(DiagnosticKind::OutOfRange), 1);
    }

    #[test]
    fn test_illuminance_clamped_above_65000() {
        let payload = run("RTCGQ14LM", map(&[(101, AttrValue::U64(65535))]));
        assert_eq!(payload["illuminance"], json!(0.0));
        let payload = run("RTCGQ14LM", map(&[(101, AttrValue::U64(120))]));
        assert_eq!(payload["illuminance"], json!(120.0));
    }

    #[test]
    fn test_presence_lookup() {
        let payload = run("RTCZCGQ11LM", map(&[(322, AttrValue::U64(1))]));
        assert_eq!(payload["presence"], json!(true));
        let payload = run("RTCZCGQ11LM", map(&[(322, AttrValue::U64(255))]));
        assert_eq!(payload["presence"], Value::Null);
    }

    #[test]
    fn test_unknown_attribute_is_logged_not_fatal() {
        let sink = MemorySink::new();
        let mut ctx = DeviceContext::new();
        let mut scope = DecodeScope::new("RTCGQ14LM", DecodeOptions::default(), &mut ctx, &sink);
        let payload = interpret(
            &map(&[(9999, AttrValue::U64(1)), (5, AttrValue::U64(1))]),
            &mut scope,
        );
        assert_eq!(payload["power_outage_count"], json!(0.0));
        assert_eq!(sink.count_of(DiagnosticKind::UnknownAttribute), 1);
    }

    #[test]
    fn test_nested_composite_buffer() {
        // 0xF7 carrying voltage (1) and outage count (5) records
        let inner = vec![1, 0x21, 0xB3, 0x0B, 5, 0x20, 0x02];
        let payload = run("RTCGQ14LM", map(&[(247, AttrValue::Bytes(inner))]));
        assert_eq!(payload["voltage"], json!(2995.0));
        assert_eq!(payload["power_outage_count"], json!(1.0));
    }

    #[test]
    fn test_nested_map_merges_with_outer() {
        let inner = map(&[(1, AttrValue::U64(2900))]);
        let payload = run(
            "MCCGQ11LM",
            map(&[(100, AttrValue::U64(1)), (65281, AttrValue::Map(inner))]),
        );
        assert_eq!(payload["contact"], json!(false));
        assert_eq!(payload["voltage"], json!(2900.0));
    }

    #[test]
    fn test_recursion_depth_bounded() {
        // four levels of nested attribute maps; the innermost value must
        // never surface
        let mut nested = AttributeMap::new();
        nested.insert(1, AttrValue::U64(2900));
        for _ in 0..4 {
            let mut outer = AttributeMap::new();
            outer.insert(65281, AttrValue::Map(nested));
            nested = outer;
        }
        let sink = MemorySink::new();
        let mut ctx = DeviceContext::new();
        let mut scope = DecodeScope::new("MCCGQ11LM", DecodeOptions::default(), &mut ctx, &sink);
        let payload = interpret(&nested, &mut scope);
        // depth limit kicked in before the innermost value
        assert!(!payload.contains_key("voltage"));
        assert_eq!(sink.count_of(DiagnosticKind::MalformedValue), 1);
    }

    #[test]
    fn test_struct_list_voltage_and_outage() {
        let payload = run(
            "MCCGQ11LM",
            map(&[(
                65282,
                AttrValue::List(vec![
                    AttrValue::U64(1),
                    AttrValue::U64(2985),
                    AttrValue::U64(0),
                    AttrValue::U64(0),
                    AttrValue::U64(6),
                ]),
            )]),
        );
        assert_eq!(payload["voltage"], json!(2985.0));
        assert_eq!(payload["battery"], json!(90));
        assert_eq!(payload["power_outage_count"], json!(5.0));
    }

    #[test]
    fn test_trigger_count_truncates_router_garbage() {
        let payload = run(
            "MCCGQ11LM",
            map(&[(
                6,
                AttrValue::List(vec![AttrValue::U64(0), AttrValue::U64(0x0004_0007)]),
            )]),
        );
        assert_eq!(payload["trigger_count"], json!(6.0));
    }

    #[test]
    fn test_cover_position_invert_option() {
        let data = map(&[(107, AttrValue::U64(30))]);
        let payload = run("ZNCLBL01LM", data.clone());
        assert_eq!(payload["position"], json!(30.0));
        assert_eq!(payload["state"], json!("OPEN"));

        let payload = run_with_options(
            "ZNCLBL01LM",
            data,
            DecodeOptions { invert_cover: true },
        );
        assert_eq!(payload["position"], json!(70.0));
        assert_eq!(payload["state"], json!("CLOSE"));
    }

    #[test]
    fn test_curtain_firmware_lands_in_context() {
        let sink = MemorySink::new();
        let mut ctx = DeviceContext::new();
        let mut scope = DecodeScope::new("ZNCLBL01LM", DecodeOptions::default(), &mut ctx, &sink);
        interpret(&map(&[(238, AttrValue::U64(0x0819))]), &mut scope);
        assert_eq!(ctx.file_version, Some(0x0819));
        assert_eq!(ctx.software_build_id.as_deref(), Some("0.0.0_0825"));
    }

    #[test]
    fn test_cube_pending_switch_applied_and_cleared() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_task = Arc::clone(&calls);

        let sink = MemorySink::new();
        let mut ctx = DeviceContext::new();
        ctx.pending_mode_switch = Some(lumi_core::PendingModeSwitch {
            new_mode: "scene_mode".to_string(),
            apply: Box::new(move || {
                calls_in_task.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        });

        let mut scope = DecodeScope::new("CTP-R01", DecodeOptions::default(), &mut ctx, &sink);
        let data = map(&[(247, AttrValue::Bytes(vec![155, 0x20, 0x00]))]);
        let payload = interpret(&data, &mut scope);

        assert_eq!(payload["operation_mode"], json!("scene_mode"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(ctx.pending_mode_switch.is_none());
    }

    #[test]
    fn test_cube_pending_switch_retained_on_failure() {
        let sink = MemorySink::new();
        let mut ctx = DeviceContext::new();
        ctx.pending_mode_switch = Some(lumi_core::PendingModeSwitch {
            new_mode: "scene_mode".to_string(),
            apply: Box::new(|| Err(lumi_core::TransportError("device unreachable".into()))),
        });

        let mut scope = DecodeScope::new("CTP-R01", DecodeOptions::default(), &mut ctx, &sink);
        let data = map(&[(247, AttrValue::Bytes(vec![155, 0x20, 0x00]))]);
        let payload = interpret(&data, &mut scope);

        // the failed switch is silent and stays queued for the next report
        assert!(!payload.contains_key("operation_mode"));
        assert!(ctx.pending_mode_switch.is_some());
    }

    #[test]
    fn test_cube_mode_from_report_when_no_task() {
        let payload = run("CTP-R01", map(&[(247, AttrValue::Bytes(vec![155, 0x20, 0x01]))]));
        assert_eq!(payload["operation_mode"], json!("scene_mode"));
    }

    #[test]
    fn test_button_lock_inverted() {
        let payload = run("ZNCZ15LM", map(&[(512, AttrValue::U64(1))]));
        assert_eq!(payload["button_lock"], json!("OFF"));
        // other models keep the decoupled/relay meaning
        let payload = run("QBKG25LM", map(&[(512, AttrValue::U64(0))]));
        assert_eq!(payload["operation_mode"], json!("decoupled"));
    }

    #[test]
    fn test_smoke_density_dbm_lookup() {
        let payload = run("JY-GZ-01AQ", map(&[(161, AttrValue::U64(3))]));
        assert_eq!(payload["smoke_density"], json!(3.0));
        assert_eq!(payload["smoke_density_dbm"], json!(0.093));
    }

    #[test]
    fn test_switch_type_ignores_noise_values() {
        let payload = run("SSM-U01", map(&[(10, AttrValue::U64(29146))]));
        assert!(payload.is_empty());
        let payload = run("SSM-U01", map(&[(10, AttrValue::U64(2))]));
        assert_eq!(payload["switch_type"], json!("momentary"));
    }
}
