//! Presence-sensor detection-region commands.
//!
//! The FP1 presence sensor exposes a 4x7 detection grid. A "region" is a
//! named subset of grid cells; the sensor reports enter/leave/occupied/
//! unoccupied events per region. Regions are configured through a 7-byte
//! command written to attribute 0x0150:
//!
//! ```text
//! byte 0    command code (create = 1, delete = 3)
//! byte 1    region id, 1..=10
//! bytes 2-5 per-row x bitmasks, nibble-packed: y=1 low / y=2 high nibble
//!           of byte 2, y=3/y=4 in byte 3, y=5/y=6 in byte 4, y=7 in the
//!           low nibble of byte 5; bit (x-1) set = cell selected
//! byte 6    suffix: 0xFF upsert, 0x00 delete
//! ```
//!
//! The wire protocol also defines a "modify" code (2), but it breaks
//! existing regions on real firmware; "create" replaces an existing region
//! wholesale, so modify is not part of the public contract here.
//!
//! User input arrives as loosely-typed JSON and is validated before any
//! encoding happens; a failed parse never produces a partial command.

use serde_json::Value;
use thiserror::Error;

/// Region configuration write target.
pub const REGION_CONFIG_ATTRIBUTE: u16 = 0x0150;
/// ZCL type tag for the region configuration value (octet string).
pub const REGION_CONFIG_TYPE: u8 = 0x41;
/// Attribute carrying inbound region events.
pub const REGION_EVENT_ATTRIBUTE: u16 = 0x0151;

pub const REGION_ID_MIN: u8 = 1;
pub const REGION_ID_MAX: u8 = 10;
pub const ZONE_X_MIN: u8 = 1;
pub const ZONE_X_MAX: u8 = 4;
pub const ZONE_Y_MIN: u8 = 1;
pub const ZONE_Y_MAX: u8 = 7;

const CMD_CREATE: u8 = 1;
const CMD_DELETE: u8 = 3;
const CMD_SUFFIX_UPSERT: u8 = 0xFF;
const CMD_SUFFIX_DELETE: u8 = 0x00;

/// Inbound region event codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionEvent {
    Enter,
    Leave,
    Occupied,
    Unoccupied,
}

impl RegionEvent {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Enter),
            2 => Some(Self::Leave),
            4 => Some(Self::Occupied),
            8 => Some(Self::Unoccupied),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Leave => "leave",
            Self::Occupied => "occupied",
            Self::Unoccupied => "unoccupied",
        }
    }
}

/// One grid cell, 1-based coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Zone {
    pub x: u8,
    pub y: u8,
}

/// A validated region definition ready for encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionDefinition {
    pub region_id: u8,
    pub zones: Vec<Zone>,
}

/// Why a region input was rejected. Each variant carries enough for a
/// user-facing diagnostic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionError {
    #[error("NOT_OBJECT: region command input must be an object")]
    NotObject,
    #[error("INVALID_REGION_ID: region_id must be an integer in [{REGION_ID_MIN}, {REGION_ID_MAX}]")]
    InvalidRegionId,
    #[error("ZONES_LIST_EMPTY: zones must be a non-empty list")]
    ZonesListEmpty,
    #[error("INVALID_ZONES: every zone needs integer x in [{ZONE_X_MIN}, {ZONE_X_MAX}] and y in [{ZONE_Y_MIN}, {ZONE_Y_MAX}]")]
    InvalidZones,
}

fn parse_region_id(input: &serde_json::Map<String, Value>) -> Result<u8, RegionError> {
    let id = input
        .get("region_id")
        .and_then(Value::as_u64)
        .ok_or(RegionError::InvalidRegionId)?;
    if (u64::from(REGION_ID_MIN)..=u64::from(REGION_ID_MAX)).contains(&id) {
        Ok(id as u8)
    } else {
        Err(RegionError::InvalidRegionId)
    }
}

fn parse_zone(value: &Value) -> Option<Zone> {
    let object = value.as_object()?;
    let x = object.get("x")?.as_u64()?;
    let y = object.get("y")?.as_u64()?;
    if (u64::from(ZONE_X_MIN)..=u64::from(ZONE_X_MAX)).contains(&x)
        && (u64::from(ZONE_Y_MIN)..=u64::from(ZONE_Y_MAX)).contains(&y)
    {
        Some(Zone {
            x: x as u8,
            y: y as u8,
        })
    } else {
        None
    }
}

/// Validates an upsert command input (`{"region_id": n, "zones": [{x, y}]}`).
pub fn parse_upsert_input(input: &Value) -> Result<RegionDefinition, RegionError> {
    let object = input.as_object().ok_or(RegionError::NotObject)?;
    let region_id = parse_region_id(object)?;

    let zones = match object.get("zones") {
        Some(Value::Array(zones)) if !zones.is_empty() => zones,
        _ => return Err(RegionError::ZonesListEmpty),
    };

    let zones = zones
        .iter()
        .map(parse_zone)
        .collect::<Option<Vec<_>>>()
        .ok_or(RegionError::InvalidZones)?;

    Ok(RegionDefinition { region_id, zones })
}

/// Validates a delete command input (`{"region_id": n}`).
pub fn parse_delete_input(input: &Value) -> Result<u8, RegionError> {
    let object = input.as_object().ok_or(RegionError::NotObject)?;
    parse_region_id(object)
}

/// Bitmask over the selected x cells of one row, bit (x-1) per cell.
fn row_mask(zones: &[Zone], y: u8) -> u8 {
    zones
        .iter()
        .filter(|zone| zone.y == y)
        .fold(0u8, |mask, zone| mask | 1 << (zone.x - 1))
}

/// Encodes a create/replace command for a validated region definition.
pub fn encode_upsert(definition: &RegionDefinition) -> [u8; 7] {
    let zones = &definition.zones;
    [
        CMD_CREATE,
        definition.region_id,
        row_mask(zones, 1) | row_mask(zones, 2) << 4,
        row_mask(zones, 3) | row_mask(zones, 4) << 4,
        row_mask(zones, 5) | row_mask(zones, 6) << 4,
        row_mask(zones, 7),
        CMD_SUFFIX_UPSERT,
    ]
}

/// Encodes a delete command. The zone mask bytes stay zeroed.
pub fn encode_delete(region_id: u8) -> [u8; 7] {
    [CMD_DELETE, region_id, 0, 0, 0, 0, CMD_SUFFIX_DELETE]
}
