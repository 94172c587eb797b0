//! Pet-feeder tunnel frames.
//!
//! The feeder does not use plain attributes; it tunnels its own key/value
//! protocol through octet-string writes and reports on attribute 0xFFF1:
//!
//! ```text
//! [0x00, 0x02, seq][attr code i32 BE (4 bytes)][len u8][value: len bytes]
//! ```
//!
//! Feeding schedules travel inside such frames as a comma-separated list of
//! hex-encoded quintets `[day mask][hour][minute][portion size][0]`.

use thiserror::Error;

/// Attribute the tunnel frames ride on.
pub const FEEDER_ATTRIBUTE: u16 = 0xFFF1;

/// Tunneled attribute codes.
pub mod attr {
    pub const FEED: i32 = 0x0415_0055;
    pub const FEEDING_REPORT: i32 = 0x0415_02BC;
    pub const PORTIONS_PER_DAY: i32 = 0x0D68_0055;
    pub const WEIGHT_PER_DAY: i32 = 0x0D69_0055;
    pub const ERROR: i32 = 0x0D0B_0055;
    pub const SCHEDULE: i32 = 0x0800_08C8;
    pub const LED_INDICATOR: i32 = 0x0417_0055;
    pub const CHILD_LOCK: i32 = 0x0416_0055;
    pub const MODE: i32 = 0x0418_0055;
    pub const SERVING_SIZE: i32 = 0x0E5C_0055;
    pub const PORTION_WEIGHT: i32 = 0x0E5F_0055;
}

/// Day-mask vocabulary for feeding schedules.
pub const DAYS_LOOKUP: [(u8, &str); 12] = [
    (0x7F, "everyday"),
    (0x1F, "workdays"),
    (0x60, "weekend"),
    (0x01, "mon"),
    (0x02, "tue"),
    (0x04, "wed"),
    (0x08, "thu"),
    (0x10, "fri"),
    (0x20, "sat"),
    (0x40, "sun"),
    (0x55, "mon-wed-fri-sun"),
    (0x2A, "tue-thu-sat"),
];

pub fn days_name(mask: u8) -> Option<&'static str> {
    DAYS_LOOKUP
        .iter()
        .find(|(m, _)| *m == mask)
        .map(|(_, name)| *name)
}

pub fn days_mask(name: &str) -> Option<u8> {
    DAYS_LOOKUP
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(mask, _)| *mask)
}

/// A parsed tunnel frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeederFrame {
    pub attr_code: i32,
    pub value: Vec<u8>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeederError {
    #[error("feeder frame too small: {0} bytes")]
    FrameTooSmall(usize),
    #[error("feeder frame announces {announced} value bytes, {available} available")]
    ValueTruncated { announced: usize, available: usize },
    #[error("feeder value does not fit the frame length field: {0} bytes")]
    ValueTooLong(usize),
}

/// Splits an inbound 0xFFF1 report into attribute code and value.
pub fn parse_feeder_frame(raw: &[u8]) -> Result<FeederFrame, FeederError> {
    if raw.len() < 8 {
        return Err(FeederError::FrameTooSmall(raw.len()));
    }

    let attr_code = i32::from_be_bytes(raw[3..7].try_into().unwrap());
    let len = usize::from(raw[7]);
    let available = raw.len() - 8;
    if len > available {
        return Err(FeederError::ValueTruncated {
            announced: len,
            available,
        });
    }

    Ok(FeederFrame {
        attr_code,
        value: raw[8..8 + len].to_vec(),
    })
}

/// Builds an outbound tunnel frame for a write.
pub fn build_feeder_frame(seq: u8, attr_code: i32, value: &[u8]) -> Result<Vec<u8>, FeederError> {
    let len = u8::try_from(value.len()).map_err(|_| FeederError::ValueTooLong(value.len()))?;

    let mut frame = Vec::with_capacity(8 + value.len());
    frame.extend_from_slice(&[0x00, 0x02, seq]);
    frame.extend_from_slice(&attr_code.to_be_bytes());
    frame.push(len);
    frame.extend_from_slice(value);
    Ok(frame)
}

/// One feeding schedule entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedingScheduleEntry {
    pub days: &'static str,
    pub hour: u8,
    pub minute: u8,
    pub size: u8,
}

/// Parses the comma-separated hex schedule string carried in a frame.
///
/// Placeholder entries (`//`) and entries with an unknown day mask are
/// skipped, matching device behavior for unused slots.
pub fn parse_feeding_schedule(text: &str) -> Vec<FeedingScheduleEntry> {
    text.split(',')
        .filter(|entry| *entry != "//")
        .filter_map(|entry| {
            let bytes = hex::decode(entry).ok()?;
            if bytes.len() < 4 {
                return None;
            }
            Some(FeedingScheduleEntry {
                days: days_name(bytes[0])?,
                hour: bytes[1],
                minute: bytes[2],
                size: bytes[3],
            })
        })
        .collect()
}

/// Renders schedule entries into the wire string (hex quintets, trailing
/// NUL appended by the caller's frame builder).
pub fn encode_feeding_schedule(entries: &[FeedingScheduleEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            hex::encode([
                days_mask(entry.days).unwrap_or(0x7F),
                entry.hour,
                entry.minute,
                entry.size,
                0,
            ])
        })
        .collect::<Vec<_>>()
        .join(",")
}
