//! Thermostat (TRV) weekly-schedule codec and firmware version scheme.
//!
//! The schedule wire format is a fixed 26-byte record:
//!
//! ```text
//! byte 0      format tag (0x04 on write, ignored on read)
//! byte 1      day bitmask, bit (dayIndex + 1) set = weekday active
//! bytes 2..26 four 6-byte events at offsets 2, 8, 14, 20:
//!             [time u16 BE, bit 15 = "next day"][2 reserved][temp u16 BE, 0.01 °C]
//! ```
//!
//! The human-readable round-trip form is
//! `"mon,wed|8:00,24.0|18:00,17.0|23:00,22.0|8:00,22.0"`; it is the only
//! externally persisted text format this layer defines.

use std::fmt;

use thiserror::Error;

/// Number of events in every schedule record.
pub const SCHEDULE_EVENT_COUNT: usize = 4;
/// Encoded schedule length in bytes.
pub const SCHEDULE_BUFFER_LEN: usize = 26;

const MINUTES_PER_DAY: u16 = 24 * 60;
const MIN_EVENT_GAP_MINUTES: u16 = 60;
const TIME_NEXT_DAY_FLAG: u16 = 1 << 15;
const FORMAT_TAG: u8 = 0x04;

const FRAGMENT_SEPARATOR: char = '|';
const VALUE_SEPARATOR: char = ',';

/// Weekday tag as used in the day bitmask and the string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Mon,
        Day::Tue,
        Day::Wed,
        Day::Thu,
        Day::Fri,
        Day::Sat,
        Day::Sun,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Day::Mon => "mon",
            Day::Tue => "tue",
            Day::Wed => "wed",
            Day::Thu => "thu",
            Day::Fri => "fri",
            Day::Sat => "sat",
            Day::Sun => "sun",
        }
    }

    pub fn parse(name: &str) -> Option<Day> {
        Day::ALL.iter().copied().find(|d| d.name() == name)
    }

    fn index(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One schedule switch point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleEvent {
    /// Minutes since midnight, [0, 1440)
    pub time: u16,
    /// Target temperature in °C
    pub temperature: f64,
}

/// A weekly heating schedule: active days plus four switch points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScheduleConfig {
    pub days: Vec<Day>,
    pub events: Vec<ScheduleEvent>,
}

impl ScheduleConfig {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty() && self.events.is_empty()
    }
}

/// Validation and parse failures for schedule configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("the schedule must contain at least one day")]
    NoDays,
    #[error("\"{0}\" is not a valid day (available values: mon, tue, wed, thu, fri, sat, sun)")]
    InvalidDay(String),
    #[error("the schedule must contain exactly {SCHEDULE_EVENT_COUNT} time/temperature events")]
    WrongEventCount,
    #[error("time must be between 00:00 and 23:59")]
    TimeOutOfRange,
    #[error("the temperature must be between 5 and 30 °C")]
    TemperatureOutOfRange,
    #[error("the individual times must be at least 1 hour apart")]
    EventsTooClose,
    #[error("the start and end times must be at most 24 hours apart")]
    SpanTooLong,
    #[error("cannot parse time string \"{0}\"")]
    BadTimeString(String),
    #[error("cannot parse temperature \"{0}\"")]
    BadTemperature(String),
    #[error("schedule buffer must be {SCHEDULE_BUFFER_LEN} bytes, got {0}")]
    BadBufferLength(usize),
}

fn read_day_selection(bitmask: u8) -> Vec<Day> {
    Day::ALL
        .iter()
        .copied()
        .filter(|day| bitmask >> (day.index() + 1) & 1 != 0)
        .collect()
}

fn write_day_selection(days: &[Day]) -> u8 {
    days.iter().fold(0u8, |mask, day| mask | 1 << (day.index() + 1))
}

/// Formats minutes since midnight as `h:mm` (hours not zero-padded).
fn format_time(minutes: u16) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

fn parse_time(text: &str) -> Result<u16, ScheduleError> {
    let (hours, minutes) = text
        .split_once(':')
        .ok_or_else(|| ScheduleError::BadTimeString(text.to_string()))?;
    let hours: u16 = hours
        .trim()
        .parse()
        .map_err(|_| ScheduleError::BadTimeString(text.to_string()))?;
    let minutes: u16 = minutes
        .trim()
        .parse()
        .map_err(|_| ScheduleError::BadTimeString(text.to_string()))?;
    Ok(hours * 60 + minutes)
}

/// Decodes a 26-byte schedule record. The format tag and the per-event
/// "next day" flags are derived state and ignored on read.
pub fn decode_schedule(buffer: &[u8]) -> Result<ScheduleConfig, ScheduleError> {
    if buffer.len() != SCHEDULE_BUFFER_LEN {
        return Err(ScheduleError::BadBufferLength(buffer.len()));
    }

    let mut events = Vec::with_capacity(SCHEDULE_EVENT_COUNT);
    for slot in 0..SCHEDULE_EVENT_COUNT {
        let offset = 2 + slot * 6;
        let time = u16::from_be_bytes([buffer[offset], buffer[offset + 1]]) & !TIME_NEXT_DAY_FLAG;
        let temperature =
            f64::from(u16::from_be_bytes([buffer[offset + 4], buffer[offset + 5]])) / 100.0;
        events.push(ScheduleEvent { time, temperature });
    }

    Ok(ScheduleConfig {
        days: read_day_selection(buffer[1]),
        events,
    })
}

/// Encodes a schedule into the 26-byte wire record.
///
/// The "next day" flag of each event is computed by comparing its time to
/// the previous event's time (strictly smaller means it wraps past
/// midnight). Call [`validate_schedule`] first; encoding does not validate.
pub fn encode_schedule(schedule: &ScheduleConfig) -> [u8; SCHEDULE_BUFFER_LEN] {
    let mut buffer = [0u8; SCHEDULE_BUFFER_LEN];
    buffer[0] = FORMAT_TAG;
    buffer[1] = write_day_selection(&schedule.days);

    for (slot, event) in schedule.events.iter().enumerate() {
        let offset = 2 + slot * 6;
        let is_next_day = slot > 0 && event.time < schedule.events[slot - 1].time;
        let mut time = event.time;
        if is_next_day {
            time |= TIME_NEXT_DAY_FLAG;
        }
        buffer[offset..offset + 2].copy_from_slice(&time.to_be_bytes());
        let centi = (event.temperature * 100.0).round() as u16;
        buffer[offset + 4..offset + 6].copy_from_slice(&centi.to_be_bytes());
    }

    buffer
}

/// Checks a schedule against the device invariants.
pub fn validate_schedule(schedule: &ScheduleConfig) -> Result<(), ScheduleError> {
    if schedule.days.is_empty() {
        return Err(ScheduleError::NoDays);
    }

    if schedule.events.len() != SCHEDULE_EVENT_COUNT {
        return Err(ScheduleError::WrongEventCount);
    }

    for event in &schedule.events {
        if event.time >= MINUTES_PER_DAY {
            return Err(ScheduleError::TimeOutOfRange);
        }
        if event.temperature < 5.0 || event.temperature > 30.0 {
            return Err(ScheduleError::TemperatureOutOfRange);
        }
    }

    // Durations between consecutive events, wrapping at most once past
    // midnight.
    let mut total: u32 = 0;
    for pair in schedule.events.windows(2) {
        let previous = pair[0].time;
        let current = pair[1].time;
        let duration = if current < previous {
            MINUTES_PER_DAY - previous + current
        } else {
            current - previous
        };
        if duration < MIN_EVENT_GAP_MINUTES {
            return Err(ScheduleError::EventsTooClose);
        }
        total += u32::from(duration);
    }

    // A span over 24h would imply a second midnight wrap.
    if total > u32::from(MINUTES_PER_DAY) {
        return Err(ScheduleError::SpanTooLong);
    }

    Ok(())
}

/// Renders the schedule into its persisted string form.
///
/// Integral temperatures gain a ".0" suffix to signal that fractional
/// values are accepted; everything else keeps its natural representation.
pub fn stringify_schedule(schedule: &ScheduleConfig) -> String {
    let mut fragments = vec![schedule
        .days
        .iter()
        .map(|d| d.name())
        .collect::<Vec<_>>()
        .join(",")];

    for event in &schedule.events {
        let temperature = if event.temperature.fract() == 0.0 {
            format!("{:.1}", event.temperature)
        } else {
            format!("{}", event.temperature)
        };
        fragments.push(format!(
            "{}{VALUE_SEPARATOR}{temperature}",
            format_time(event.time)
        ));
    }

    fragments.join(&FRAGMENT_SEPARATOR.to_string())
}

/// Parses the persisted string form back into a schedule.
///
/// The empty string parses to the empty schedule: it is the stored
/// representation of "no schedule configured yet", not an error.
pub fn parse_schedule(text: &str) -> Result<ScheduleConfig, ScheduleError> {
    let mut schedule = ScheduleConfig::default();

    if text.is_empty() {
        return Ok(schedule);
    }

    for (index, fragment) in text.split(FRAGMENT_SEPARATOR).enumerate() {
        if index == 0 {
            for name in fragment.split(VALUE_SEPARATOR) {
                let day =
                    Day::parse(name.trim()).ok_or_else(|| ScheduleError::InvalidDay(name.into()))?;
                schedule.days.push(day);
            }
        } else {
            let (time, temperature) = fragment
                .split_once(VALUE_SEPARATOR)
                .ok_or_else(|| ScheduleError::BadTimeString(fragment.to_string()))?;
            schedule.events.push(ScheduleEvent {
                time: parse_time(time)?,
                temperature: temperature
                    .trim()
                    .parse()
                    .map_err(|_| ScheduleError::BadTemperature(temperature.to_string()))?,
            });
        }
    }

    Ok(schedule)
}

/// Reconstructs the vendor's display firmware version from the raw LE
/// integer reported in heartbeats (e.g. `[25, 8, 0, 0]` -> `0.0.0_0825`).
pub fn decode_firmware_version(value: u32) -> String {
    let bytes = value.to_le_bytes();
    let digits: String = bytes
        .iter()
        .rev()
        .skip(1)
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .concat();
    let number: u64 = digits.parse().unwrap_or(0);
    format!("0.0.0_{number:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schedule() -> ScheduleConfig {
        ScheduleConfig {
            days: vec![Day::Mon, Day::Wed, Day::Fri],
            events: vec![
                ScheduleEvent { time: 480, temperature: 24.0 },
                ScheduleEvent { time: 1080, temperature: 17.0 },
                ScheduleEvent { time: 1380, temperature: 22.0 },
                ScheduleEvent { time: 480, temperature: 22.0 },
            ],
        }
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let schedule = sample_schedule();
        let encoded = encode_schedule(&schedule);
        assert_eq!(encoded[0], 0x04);
        assert_eq!(decode_schedule(&encoded).unwrap(), schedule);
    }

    #[test]
    fn test_day_bitmask_layout() {
        // mon is bit 1, sun is bit 7
        let encoded = encode_schedule(&ScheduleConfig {
            days: vec![Day::Mon, Day::Sun],
            events: sample_schedule().events,
        });
        assert_eq!(encoded[1], 0b1000_0010);
    }

    #[test]
    fn test_next_day_flag_set_on_wraparound() {
        let encoded = encode_schedule(&sample_schedule());
        // last event (8:00 after 23:00) carries the next-day flag
        let raw_time = u16::from_be_bytes([encoded[20], encoded[21]]);
        assert_eq!(raw_time & TIME_NEXT_DAY_FLAG, TIME_NEXT_DAY_FLAG);
        assert_eq!(raw_time & !TIME_NEXT_DAY_FLAG, 480);
        // earlier events do not
        let first_time = u16::from_be_bytes([encoded[2], encoded[3]]);
        assert_eq!(first_time & TIME_NEXT_DAY_FLAG, 0);
    }

    #[test]
    fn test_temperature_hundredths() {
        let encoded = encode_schedule(&sample_schedule());
        assert_eq!(u16::from_be_bytes([encoded[6], encoded[7]]), 2400);
    }

    #[test]
    fn test_stringify_literal() {
        assert_eq!(
            stringify_schedule(&sample_schedule()),
            "mon,wed,fri|8:00,24.0|18:00,17.0|23:00,22.0|8:00,22.0"
        );
    }

    #[test]
    fn test_parse_stringify_roundtrip() {
        let schedule = sample_schedule();
        let parsed = parse_schedule(&stringify_schedule(&schedule)).unwrap();
        assert_eq!(parsed, schedule);
    }

    #[test]
    fn test_fractional_temperature_natural_form() {
        let mut schedule = sample_schedule();
        schedule.events[1].temperature = 17.5;
        let text = stringify_schedule(&schedule);
        assert!(text.contains("18:00,17.5"));
        assert_eq!(parse_schedule(&text).unwrap(), schedule);
    }

    #[test]
    fn test_parse_empty_is_empty_schedule() {
        let schedule = parse_schedule("").unwrap();
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_day() {
        assert_eq!(
            parse_schedule("mon,xyz|8:00,21|10:00,22|12:00,23|14:00,24"),
            Err(ScheduleError::InvalidDay("xyz".into()))
        );
    }

    #[test]
    fn test_validate_accepts_sample() {
        assert_eq!(validate_schedule(&sample_schedule()), Ok(()));
    }

    #[test]
    fn test_validate_rejects_empty_days() {
        let mut schedule = sample_schedule();
        schedule.days.clear();
        assert_eq!(validate_schedule(&schedule), Err(ScheduleError::NoDays));
    }

    #[test]
    fn test_validate_rejects_wrong_event_count() {
        let mut schedule = sample_schedule();
        schedule.events.pop();
        assert_eq!(
            validate_schedule(&schedule),
            Err(ScheduleError::WrongEventCount)
        );
    }

    #[test]
    fn test_validate_temperature_range() {
        let mut schedule = sample_schedule();
        schedule.events[2].temperature = 4.5;
        assert_eq!(
            validate_schedule(&schedule),
            Err(ScheduleError::TemperatureOutOfRange)
        );
        schedule.events[2].temperature = 30.5;
        assert_eq!(
            validate_schedule(&schedule),
            Err(ScheduleError::TemperatureOutOfRange)
        );
        schedule.events[2].temperature = 30.0;
        assert_eq!(validate_schedule(&schedule), Ok(()));
    }

    #[test]
    fn test_validate_spacing_boundary() {
        let mut schedule = sample_schedule();
        // 45 minutes apart fails
        schedule.events = vec![
            ScheduleEvent { time: 480, temperature: 21.0 },
            ScheduleEvent { time: 525, temperature: 22.0 },
            ScheduleEvent { time: 600, temperature: 23.0 },
            ScheduleEvent { time: 700, temperature: 24.0 },
        ];
        assert_eq!(
            validate_schedule(&schedule),
            Err(ScheduleError::EventsTooClose)
        );
        // exactly 60 minutes apart passes
        schedule.events[1].time = 540;
        assert_eq!(validate_schedule(&schedule), Ok(()));
    }

    #[test]
    fn test_validate_span_limit() {
        let mut schedule = sample_schedule();
        // 6:00 -> 5:00 next day -> 6:00: second wrap implied, span > 24h
        schedule.events = vec![
            ScheduleEvent { time: 360, temperature: 21.0 },
            ScheduleEvent { time: 300, temperature: 22.0 },
            ScheduleEvent { time: 360, temperature: 23.0 },
            ScheduleEvent { time: 600, temperature: 24.0 },
        ];
        assert_eq!(validate_schedule(&schedule), Err(ScheduleError::SpanTooLong));
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert_eq!(
            decode_schedule(&[0u8; 25]),
            Err(ScheduleError::BadBufferLength(25))
        );
    }

    #[test]
    fn test_firmware_version() {
        // LE integer [25, 8, 0, 0] -> reversed tail "0825"
        assert_eq!(decode_firmware_version(0x0000_0819), "0.0.0_0825");
        assert_eq!(decode_firmware_version(0), "0.0.0_0000");
    }
}
