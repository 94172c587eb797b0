//! Decoder for the vendor "miot struct" buffer format.
//!
//! The format is a flat sequence of records `[index u8][type tag u8][value]`
//! where the type tag fixes the value width. It is used for the composite
//! heartbeat/config attributes (0xF7, 0xFF01, 0xFF02 families) and for raw
//! basic-cluster reports on older devices.
//!
//! Two wire quirks are deliberate:
//! - 64-bit integers (tags 0x27 and 0x2F) are big-endian while every other
//!   multi-byte value is little-endian.
//! - Tags 0x42 and 0x5F are opaque; their observed widths (1 and 4 bytes)
//!   come from field captures, the values are discarded.
//!
//! Upstream advances only 4 value bytes for the f64 tag (0x3A) after
//! reading 8; that is treated as a latent bug here and the full 8-byte
//! width is consumed instead (see DESIGN.md).
//!
//! An unrecognized tag drops the record: the value width is unknown, so the
//! cursor moves forward a single byte to resynchronize, mirroring upstream
//! behavior. Truncated trailing records are dropped and end the scan. Both
//! cases surface as diagnostics, never as errors.

use lumi_core::{AttrValue, AttributeMap, Diagnostic, DiagnosticKind, DiagnosticSink};
use tracing::trace;

fn read_uint_le(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .rev()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}

fn read_int_le(bytes: &[u8]) -> i64 {
    let unsigned = read_uint_le(bytes);
    let bits = bytes.len() as u32 * 8;
    if bits == 64 {
        return unsigned as i64;
    }
    let sign = 1u64 << (bits - 1);
    if unsigned & sign != 0 {
        (unsigned | !(sign | (sign - 1))) as i64
    } else {
        unsigned as i64
    }
}

/// Value width in bytes for a known type tag, or `None` for tags whose
/// value is decoded but discarded, or an unknown tag.
fn tag_width(tag: u8) -> Option<usize> {
    match tag {
        0x10 | 0x20 | 0x28 => Some(1),
        0x21 | 0x29 => Some(2),
        0x22 | 0x2A => Some(3),
        0x23 | 0x2B | 0x39 => Some(4),
        0x24 | 0x2C => Some(5),
        0x25 | 0x2D => Some(6),
        0x26 | 0x2E => Some(7),
        0x27 | 0x2F | 0x3A => Some(8),
        _ => None,
    }
}

/// Decodes a miot struct buffer into an attribute map.
///
/// Duplicate indices keep the last occurrence, matching the order-dependent
/// overwrite semantics of the wire format.
pub fn decode_miot_struct(
    model: &str,
    buffer: &[u8],
    sink: &dyn DiagnosticSink,
) -> AttributeMap {
    let mut data = AttributeMap::new();
    let mut i = 0usize;

    while i + 1 < buffer.len() {
        let index = u16::from(buffer[i]);
        let tag = buffer[i + 1];

        // Opaque placeholder tags: skip a fixed width, discard the value.
        let skip = match tag {
            0x42 => Some(1usize),
            0x5F => Some(4usize),
            _ => None,
        };
        if let Some(width) = skip {
            sink.record(Diagnostic {
                model: model.to_string(),
                kind: DiagnosticKind::UnknownTypeTag,
                detail: format!("opaque vtype 0x{tag:02x} at offset {}, skipping {width}", i + 1),
            });
            i += 2 + width;
            continue;
        }

        let Some(width) = tag_width(tag) else {
            sink.record(Diagnostic {
                model: model.to_string(),
                kind: DiagnosticKind::UnknownTypeTag,
                detail: format!("unknown vtype 0x{tag:02x} at offset {}", i + 1),
            });
            // Width unknown; move a single byte to resynchronize.
            i += 1;
            continue;
        };

        let start = i + 2;
        let end = start + width;
        if end > buffer.len() {
            sink.record(Diagnostic {
                model: model.to_string(),
                kind: DiagnosticKind::TruncatedBuffer,
                detail: format!(
                    "record index {index} vtype 0x{tag:02x} needs {width} bytes, {} remain",
                    buffer.len() - start
                ),
            });
            break;
        }
        let raw = &buffer[start..end];

        let value = match tag {
            0x10 | 0x20 | 0x21 | 0x22 | 0x23 | 0x24 | 0x25 | 0x26 => {
                AttrValue::U64(read_uint_le(raw))
            }
            // 64-bit unsigned is big-endian on the wire
            0x27 => AttrValue::U64(u64::from_be_bytes(raw.try_into().unwrap())),
            0x28 | 0x29 | 0x2A | 0x2B | 0x2C | 0x2D | 0x2E => AttrValue::I64(read_int_le(raw)),
            // 64-bit signed is big-endian as well
            0x2F => AttrValue::I64(i64::from_be_bytes(raw.try_into().unwrap())),
            0x39 => AttrValue::F64(f64::from(f32::from_le_bytes(raw.try_into().unwrap()))),
            0x3A => AttrValue::F64(f64::from_le_bytes(raw.try_into().unwrap())),
            _ => unreachable!("tag_width covers every decoded tag"),
        };

        data.insert(index, value);
        i = end;
    }

    trace!(model, entries = data.len(), "decoded miot struct buffer");
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumi_core::MemorySink;

    fn decode(buffer: &[u8]) -> AttributeMap {
        decode_miot_struct("TEST01LM", buffer, &MemorySink::new())
    }

    #[test]
    fn test_u8_and_bool_records() {
        let data = decode(&[1, 0x21, 0xD2, 0x0B, 100, 0x20, 0x2A, 5, 0x10, 0x01]);
        assert_eq!(data.get(&1), Some(&AttrValue::U64(3026)));
        assert_eq!(data.get(&100), Some(&AttrValue::U64(0x2A)));
        assert_eq!(data.get(&5), Some(&AttrValue::U64(1)));
    }

    #[test]
    fn test_u16_sequence_cursor_advance() {
        // N records of tag 0x21 occupy exactly N * (2 + 2) bytes; a tight
        // concatenation must decode every record with correct LE values.
        let mut buffer = Vec::new();
        for n in 0u8..6 {
            buffer.extend_from_slice(&[n, 0x21, n, 0x01]);
        }
        assert_eq!(buffer.len(), 24);
        let data = decode(&buffer);
        assert_eq!(data.len(), 6);
        for n in 0u16..6 {
            assert_eq!(data.get(&n), Some(&AttrValue::U64(0x0100 + u64::from(n))));
        }
    }

    #[test]
    fn test_wide_uint_little_endian() {
        // u24, u32, u48
        let data = decode(&[
            7, 0x22, 0x01, 0x02, 0x03, //
            8, 0x23, 0x78, 0x56, 0x34, 0x12, //
            9, 0x25, 0x01, 0x00, 0x00, 0x00, 0x00, 0x80,
        ]);
        assert_eq!(data.get(&7), Some(&AttrValue::U64(0x030201)));
        assert_eq!(data.get(&8), Some(&AttrValue::U64(0x12345678)));
        assert_eq!(data.get(&9), Some(&AttrValue::U64(0x8000_0000_0001)));
    }

    #[test]
    fn test_u64_is_big_endian() {
        let data = decode(&[3, 0x27, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
        assert_eq!(data.get(&3), Some(&AttrValue::U64(0x0102030405060708)));
    }

    #[test]
    fn test_signed_sign_extension() {
        let data = decode(&[
            4, 0x28, 0xFF, // i8 -1
            5, 0x29, 0xFE, 0xFF, // i16 -2
            6, 0x2A, 0xFF, 0xFF, 0xFF, // i24 -1
        ]);
        assert_eq!(data.get(&4), Some(&AttrValue::I64(-1)));
        assert_eq!(data.get(&5), Some(&AttrValue::I64(-2)));
        assert_eq!(data.get(&6), Some(&AttrValue::I64(-1)));
    }

    #[test]
    fn test_float32() {
        let bytes = 1.5f32.to_le_bytes();
        let data = decode(&[10, 0x39, bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(data.get(&10), Some(&AttrValue::F64(1.5)));
    }

    #[test]
    fn test_float64_full_width() {
        let mut buffer = vec![11, 0x3A];
        buffer.extend_from_slice(&2.25f64.to_le_bytes());
        buffer.extend_from_slice(&[12, 0x20, 0x07]);
        let data = decode(&buffer);
        assert_eq!(data.get(&11), Some(&AttrValue::F64(2.25)));
        // the record after the f64 is still aligned
        assert_eq!(data.get(&12), Some(&AttrValue::U64(7)));
    }

    #[test]
    fn test_unknown_tag_reported_and_skipped() {
        let sink = MemorySink::new();
        let data = decode_miot_struct("TEST01LM", &[1, 0x77, 1, 0x20, 0x63], &sink);
        // one diagnostic per byte scanned until a valid record lines up
        // (0x77 at offset 1, then 0x01 at offset 2)
        assert_eq!(sink.count_of(DiagnosticKind::UnknownTypeTag), 2);
        // resynchronizes on the following valid record
        assert_eq!(data.get(&1), Some(&AttrValue::U64(0x63)));
    }

    #[test]
    fn test_opaque_tags_discard_value() {
        let sink = MemorySink::new();
        let data = decode_miot_struct(
            "TEST01LM",
            &[
                1, 0x42, 0xAA, // opaque, 1 byte
                2, 0x5F, 1, 2, 3, 4, // opaque, 4 bytes
                3, 0x20, 0x09,
            ],
            &sink,
        );
        assert_eq!(data.len(), 1);
        assert_eq!(data.get(&3), Some(&AttrValue::U64(9)));
        assert_eq!(sink.count_of(DiagnosticKind::UnknownTypeTag), 2);
    }

    #[test]
    fn test_truncated_record_dropped() {
        let sink = MemorySink::new();
        let data = decode_miot_struct("TEST01LM", &[1, 0x20, 0x05, 2, 0x23, 0x01, 0x02], &sink);
        assert_eq!(data.len(), 1);
        assert_eq!(data.get(&1), Some(&AttrValue::U64(5)));
        assert_eq!(sink.count_of(DiagnosticKind::TruncatedBuffer), 1);
    }

    #[test]
    fn test_empty_buffer() {
        assert!(decode(&[]).is_empty());
        assert!(decode(&[5]).is_empty());
    }

    #[test]
    fn test_duplicate_index_last_wins() {
        let data = decode(&[1, 0x20, 0x0A, 1, 0x20, 0x0B]);
        assert_eq!(data.get(&1), Some(&AttrValue::U64(0x0B)));
    }
}
