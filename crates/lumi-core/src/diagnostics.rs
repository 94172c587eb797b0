//! Diagnostic sink for decode anomalies.
//!
//! Malformed or partially-understood device data is tolerated by design:
//! decoders skip what they cannot interpret and keep going, because field
//! firmware is routinely ahead of (or behind) what this layer knows about.
//! Every skip is reported through a `DiagnosticSink` so tests can assert on
//! the anomalies instead of scraping log output.

use std::fmt;
use std::sync::Mutex;

use tracing::{debug, warn};

/// What kind of anomaly was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Unrecognized type tag in a vendor struct buffer
    UnknownTypeTag,
    /// Attribute index with no registered interpretation
    UnknownAttribute,
    /// Value present but outside the plausible range, payload key omitted
    OutOfRange,
    /// Buffer too short for the record it announces
    TruncatedBuffer,
    /// Structurally unexpected payload (wrong value shape)
    MalformedValue,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTypeTag => write!(f, "unknown_type_tag"),
            Self::UnknownAttribute => write!(f, "unknown_attribute"),
            Self::OutOfRange => write!(f, "out_of_range"),
            Self::TruncatedBuffer => write!(f, "truncated_buffer"),
            Self::MalformedValue => write!(f, "malformed_value"),
        }
    }
}

/// A single recorded decode anomaly.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Device model the anomaly was observed for
    pub model: String,
    pub kind: DiagnosticKind,
    /// Free-form detail (attribute index, tag value, offset, ...)
    pub detail: String,
}

/// Receiver for decode anomalies.
pub trait DiagnosticSink {
    fn record(&self, diagnostic: Diagnostic);
}

/// Default sink: forwards anomalies to `tracing`.
///
/// Unknown attributes and type tags are debug-level noise (new firmware
/// reports them constantly); the rest is worth a warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, diagnostic: Diagnostic) {
        match diagnostic.kind {
            DiagnosticKind::UnknownTypeTag | DiagnosticKind::UnknownAttribute => {
                debug!(
                    model = %diagnostic.model,
                    kind = %diagnostic.kind,
                    "{}",
                    diagnostic.detail
                );
            }
            _ => {
                warn!(
                    model = %diagnostic.model,
                    kind = %diagnostic.kind,
                    "{}",
                    diagnostic.detail
                );
            }
        }
    }
}

/// Collecting sink for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.kind == kind)
            .count()
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, diagnostic: Diagnostic) {
        self.entries.lock().unwrap().push(diagnostic);
    }
}

/// Formats bytes as a `aa:bb:cc` hex sequence for diagnostics.
pub fn hex_sequence(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}
