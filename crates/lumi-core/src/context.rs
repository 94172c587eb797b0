//! Per-device mutable state.
//!
//! The converters are pure per message except for a handful of values that
//! must survive between messages for one device. Those live here, owned by
//! whatever layer owns the device lifecycle, and are passed into the
//! converters by mutable reference. The host's event loop processes one
//! message per device at a time, so no locking happens at this level.

use std::fmt;

use thiserror::Error;

/// Error surfaced by the transport when a deferred write fails.
#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// A deferred operation-mode switch waiting for its configuration window.
///
/// The cube controller only accepts the mode-switch write in a short window
/// after a specific user gesture, signalled by the next composite (0xF7)
/// report. The converter stores the prepared write here; the dispatcher
/// runs it when the window opens. On failure the slot is kept so the switch
/// is retried on the next qualifying report.
pub struct PendingModeSwitch {
    /// Mode name to publish once the switch took effect
    pub new_mode: String,
    /// Sends the prepared attribute write to the device
    pub apply: Box<dyn FnMut() -> Result<(), TransportError> + Send>,
}

impl fmt::Debug for PendingModeSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingModeSwitch")
            .field("new_mode", &self.new_mode)
            .finish_non_exhaustive()
    }
}

/// Cross-message state for a single device.
#[derive(Debug, Default)]
pub struct DeviceContext {
    /// Deferred cube mode switch, consumed by the next 0xF7 report
    pub pending_mode_switch: Option<PendingModeSwitch>,
    /// Vendor firmware version as reported in heartbeats (raw LE integer)
    pub file_version: Option<u32>,
    /// Firmware version in the vendor's display format (`0.0.0_NNNN`)
    pub software_build_id: Option<String>,
    /// Rolling sequence counter for feeder tunnel frames
    pub feeder_seq: u8,
}

impl DeviceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next feeder frame sequence number (wraps at 256).
    pub fn next_feeder_seq(&mut self) -> u8 {
        self.feeder_seq = self.feeder_seq.wrapping_add(1);
        self.feeder_seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feeder_seq_wraps() {
        let mut ctx = DeviceContext::new();
        ctx.feeder_seq = 254;
        assert_eq!(ctx.next_feeder_seq(), 255);
        assert_eq!(ctx.next_feeder_seq(), 0);
        assert_eq!(ctx.next_feeder_seq(), 1);
    }

    #[test]
    fn test_pending_switch_slot() {
        let mut ctx = DeviceContext::new();
        assert!(ctx.pending_mode_switch.is_none());

        ctx.pending_mode_switch = Some(PendingModeSwitch {
            new_mode: "scene_mode".to_string(),
            apply: Box::new(|| Ok(())),
        });

        let mut task = ctx.pending_mode_switch.take().unwrap();
        assert_eq!(task.new_mode, "scene_mode");
        assert!((task.apply)().is_ok());
        assert!(ctx.pending_mode_switch.is_none());
    }
}
