//! Cube controller (CTP-R01) mode switching.
//!
//! The cube only accepts the operation-mode write during a short
//! configuration window that opens after a forceful throw gesture. The
//! converter therefore prepares the write and parks it in the device
//! context; the dispatcher runs it when the next composite report signals
//! the window (see `dispatch::h_composite_cube`).

use lumi_core::{DeviceContext, PendingModeSwitch, TransportError, WriteRequest, ZclValue};

use crate::converters::ConvertError;

pub const ATTR_OPERATION_MODE: u16 = 0x0148;

/// The attribute write the transport must send once the window opens.
pub fn mode_switch_write(mode: &str) -> Result<WriteRequest, ConvertError> {
    let code = match mode {
        "action_mode" => 0,
        "scene_mode" => 1,
        _ => {
            return Err(ConvertError::UnsupportedValue {
                key: "operation_mode",
                value: mode.to_string(),
            })
        }
    };
    Ok(WriteRequest::lumi(ATTR_OPERATION_MODE, ZclValue::u8(code)))
}

/// Queues the deferred mode switch. `apply` is expected to send the write
/// from [`mode_switch_write`]; it runs on the next qualifying report and
/// stays queued if it fails. A second call replaces the queued switch.
pub fn queue_mode_switch(
    mode: &str,
    ctx: &mut DeviceContext,
    apply: Box<dyn FnMut() -> Result<(), TransportError> + Send>,
) -> Result<(), ConvertError> {
    // validates the mode name up front
    mode_switch_write(mode)?;
    ctx.pending_mode_switch = Some(PendingModeSwitch {
        new_mode: mode.to_string(),
        apply,
    });
    Ok(())
}
