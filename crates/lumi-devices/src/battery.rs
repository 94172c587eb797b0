//! Battery voltage to percentage conversion.
//!
//! Lumi devices report raw battery voltage in millivolts; the discharge
//! curve depends on the cell chemistry and the device's cutoff voltage, so
//! each model's metadata names one of a fixed set of curves.

use serde::{Deserialize, Serialize};

/// Discharge curve identifiers, named by nominal voltage and cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoltageCurve {
    /// Piecewise CR2450 curve with a 2100 mV cutoff
    V3_2100,
    /// Linear between 2500 and 3000 mV
    V3_2500,
    /// Linear between 2500 and 3200 mV
    V3_2500_3200,
    /// Linear between 2850 and 3000 mV (most coin-cell sensors)
    V3_2850_3000,
    /// Inverse curve for 1500-2800 mV packs
    V3_1500_2800,
}

fn linear(voltage: f64, min: f64, max: f64) -> u8 {
    let percentage = (voltage - min) / (max - min) * 100.0;
    percentage.clamp(0.0, 100.0).round() as u8
}

/// Converts a raw millivolt reading into a 0-100 percentage.
pub fn voltage_to_percentage(voltage: f64, curve: VoltageCurve) -> u8 {
    match curve {
        VoltageCurve::V3_2100 => {
            let percentage = if voltage < 2100.0 {
                0.0
            } else if voltage < 2440.0 {
                6.0 - (2440.0 - voltage) * 6.0 / 340.0
            } else if voltage < 2740.0 {
                18.0 - (2740.0 - voltage) * 12.0 / 300.0
            } else if voltage < 2900.0 {
                42.0 - (2900.0 - voltage) * 24.0 / 160.0
            } else if voltage < 3000.0 {
                100.0 - (3000.0 - voltage) * 58.0 / 100.0
            } else {
                100.0
            };
            percentage.round() as u8
        }
        VoltageCurve::V3_2500 => linear(voltage, 2500.0, 3000.0),
        VoltageCurve::V3_2500_3200 => linear(voltage, 2500.0, 3200.0),
        VoltageCurve::V3_2850_3000 => linear(voltage, 2850.0, 3000.0),
        VoltageCurve::V3_1500_2800 => {
            let percentage = 235.0 - 370000.0 / (voltage + 1.0);
            percentage.clamp(0.0, 100.0).round() as u8
        }
    }
}
