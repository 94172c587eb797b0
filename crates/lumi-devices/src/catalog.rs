//! Per-model metadata.
//!
//! The full device database lives outside this layer; the dispatcher only
//! needs the model identity string plus the few per-model facts that change
//! how raw values are interpreted (currently the battery discharge curve).

use crate::battery::VoltageCurve;

/// Metadata for one device model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelMeta {
    /// Normalized vendor model string (e.g. "RTCGQ14LM")
    pub model: &'static str,
    /// Battery curve, for models that report raw voltage
    pub battery_curve: Option<VoltageCurve>,
}

impl ModelMeta {
    pub const fn new(model: &'static str) -> Self {
        Self {
            model,
            battery_curve: None,
        }
    }

    pub const fn with_battery(model: &'static str, curve: VoltageCurve) -> Self {
        Self {
            model,
            battery_curve: Some(curve),
        }
    }
}

/// Built-in metadata for the models the converters know about.
///
/// Kept sorted by model string; `find_model` relies on it.
const MODELS: &[ModelMeta] = &[
    ModelMeta::with_battery("CTP-R01", VoltageCurve::V3_2850_3000),
    ModelMeta::new("DJT11LM"),
    ModelMeta::new("DLKZMK11LM"),
    ModelMeta::new("DLKZMK12LM"),
    ModelMeta::new("GZCGQ01LM"),
    ModelMeta::new("JT-BZ-01AQ/A"),
    ModelMeta::with_battery("JTYJ-GD-01LM/BW", VoltageCurve::V3_2850_3000),
    ModelMeta::with_battery("JY-GZ-01AQ", VoltageCurve::V3_2850_3000),
    ModelMeta::new("LLKZMK11LM"),
    ModelMeta::new("LLKZMK12LM"),
    ModelMeta::with_battery("MCCGQ11LM", VoltageCurve::V3_2850_3000),
    ModelMeta::with_battery("MCCGQ13LM", VoltageCurve::V3_2850_3000),
    ModelMeta::with_battery("MCCGQ14LM", VoltageCurve::V3_2850_3000),
    ModelMeta::new("QBCZ14LM"),
    ModelMeta::new("QBCZ15LM"),
    ModelMeta::new("QBKG03LM"),
    ModelMeta::new("QBKG12LM"),
    ModelMeta::new("QBKG18LM"),
    ModelMeta::new("QBKG20LM"),
    ModelMeta::new("QBKG25LM"),
    ModelMeta::new("QBKG27LM"),
    ModelMeta::new("QBKG28LM"),
    ModelMeta::new("QBKG29LM"),
    ModelMeta::new("QBKG31LM"),
    ModelMeta::new("QBKG33LM"),
    ModelMeta::new("QBKG34LM"),
    ModelMeta::new("QBKG38LM"),
    ModelMeta::new("QBKG39LM"),
    ModelMeta::new("QBKG41LM"),
    ModelMeta::with_battery("RTCGQ11LM", VoltageCurve::V3_2850_3000),
    ModelMeta::with_battery("RTCGQ12LM", VoltageCurve::V3_2850_3000),
    ModelMeta::with_battery("RTCGQ13LM", VoltageCurve::V3_2850_3000),
    ModelMeta::with_battery("RTCGQ14LM", VoltageCurve::V3_2850_3000),
    ModelMeta::new("RTCGQ15LM"),
    ModelMeta::new("RTCZCGQ11LM"),
    ModelMeta::with_battery("SJCGQ11LM", VoltageCurve::V3_2850_3000),
    ModelMeta::with_battery("SJCGQ13LM", VoltageCurve::V3_2850_3000),
    ModelMeta::new("SP-EUC01"),
    ModelMeta::new("SRTS-A01"),
    ModelMeta::new("SSM-U01"),
    ModelMeta::new("SSM-U02"),
    ModelMeta::new("VOCKQJK11LM"),
    ModelMeta::new("WS-EUK01"),
    ModelMeta::new("WS-EUK02"),
    ModelMeta::new("WS-USC01"),
    ModelMeta::new("WS-USC02"),
    ModelMeta::with_battery("WSDCGQ01LM", VoltageCurve::V3_2850_3000),
    ModelMeta::with_battery("WSDCGQ11LM", VoltageCurve::V3_2850_3000),
    ModelMeta::with_battery("WSDCGQ12LM", VoltageCurve::V3_2850_3000),
    ModelMeta::new("WXCJKG11LM"),
    ModelMeta::new("WXCJKG12LM"),
    ModelMeta::new("WXCJKG13LM"),
    ModelMeta::new("WXKG14LM"),
    ModelMeta::new("WXKG16LM"),
    ModelMeta::new("WXKG17LM"),
    ModelMeta::new("ZNCLBL01LM"),
    ModelMeta::new("ZNCLDJ12LM"),
    ModelMeta::new("ZNCWWSQ01LM"),
    ModelMeta::new("ZNCZ15LM"),
    ModelMeta::new("ZNJLBL01LM"),
    ModelMeta::new("ZNLDP13LM"),
    ModelMeta::new("ZNMS12LM"),
    ModelMeta::new("ZNQBKG42LM"),
    ModelMeta::new("ZNQBKG43LM"),
    ModelMeta::new("ZNQBKG44LM"),
    ModelMeta::new("ZNQBKG45LM"),
    ModelMeta::new("ZNXDD01LM"),
];

/// Looks up the metadata for a model string.
pub fn find_model(model: &str) -> Option<ModelMeta> {
    MODELS
        .binary_search_by(|meta| meta.model.cmp(model))
        .map(|index| MODELS[index])
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_sorted() {
        for pair in MODELS.windows(2) {
            assert!(pair[0].model < pair[1].model, "{} >= {}", pair[0].model, pair[1].model);
        }
    }

    #[test]
    fn test_find_known_model() {
        let meta = find_model("RTCGQ14LM").unwrap();
        assert_eq!(meta.model, "RTCGQ14LM");
        assert_eq!(meta.battery_curve, Some(VoltageCurve::V3_2850_3000));
    }

    #[test]
    fn test_find_unknown_model() {
        assert!(find_model("NOPE01LM").is_none());
    }
}
