//! Narrow interface to the Zigbee transport framework.
//!
//! Inbound reports arrive as an [`AttributeMap`] tagged with the cluster
//! they were reported on. Outbound commands are value-level descriptions of
//! attribute writes; the actual ZCL frame encoding, retries and
//! acknowledgements are the transport's business.

use serde::{Deserialize, Serialize};

use crate::value::{AttrValue, AttributeMap};

/// The Lumi manufacturer-specific cluster.
pub const CLUSTER_LUMI: &str = "manuSpecificLumi";
/// The standard basic cluster (legacy devices report through it).
pub const CLUSTER_BASIC: &str = "genBasic";

/// Lumi / Xiaomi manufacturer code carried on every vendor write.
pub const MANUFACTURER_CODE: u16 = 0x115F;

/// An inbound attribute report or read response.
#[derive(Debug, Clone)]
pub struct ReportMessage {
    pub cluster: String,
    pub data: AttributeMap,
}

impl ReportMessage {
    pub fn new(cluster: impl Into<String>, data: AttributeMap) -> Self {
        Self {
            cluster: cluster.into(),
            data,
        }
    }
}

/// A typed ZCL attribute value for an outbound write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZclValue {
    /// ZCL data type tag (0x10 bool, 0x20 u8, 0x23 u32, 0x41 octet string, ...)
    pub data_type: u8,
    pub value: AttrValue,
}

impl ZclValue {
    pub fn bool(value: bool) -> Self {
        Self {
            data_type: 0x10,
            value: AttrValue::U64(u64::from(value)),
        }
    }

    pub fn u8(value: u8) -> Self {
        Self {
            data_type: 0x20,
            value: AttrValue::U64(u64::from(value)),
        }
    }

    pub fn u32(value: u32) -> Self {
        Self {
            data_type: 0x23,
            value: AttrValue::U64(u64::from(value)),
        }
    }

    pub fn octets(value: Vec<u8>) -> Self {
        Self {
            data_type: 0x41,
            value: AttrValue::Bytes(value),
        }
    }
}

/// One attribute in an outbound write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeWrite {
    pub id: u16,
    pub value: ZclValue,
}

/// A cluster write request handed to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteRequest {
    pub cluster: String,
    pub attributes: Vec<AttributeWrite>,
    pub manufacturer_code: Option<u16>,
}

impl WriteRequest {
    /// A single-attribute write on the Lumi cluster with the vendor
    /// manufacturer code.
    pub fn lumi(id: u16, value: ZclValue) -> Self {
        Self {
            cluster: CLUSTER_LUMI.to_string(),
            attributes: vec![AttributeWrite { id, value }],
            manufacturer_code: Some(MANUFACTURER_CODE),
        }
    }
}
