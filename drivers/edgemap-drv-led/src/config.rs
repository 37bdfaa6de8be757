//! Wire shapes of the three configuration fragments supplied by the
//! mapper host. Field names are the wire contract. All fields are
//! optional on the wire: unknown fields are ignored and missing ones
//! fall back to their type's default, so hosts and drivers can be
//! upgraded independently.

use edgemap_api::{
    driver::{self, Identity},
    Fragment, Result,
};

/// Settings shared by every device of a protocol group.

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(rename = "customizedValues")]
    pub customized_values: CustomizedValues,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct CustomizedValues {
    #[serde(rename = "protocolID")]
    pub protocol_id: i32,
}

/// The shape of the data the host expects a read to produce.

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisitorConfig {
    pub protocol_name: String,
    pub data_type: String,
}

/// Per-device protocol settings.

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    #[serde(rename = "protocolName")]
    pub protocol_name: String,
    #[serde(rename = "deviceID")]
    pub device_id: i32,
}

// Each fragment has a pure parser; decoding applies nothing by
// itself. The `apply` methods below fold a decoded fragment into the
// working identity, each touching only the fields it owns.

pub fn parse_common(raw: &[u8]) -> Result<CommonConfig> {
    driver::decode_fragment(Fragment::Common, raw)
}

pub fn parse_visitor(raw: &[u8]) -> Result<VisitorConfig> {
    driver::decode_fragment(Fragment::Visitor, raw)
}

pub fn parse_protocol(raw: &[u8]) -> Result<ProtocolConfig> {
    driver::decode_fragment(Fragment::Protocol, raw)
}

impl CommonConfig {
    pub fn apply(self, id: &mut Identity) {
        id.protocol_id = self.customized_values.protocol_id;
    }
}

impl VisitorConfig {
    pub fn apply(self, id: &mut Identity) {
        id.data_type = self.data_type;
    }
}

impl ProtocolConfig {
    pub fn apply(self, id: &mut Identity) {
        id.device_id = self.device_id;
    }
}
