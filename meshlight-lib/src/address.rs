use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MeshError;

/// BLE address of the bulb a connection talks to.
///
/// The nonce of every packet carries four bytes of the address, taken from the
/// byte-reversed MAC (i.e. its last four bytes, least significant first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceAddress {
    /// Full 6-byte MAC in display order (`A4:C1:38:...`)
    Mac([u8; 6]),
    /// The 4 address bytes used by the nonce, in display order
    Short([u8; 4]),
}

impl DeviceAddress {
    /// Nonce prefix: the address bytes, reversed.
    pub fn nonce_prefix(&self) -> [u8; 4] {
        let tail: [u8; 4] = match self {
            DeviceAddress::Mac(mac) => [mac[2], mac[3], mac[4], mac[5]],
            DeviceAddress::Short(short) => *short,
        };
        [tail[3], tail[2], tail[1], tail[0]]
    }

    /// Raw address bytes in display order.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            DeviceAddress::Mac(mac) => mac,
            DeviceAddress::Short(short) => short,
        }
    }
}

impl FromStr for DeviceAddress {
    type Err = MeshError;

    /// Accepts `AA:BB:CC:DD:EE:FF`, `AA-BB-...` or bare hex; 6 or 4 bytes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.chars().filter(|c| *c != ':' && *c != '-').collect();
        let bytes = hex::decode(&digits).map_err(|e| MeshError::InvalidAddress(format!("{s}: {e}")))?;

        match bytes.len() {
            6 => Ok(DeviceAddress::Mac([bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]])),
            4 => Ok(DeviceAddress::Short([bytes[0], bytes[1], bytes[2], bytes[3]])),
            n => Err(MeshError::InvalidAddress(format!("{s}: expected 4 or 6 bytes, got {n}"))),
        }
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.as_bytes().iter().map(|b| format!("{:02X}", b)).collect();
        write!(f, "{}", parts.join(":"))
    }
}

impl Serialize for DeviceAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeviceAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
