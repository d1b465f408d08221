//! BLE transport boundary
//!
//! The protocol core only needs to read and write characteristic values on a
//! connected bulb. Anything that can do that (a real BLE stack, a test double)
//! implements [`Link`]; [`Transport`] produces links from device addresses.

use std::future::Future;

use bytes::Bytes;
use uuid::Uuid;

use crate::address::DeviceAddress;
use crate::error::MeshError;

/// GATT service carrying the mesh characteristics
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x00010203_0405_0607_0809_0a0b0c0d1910);

/// Status characteristic (read, write, notify)
pub const STATUS_CHAR_UUID: Uuid = Uuid::from_u128(0x00010203_0405_0607_0809_0a0b0c0d1911);

/// Command characteristic (read, write, write without response)
pub const COMMAND_CHAR_UUID: Uuid = Uuid::from_u128(0x00010203_0405_0607_0809_0a0b0c0d1912);

/// OTA characteristic (read, write without response)
pub const OTA_CHAR_UUID: Uuid = Uuid::from_u128(0x00010203_0405_0607_0809_0a0b0c0d1913);

/// Pairing characteristic (read, write)
pub const PAIR_CHAR_UUID: Uuid = Uuid::from_u128(0x00010203_0405_0607_0809_0a0b0c0d1914);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    WithResponse,
    WithoutResponse,
}

/// An open connection to one bulb.
pub trait Link: Send {
    fn read_characteristic(
        &mut self,
        service: Uuid,
        characteristic: Uuid,
    ) -> impl Future<Output = Result<Bytes, MeshError>> + Send;

    fn write_characteristic(
        &mut self,
        service: Uuid,
        characteristic: Uuid,
        value: &[u8],
        mode: WriteMode,
    ) -> impl Future<Output = Result<(), MeshError>> + Send;

    fn disconnect(&mut self) -> impl Future<Output = Result<(), MeshError>> + Send;
}

/// Opens links to bulbs.
pub trait Transport {
    type Link: Link;

    fn connect(&self, address: &DeviceAddress) -> impl Future<Output = Result<Self::Link, MeshError>> + Send;
}
