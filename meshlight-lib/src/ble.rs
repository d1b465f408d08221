//! btleplug-backed transport
//!
//! Scans with the first Bluetooth adapter, connects to the bulb with the
//! requested address and discovers its services.

use std::future::Future;
use std::time::Duration;

use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use bytes::Bytes;
use tracing::{debug, info};
use uuid::Uuid;

use crate::address::DeviceAddress;
use crate::error::MeshError;
use crate::transport::{Link, Transport, WriteMode};

/// Connects to bulbs through the host's Bluetooth adapter
pub struct BleTransport {
    adapter: Adapter,
    scan_duration: Duration,
}

impl BleTransport {
    /// Use the first available adapter.
    pub async fn new(scan_duration: Duration) -> Result<Self, MeshError> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MeshError::Transport("No Bluetooth adapter found".to_string()))?;
        info!(adapter = %adapter.adapter_info().await?, "Using Bluetooth adapter");
        Ok(Self { adapter, scan_duration })
    }

    async fn find(&self, address: &DeviceAddress) -> Result<Peripheral, MeshError> {
        self.adapter.start_scan(ScanFilter::default()).await?;
        tokio::time::sleep(self.scan_duration).await;
        let listed = self.adapter.peripherals().await.map_err(MeshError::from);
        let peripherals = end_scan(listed, async { Ok(self.adapter.stop_scan().await?) }).await?;

        for peripheral in peripherals {
            let found = peripheral.address().to_string();
            debug!(%found, "Scanned peripheral");
            if address_matches(&found, address) {
                return Ok(peripheral);
            }
        }

        Err(MeshError::DeviceNotFound(address.to_string()))
    }
}

/// Stop the scan whether or not listing peripherals succeeded.
async fn end_scan<T>(
    listed: Result<T, MeshError>,
    stop: impl Future<Output = Result<(), MeshError>>,
) -> Result<T, MeshError> {
    let stopped = stop.await;
    let listed = listed?;
    stopped?;
    Ok(listed)
}

/// Full MAC match, or a short address matching the tail of the MAC.
fn address_matches(found: &str, wanted: &DeviceAddress) -> bool {
    let wanted = wanted.to_string();
    found.eq_ignore_ascii_case(&wanted) || found.to_ascii_uppercase().ends_with(&wanted)
}

impl Transport for BleTransport {
    type Link = BleLink;

    async fn connect(&self, address: &DeviceAddress) -> Result<BleLink, MeshError> {
        let peripheral = self.find(address).await?;
        peripheral.connect().await?;
        peripheral.discover_services().await?;
        info!(%address, "Connected, services discovered");
        Ok(BleLink { peripheral })
    }
}

/// A connected bulb
pub struct BleLink {
    peripheral: Peripheral,
}

impl BleLink {
    fn characteristic(&self, service: Uuid, characteristic: Uuid) -> Result<Characteristic, MeshError> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == characteristic && c.service_uuid == service)
            .ok_or(MeshError::CharacteristicNotFound(characteristic))
    }
}

impl Link for BleLink {
    async fn read_characteristic(&mut self, service: Uuid, characteristic: Uuid) -> Result<Bytes, MeshError> {
        let c = self.characteristic(service, characteristic)?;
        let value = self.peripheral.read(&c).await?;
        Ok(Bytes::from(value))
    }

    async fn write_characteristic(
        &mut self,
        service: Uuid,
        characteristic: Uuid,
        value: &[u8],
        mode: WriteMode,
    ) -> Result<(), MeshError> {
        let c = self.characteristic(service, characteristic)?;
        let write_type = match mode {
            WriteMode::WithResponse => WriteType::WithResponse,
            WriteMode::WithoutResponse => WriteType::WithoutResponse,
        };
        self.peripheral.write(&c, value, write_type).await?;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), MeshError> {
        if self.peripheral.is_connected().await? {
            self.peripheral.disconnect().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_scan_stopped_when_listing_fails() {
        let stopped = AtomicBool::new(false);
        let result: Result<Vec<u8>, MeshError> = end_scan(Err(MeshError::Transport("adapter gone".to_string())), async {
            stopped.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(MeshError::Transport(_))));
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_stop_failure_reported() {
        let result = end_scan(Ok(vec![1u8]), async { Err(MeshError::Transport("stop failed".to_string())) }).await;
        assert!(matches!(result, Err(MeshError::Transport(_))));

        assert_eq!(end_scan(Ok(vec![1u8]), async { Ok(()) }).await.unwrap(), vec![1u8]);
    }

    #[test]
    fn test_address_matching() {
        let mac: DeviceAddress = "A4:C1:38:12:34:56".parse().unwrap();
        let short: DeviceAddress = "38:12:34:56".parse().unwrap();
        assert!(address_matches("a4:c1:38:12:34:56", &mac));
        assert!(address_matches("A4:C1:38:12:34:56", &short));
        assert!(!address_matches("A4:C1:38:12:34:57", &mac));
    }
}
