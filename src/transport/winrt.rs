//! Windows Runtime GATT backend
//!
//! Discovers the CRTP service through the device enumeration API, so only
//! Crazyflies already paired in the Windows Bluetooth settings are visible.

use async_trait::async_trait;
use tracing::{debug, warn};
use windows::core::{GUID, HSTRING};
use windows::Devices::Bluetooth::GenericAttributeProfile::{
    GattCharacteristic, GattCommunicationStatus, GattDeviceService, GattWriteOption,
};
use windows::Devices::Enumeration::DeviceInformation;
use windows::Storage::Streams::DataWriter;

use super::link::{GattLink, WriteStatus};
use crate::error::Result;

/// [`GattLink`] implementation backed by `Windows.Devices.Bluetooth`
#[derive(Debug, Default, Clone, Copy)]
pub struct WinRtGattLink;

impl WinRtGattLink {
    pub fn new() -> Self {
        Self
    }
}

fn write_status(status: GattCommunicationStatus) -> WriteStatus {
    if status == GattCommunicationStatus::Success {
        WriteStatus::Success
    } else if status == GattCommunicationStatus::AccessDenied {
        WriteStatus::AccessDenied
    } else if status == GattCommunicationStatus::ProtocolError {
        WriteStatus::ProtocolError
    } else {
        WriteStatus::Unreachable
    }
}

#[async_trait]
impl GattLink for WinRtGattLink {
    type Service = GattDeviceService;
    type Characteristic = GattCharacteristic;

    async fn find_devices(&self, service_uuid: u128) -> Result<Vec<String>> {
        let selector =
            GattDeviceService::GetDeviceSelectorFromUuid(GUID::from_u128(service_uuid))?;
        let infos = DeviceInformation::FindAllAsyncAqsFilter(&selector)?.await?;

        let mut ids = Vec::with_capacity(infos.Size()? as usize);
        for i in 0..infos.Size()? {
            ids.push(infos.GetAt(i)?.Id()?.to_string());
        }
        Ok(ids)
    }

    async fn open_service(&self, device_id: &str) -> Result<Option<GattDeviceService>> {
        match GattDeviceService::FromIdAsync(&HSTRING::from(device_id))?.await {
            Ok(service) => Ok(Some(service)),
            Err(e) => {
                // A device that is paired but out of range yields no service
                warn!("GattDeviceService::FromIdAsync({}) failed: {}", device_id, e.message());
                Ok(None)
            }
        }
    }

    async fn characteristics(
        &self,
        service: &GattDeviceService,
        uuid: u128,
    ) -> Result<Vec<GattCharacteristic>> {
        let result = service
            .GetCharacteristicsForUuidAsync(GUID::from_u128(uuid))?
            .await?;

        let status = result.Status()?;
        if status != GattCommunicationStatus::Success {
            debug!("Characteristic lookup returned {:?}", status);
            return Ok(Vec::new());
        }

        let chars = result.Characteristics()?;
        let mut found = Vec::with_capacity(chars.Size()? as usize);
        for i in 0..chars.Size()? {
            found.push(chars.GetAt(i)?);
        }
        Ok(found)
    }

    async fn write_with_response(
        &self,
        characteristic: &GattCharacteristic,
        payload: &[u8],
    ) -> Result<WriteStatus> {
        let buffer = {
            let writer = DataWriter::new()?;
            writer.WriteBytes(payload)?;
            writer.DetachBuffer()?
        };

        let status = characteristic
            .WriteValueWithOptionAsync(&buffer, GattWriteOption::WriteWithResponse)?
            .await?;

        Ok(write_status(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_status_mapping() {
        let cases = [
            (GattCommunicationStatus::Success, WriteStatus::Success),
            (GattCommunicationStatus::Unreachable, WriteStatus::Unreachable),
            (GattCommunicationStatus::AccessDenied, WriteStatus::AccessDenied),
            (GattCommunicationStatus::ProtocolError, WriteStatus::ProtocolError),
        ];
        for (status, expected) in cases {
            assert_eq!(write_status(status), expected);
        }
    }

    // Integration test - only runs with a paired Crazyflie
    #[tokio::test]
    #[ignore]
    async fn test_find_devices_with_real_hardware() {
        let link = WinRtGattLink::new();
        let devices = link
            .find_devices(crate::crtp::protocol::CRTP_SERVICE_UUID)
            .await
            .unwrap();
        println!("Found {} paired Crazyflie(s)", devices.len());
    }
}
