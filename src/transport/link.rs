//! Trait abstraction for Bluetooth LE GATT operations to enable testing

use async_trait::async_trait;

use crate::error::Result;

/// Outcome of a write-with-response on a GATT characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// Peripheral acknowledged the write
    Success,
    /// Peripheral could not be reached
    Unreachable,
    /// Peripheral answered with an ATT protocol error
    ProtocolError,
    /// Access to the characteristic was denied
    AccessDenied,
}

/// GATT client operations used by the CRTP transport
///
/// `Service` and `Characteristic` are the backend's handle types. They are
/// only ever created by the backend and held by the transport endpoint.
#[async_trait]
pub trait GattLink: Send + Sync + 'static {
    /// Handle to an opened GATT service
    type Service: Send + Sync + 'static;

    /// Handle to a GATT characteristic
    type Characteristic: Send + Sync + 'static;

    /// Enumerate devices exposing the given service, returning their ids
    async fn find_devices(&self, service_uuid: u128) -> Result<Vec<String>>;

    /// Open the service instance behind a device id returned by `find_devices`
    async fn open_service(&self, device_id: &str) -> Result<Option<Self::Service>>;

    /// Look up characteristics of a service by UUID
    async fn characteristics(
        &self,
        service: &Self::Service,
        uuid: u128,
    ) -> Result<Vec<Self::Characteristic>>;

    /// Write a value and wait for the peripheral's acknowledgment
    async fn write_with_response(
        &self,
        characteristic: &Self::Characteristic,
        payload: &[u8],
    ) -> Result<WriteStatus>;
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::crtp::protocol::CRTP_SERVICE_UUID;
    use crate::error::CommanderError;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Service handle handed out by [`MockGattLink`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MockService {
        pub device_id: String,
    }

    /// Characteristic handle handed out by [`MockGattLink`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MockCharacteristic {
        pub uuid: u128,
    }

    /// Mock GATT link for testing
    ///
    /// Starts with no devices. Writes succeed unless a status was queued with
    /// [`MockGattLink::push_write_status`].
    #[derive(Clone)]
    pub struct MockGattLink {
        pub devices: Arc<Mutex<Vec<String>>>,
        pub service_available: Arc<Mutex<bool>>,
        pub missing_characteristics: Arc<Mutex<Vec<u128>>>,
        pub enumeration_error: Arc<Mutex<bool>>,
        pub write_statuses: Arc<Mutex<VecDeque<Result<WriteStatus>>>>,
        pub written_data: Arc<Mutex<Vec<(u128, Vec<u8>)>>>,
        pub enumerations: Arc<Mutex<usize>>,
        pub write_gate: Arc<Mutex<Option<Arc<tokio::sync::Notify>>>>,
    }

    impl MockGattLink {
        pub fn new() -> Self {
            Self {
                devices: Arc::new(Mutex::new(Vec::new())),
                service_available: Arc::new(Mutex::new(true)),
                missing_characteristics: Arc::new(Mutex::new(Vec::new())),
                enumeration_error: Arc::new(Mutex::new(false)),
                write_statuses: Arc::new(Mutex::new(VecDeque::new())),
                written_data: Arc::new(Mutex::new(Vec::new())),
                enumerations: Arc::new(Mutex::new(0)),
                write_gate: Arc::new(Mutex::new(None)),
            }
        }

        /// A link with one paired Crazyflie exposing every CRTP characteristic
        pub fn with_crazyflie() -> Self {
            let link = Self::new();
            link.add_device("BTHLEDevice#crazyflie");
            link
        }

        pub fn add_device(&self, id: &str) {
            self.devices.lock().unwrap().push(id.to_string());
        }

        pub fn remove_characteristic(&self, uuid: u128) {
            self.missing_characteristics.lock().unwrap().push(uuid);
        }

        pub fn set_service_available(&self, available: bool) {
            *self.service_available.lock().unwrap() = available;
        }

        pub fn set_enumeration_error(&self, fail: bool) {
            *self.enumeration_error.lock().unwrap() = fail;
        }

        pub fn push_write_status(&self, status: WriteStatus) {
            self.write_statuses.lock().unwrap().push_back(Ok(status));
        }

        pub fn push_write_error(&self, message: &str) {
            self.write_statuses
                .lock()
                .unwrap()
                .push_back(Err(CommanderError::Ble(message.to_string())));
        }

        /// Hold every write, after it is recorded, until the gate is notified
        pub fn set_write_gate(&self, gate: Arc<tokio::sync::Notify>) {
            *self.write_gate.lock().unwrap() = Some(gate);
        }

        pub fn get_written_data(&self) -> Vec<(u128, Vec<u8>)> {
            self.written_data.lock().unwrap().clone()
        }

        pub fn write_count(&self) -> usize {
            self.written_data.lock().unwrap().len()
        }

        pub fn enumeration_count(&self) -> usize {
            *self.enumerations.lock().unwrap()
        }
    }

    #[async_trait]
    impl GattLink for MockGattLink {
        type Service = MockService;
        type Characteristic = MockCharacteristic;

        async fn find_devices(&self, service_uuid: u128) -> Result<Vec<String>> {
            *self.enumerations.lock().unwrap() += 1;
            if *self.enumeration_error.lock().unwrap() {
                return Err(CommanderError::Ble("Mock enumeration error".to_string()));
            }
            if service_uuid != CRTP_SERVICE_UUID {
                return Ok(Vec::new());
            }
            Ok(self.devices.lock().unwrap().clone())
        }

        async fn open_service(&self, device_id: &str) -> Result<Option<MockService>> {
            if !*self.service_available.lock().unwrap() {
                return Ok(None);
            }
            Ok(Some(MockService {
                device_id: device_id.to_string(),
            }))
        }

        async fn characteristics(
            &self,
            _service: &MockService,
            uuid: u128,
        ) -> Result<Vec<MockCharacteristic>> {
            if self.missing_characteristics.lock().unwrap().contains(&uuid) {
                return Ok(Vec::new());
            }
            Ok(vec![MockCharacteristic { uuid }])
        }

        async fn write_with_response(
            &self,
            characteristic: &MockCharacteristic,
            payload: &[u8],
        ) -> Result<WriteStatus> {
            // A real write always suspends on the acknowledgment
            tokio::task::yield_now().await;

            self.written_data
                .lock()
                .unwrap()
                .push((characteristic.uuid, payload.to_vec()));

            let gate = self.write_gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }

            self.write_statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(WriteStatus::Success))
        }
    }
}
