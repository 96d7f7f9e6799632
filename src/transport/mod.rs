//! # CRTP Transport Module
//!
//! Carries CRTP packets to the Crazyflie over its Bluetooth LE GATT service.
//!
//! This module handles:
//! - Discovering paired devices that expose the CRTP service
//! - Binding the service and its basic, up and down characteristics
//! - Writing packets with acknowledgment to the basic characteristic
//!
//! Link failures are reported as `false`: the caller's only recovery is to
//! stop sending, and the firmware's commander timeout takes care of the
//! vehicle. Misuse (sending while unbound, oversized payloads) is reported
//! as a distinct error.

pub mod link;
#[cfg(windows)]
pub mod winrt;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::crtp::protocol::{
    format_uuid, CRTP_BASIC_MAX_PAYLOAD, CRTP_CHAR_UUID, CRTP_DOWN_CHAR_UUID, CRTP_SERVICE_UUID,
    CRTP_UP_CHAR_UUID,
};
use crate::error::{CommanderError, Result};
use link::{GattLink, WriteStatus};

/// Transport lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Nothing bound
    Unbound,
    /// A device exposing the CRTP service was found, binding in progress
    Probed,
    /// Service and all three characteristics are bound
    Connected,
}

/// Bound CRTP service and characteristics
///
/// Only constructed once every handle has been resolved, so an endpoint that
/// exists is always complete.
pub struct TransportEndpoint<S, C> {
    service: S,
    basic: C,
    up: C,
    down: C,
}

impl<S, C> TransportEndpoint<S, C> {
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Characteristic for payloads of at most 20 bytes
    pub fn basic(&self) -> &C {
        &self.basic
    }

    /// Outbound characteristic for payloads over 20 bytes
    pub fn up(&self) -> &C {
        &self.up
    }

    /// Inbound characteristic for payloads over 20 bytes
    pub fn down(&self) -> &C {
        &self.down
    }
}

/// Check whether any device exposing the CRTP service is paired
///
/// A `true` result does not mean the device is in range or connectable.
/// Enumeration errors are logged and reported as `false`.
pub async fn probe_link<L: GattLink>(link: &L) -> bool {
    match link.find_devices(CRTP_SERVICE_UUID).await {
        Ok(devices) => {
            debug!("Found {} device(s) exposing the CRTP service", devices.len());
            !devices.is_empty()
        }
        Err(e) => {
            warn!("Bluetooth LE enumeration failed: {}", e);
            false
        }
    }
}

/// CRTP transport over Bluetooth LE
///
/// Owns the [`TransportEndpoint`] exclusively. Sends are serialized by
/// `&mut`/ownership: whoever owns the transport is the only writer.
pub struct CrtpTransport<L: GattLink> {
    link: Arc<L>,
    state: TransportState,
    endpoint: Option<TransportEndpoint<L::Service, L::Characteristic>>,
}

impl<L: GattLink> fmt::Debug for CrtpTransport<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrtpTransport")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<L: GattLink> CrtpTransport<L> {
    /// Create an unbound transport on top of a GATT link
    pub fn new(link: Arc<L>) -> Self {
        Self {
            link,
            state: TransportState::Unbound,
            endpoint: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Bound endpoint, present only while connected
    pub fn endpoint(&self) -> Option<&TransportEndpoint<L::Service, L::Characteristic>> {
        self.endpoint.as_ref()
    }

    /// Check whether a Crazyflie is paired
    ///
    /// Does not bind anything and leaves the transport state untouched, so it
    /// is safe to call repeatedly.
    pub async fn probe(&self) -> bool {
        probe_link(self.link.as_ref()).await
    }

    /// Bind the CRTP service and its characteristics
    ///
    /// Uses the first matching service instance and the first match for each
    /// characteristic. Returns `true` only if the service and all three
    /// characteristics were found; otherwise everything resolved so far is
    /// dropped and the transport stays unbound.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # #[cfg(windows)]
    /// # async fn run() -> anyhow::Result<()> {
    /// use std::sync::Arc;
    /// use crtp_commander::transport::CrtpTransport;
    /// use crtp_commander::transport::winrt::WinRtGattLink;
    ///
    /// let mut transport = CrtpTransport::new(Arc::new(WinRtGattLink::new()));
    /// if !transport.connect().await {
    ///     println!("Pair the Crazyflie in the Bluetooth settings first");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(&mut self) -> bool {
        self.disconnect();

        let devices = match self.link.find_devices(CRTP_SERVICE_UUID).await {
            Ok(devices) => devices,
            Err(e) => {
                warn!("Bluetooth LE enumeration failed: {}", e);
                return false;
            }
        };

        let Some(device_id) = devices.first() else {
            info!(
                "No paired device exposes CRTP service {}",
                format_uuid(CRTP_SERVICE_UUID)
            );
            return false;
        };

        self.state = TransportState::Probed;
        debug!("Binding CRTP service on {}", device_id);

        match self.bind(device_id).await {
            Ok(Some(endpoint)) => {
                info!("CRTP service bound on {}", device_id);
                self.endpoint = Some(endpoint);
                self.state = TransportState::Connected;
                true
            }
            Ok(None) => {
                self.state = TransportState::Unbound;
                false
            }
            Err(e) => {
                warn!("Failed to bind CRTP service on {}: {}", device_id, e);
                self.state = TransportState::Unbound;
                false
            }
        }
    }

    /// Resolve the service and characteristics, `None` if any is missing
    async fn bind(
        &self,
        device_id: &str,
    ) -> Result<Option<TransportEndpoint<L::Service, L::Characteristic>>> {
        let Some(service) = self.link.open_service(device_id).await? else {
            warn!("CRTP service on {} could not be opened", device_id);
            return Ok(None);
        };

        let basic = self.first_characteristic(&service, CRTP_CHAR_UUID).await?;
        let up = self.first_characteristic(&service, CRTP_UP_CHAR_UUID).await?;
        let down = self.first_characteristic(&service, CRTP_DOWN_CHAR_UUID).await?;

        match (basic, up, down) {
            (Some(basic), Some(up), Some(down)) => Ok(Some(TransportEndpoint {
                service,
                basic,
                up,
                down,
            })),
            _ => Ok(None),
        }
    }

    async fn first_characteristic(
        &self,
        service: &L::Service,
        uuid: u128,
    ) -> Result<Option<L::Characteristic>> {
        let found = self.link.characteristics(service, uuid).await?.into_iter().next();
        if found.is_none() {
            warn!("CRTP characteristic {} not found", format_uuid(uuid));
        }
        Ok(found)
    }

    /// Send a CRTP packet through the basic characteristic
    ///
    /// # Arguments
    ///
    /// * `payload` - Complete CRTP packet (header + data, at most 20 bytes)
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The peripheral acknowledged the write
    /// * `Ok(false)` - Any other outcome, including an unreachable link
    ///
    /// # Errors
    ///
    /// - `NotConnected`: the transport is not bound; nothing is written
    /// - `PayloadTooLarge`: payload exceeds the basic characteristic limit
    pub async fn send(&self, payload: &[u8]) -> Result<bool> {
        let endpoint = self.endpoint.as_ref().ok_or(CommanderError::NotConnected)?;

        if payload.len() > CRTP_BASIC_MAX_PAYLOAD {
            return Err(CommanderError::PayloadTooLarge {
                len: payload.len(),
                max: CRTP_BASIC_MAX_PAYLOAD,
            });
        }

        match self.link.write_with_response(&endpoint.basic, payload).await {
            Ok(WriteStatus::Success) => Ok(true),
            Ok(status) => {
                debug!("CRTP write not acknowledged: {:?}", status);
                Ok(false)
            }
            Err(e) => {
                debug!("CRTP write failed: {}", e);
                Ok(false)
            }
        }
    }

    /// Release all bound handles
    pub fn disconnect(&mut self) {
        if self.endpoint.take().is_some() {
            debug!("CRTP endpoint released");
        }
        self.state = TransportState::Unbound;
    }
}
