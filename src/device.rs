//! One-shot operations on remote BlueZ devices.
//!
//! Pairing, connecting and disconnecting are plain request/response calls against the
//! daemon. Each call takes an explicit timeout, since BlueZ may otherwise wait on an
//! unresponsive device for a long time.

use std::{collections::HashMap, future::Future, pin::pin, time::Duration};

use async_io::Timer;
use futures_util::future::{select, Either};
use zbus::zvariant::{OwnedValue, Value};

use crate::{address::Address, Adapter, Error, ErrorKind, Result, Session};

pub(crate) const DEVICE_INTERFACE: &str = "org.bluez.Device1";

mod private {
    use zbus::dbus_proxy;

    #[dbus_proxy(
        interface = "org.bluez.Device1",
        default_service = "org.bluez",
        assume_defaults = false
    )]
    trait Device {
        async fn pair(&self) -> zbus::Result<()>;
        async fn connect(&self) -> zbus::Result<()>;
        async fn disconnect(&self) -> zbus::Result<()>;

        #[dbus_proxy(property)]
        fn paired(&self) -> zbus::Result<bool>;

        #[dbus_proxy(property)]
        fn connected(&self) -> zbus::Result<bool>;
    }
}

use private::DeviceProxy;

/// A reference to a remote BlueZ device, addressed by its hardware [`Address`].
pub struct Device {
    proxy: DeviceProxy<'static>,
    address: Address,
}

impl Device {
    /// Opens the BlueZ object for the device with the given [`Address`] on `adapter`.
    ///
    /// This performs no bus traffic; whether the device actually exists is only
    /// determined by the first call on it.
    pub async fn open(session: &Session, adapter: &Adapter, address: Address) -> Result<Self> {
        let path = address.object_path(adapter.path().as_str());
        let proxy = DeviceProxy::new(&session.conn, path)
            .await
            .map_err(|e| Error::new(ErrorKind::DeviceNotFound, e))?;

        Ok(Self { proxy, address })
    }

    /// Returns the hardware [`Address`] of the device.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Pairs with the device.
    ///
    /// Does nothing if the device is already paired. Fails with
    /// [`ErrorKind::PairingTimeout`] if the device does not respond within `timeout`.
    pub async fn pair(&self, timeout: Duration) -> Result<()> {
        if self.is_paired().await? {
            log::debug!("{} is already paired", self.address);
            return Ok(());
        }

        match deadline(self.proxy.pair(), timeout).await {
            Some(Ok(())) => Ok(()),
            Some(Err(e)) => Err(Error::new(ErrorKind::PairingFailed, e)),
            None => Err(Error::new(
                ErrorKind::PairingTimeout,
                format!("{} did not respond to the pairing request", self.address),
            )),
        }
    }

    /// Establishes a connection to the device.
    ///
    /// Does nothing if the adapter is already connected to the device. Fails with
    /// [`ErrorKind::ConnectionTimeout`] if no connection came up within `timeout`.
    pub async fn connect(&self, timeout: Duration) -> Result<()> {
        if self.is_connected().await? {
            log::debug!("{} is already connected", self.address);
            return Ok(());
        }

        match deadline(self.proxy.connect(), timeout).await {
            Some(Ok(())) => Ok(()),
            Some(Err(e)) => {
                // Connecting is racy, so check whether the link came up regardless.
                if let Ok(true) = self.is_connected().await {
                    return Ok(());
                }
                Err(Error::new(ErrorKind::ConnectionFailed, e))
            }
            None => Err(Error::new(
                ErrorKind::ConnectionTimeout,
                format!("{} did not accept a connection", self.address),
            )),
        }
    }

    /// Severs the connection to the device.
    ///
    /// Does nothing if the adapter is already disconnected from the device.
    pub async fn disconnect(&self, timeout: Duration) -> Result<()> {
        if !self.is_connected().await? {
            log::debug!("{} is already disconnected", self.address);
            return Ok(());
        }

        match deadline(self.proxy.disconnect(), timeout).await {
            Some(Ok(())) => Ok(()),
            Some(Err(e)) => Err(Error::new(ErrorKind::DisconnectFailed, e)),
            None => Err(Error::new(
                ErrorKind::DisconnectFailed,
                format!("disconnecting from {} timed out", self.address),
            )),
        }
    }

    /// Returns whether the device is paired with the adapter.
    pub async fn is_paired(&self) -> Result<bool> {
        self.proxy.paired().await.map_err(device_error)
    }

    /// Returns whether the adapter is currently connected to this device.
    pub async fn is_connected(&self) -> Result<bool> {
        self.proxy.connected().await.map_err(device_error)
    }
}

fn device_error(e: zbus::Error) -> Error {
    // An unknown object path means BlueZ does not know the device; everything else is
    // an adapter- or daemon-level failure.
    let unknown_object = match &e {
        zbus::Error::FDO(fdo) => matches!(**fdo, zbus::fdo::Error::UnknownObject(_)),
        zbus::Error::MethodError(name, ..) => {
            name.as_str() == "org.freedesktop.DBus.Error.UnknownObject"
        }
        _ => false,
    };

    if unknown_object {
        Error::new(ErrorKind::DeviceNotFound, e)
    } else {
        Error::new(ErrorKind::ServiceUnavailable, e)
    }
}

/// Runs `fut` to completion, or returns `None` once `timeout` has elapsed.
async fn deadline<T>(fut: impl Future<Output = T>, timeout: Duration) -> Option<T> {
    let fut = pin!(fut);
    match select(fut, Timer::after(timeout)).await {
        Either::Left((value, _)) => Some(value),
        Either::Right(_) => None,
    }
}

/// Summary of a device paired with an [`Adapter`], as reported by BlueZ.
#[derive(Debug, Clone)]
pub struct PairedDevice {
    /// The hardware address of the device.
    pub address: Address,
    /// The user-friendly device name, if BlueZ knows one.
    pub name: Option<String>,
    /// The Bluetooth class of device, if reported.
    pub class: Option<u32>,
    /// The signal strength of the device in dBm, if it was recently seen.
    pub rssi: Option<i16>,
    /// Whether the adapter is currently connected to the device.
    pub connected: bool,
}

/// Decodes a device property map from the managed-objects enumeration.
///
/// Returns `None` for devices that are not paired or carry no parseable address.
pub(crate) fn decode_paired_device(
    properties: &HashMap<String, OwnedValue>,
) -> Option<PairedDevice> {
    if !bool_property(properties, "Paired").unwrap_or(false) {
        return None;
    }

    let address = str_property(properties, "Address")?.parse().ok()?;

    Some(PairedDevice {
        address,
        name: str_property(properties, "Name").map(str::to_owned),
        class: match properties.get("Class").map(|v| &**v) {
            Some(Value::U32(class)) => Some(*class),
            _ => None,
        },
        rssi: match properties.get("RSSI").map(|v| &**v) {
            Some(Value::I16(rssi)) => Some(*rssi),
            _ => None,
        },
        connected: bool_property(properties, "Connected").unwrap_or(false),
    })
}

fn bool_property(properties: &HashMap<String, OwnedValue>, name: &str) -> Option<bool> {
    match properties.get(name).map(|v| &**v) {
        Some(Value::Bool(b)) => Some(*b),
        _ => None,
    }
}

fn str_property<'a>(properties: &'a HashMap<String, OwnedValue>, name: &str) -> Option<&'a str> {
    match properties.get(name).map(|v| &**v) {
        Some(Value::Str(s)) => Some(s.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(entries: &[(&str, Value<'static>)]) -> HashMap<String, OwnedValue> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), OwnedValue::from(value.clone())))
            .collect()
    }

    #[test]
    fn decode_full_entry() {
        let props = properties(&[
            ("Paired", Value::Bool(true)),
            ("Address", Value::from("AA:BB:CC:11:22:33")),
            ("Name", Value::from("Keyboard")),
            ("Class", Value::U32(0x1f00)),
            ("RSSI", Value::I16(-61)),
            ("Connected", Value::Bool(true)),
        ]);

        let device = decode_paired_device(&props).unwrap();
        assert_eq!(device.address.to_string(), "AA:BB:CC:11:22:33");
        assert_eq!(device.name.as_deref(), Some("Keyboard"));
        assert_eq!(device.class, Some(0x1f00));
        assert_eq!(device.rssi, Some(-61));
        assert!(device.connected);
    }

    #[test]
    fn decode_minimal_entry() {
        let props = properties(&[
            ("Paired", Value::Bool(true)),
            ("Address", Value::from("AA:BB:CC:11:22:33")),
        ]);

        let device = decode_paired_device(&props).unwrap();
        assert_eq!(device.name, None);
        assert_eq!(device.class, None);
        assert_eq!(device.rssi, None);
        assert!(!device.connected);
    }

    #[test]
    fn unpaired_devices_are_skipped() {
        let props = properties(&[
            ("Paired", Value::Bool(false)),
            ("Address", Value::from("AA:BB:CC:11:22:33")),
        ]);
        assert!(decode_paired_device(&props).is_none());

        // No `Paired` property at all is treated like unpaired.
        let props = properties(&[("Address", Value::from("AA:BB:CC:11:22:33"))]);
        assert!(decode_paired_device(&props).is_none());
    }

    #[test]
    fn missing_or_malformed_address_is_skipped() {
        let props = properties(&[("Paired", Value::Bool(true))]);
        assert!(decode_paired_device(&props).is_none());

        let props = properties(&[
            ("Paired", Value::Bool(true)),
            ("Address", Value::from("not-an-address")),
        ]);
        assert!(decode_paired_device(&props).is_none());
    }
}
