use zbus::{
    fdo::{ManagedObjects, PropertiesProxy},
    names::InterfaceName,
    zvariant::{ObjectPath, Value},
};

use crate::{
    device::{self, PairedDevice},
    Error, ErrorKind, Result, Session,
};

const ADAPTER_INTERFACE: &str = "org.bluez.Adapter1";

fn adapter_interface() -> Result<InterfaceName<'static>> {
    InterfaceName::try_from(ADAPTER_INTERFACE).map_err(|e| Error::new(ErrorKind::Unknown, e))
}

/// Returns the path of the first object in `objects` that exposes the adapter interface.
///
/// The daemon does not specify an enumeration order, so with more than one adapter
/// present the result is arbitrary.
fn find_adapter(objects: &ManagedObjects) -> Option<&zbus::zvariant::OwnedObjectPath> {
    for (path, interfaces) in objects {
        if interfaces.contains_key(ADAPTER_INTERFACE) {
            return Some(path);
        }
    }

    None
}

/// A BlueZ Bluetooth adapter.
pub struct Adapter {
    session: Session,
    path: ObjectPath<'static>,
    properties: PropertiesProxy<'static>,
}

impl Adapter {
    /// Locates the system's Bluetooth adapter.
    ///
    /// Enumerates all objects managed by BlueZ and picks the first one exposing the
    /// adapter interface. When several adapters are present, which one is picked is
    /// unspecified.
    pub async fn locate(session: &Session) -> Result<Self> {
        log::debug!(
            "locating Bluetooth adapter on connection {}",
            session.conn.server_guid()
        );

        let manager = session.object_manager().await?;
        let objects = manager
            .get_managed_objects()
            .await
            .map_err(|e| Error::new(ErrorKind::ServiceUnavailable, e))?;

        let Some(path) = find_adapter(&objects) else {
            return Err(Error::new(
                ErrorKind::AdapterNotFound,
                "no Bluetooth adapter found",
            ));
        };
        log::debug!("using Bluetooth adapter at {}", path);
        let path = (**path).to_owned();

        let properties = PropertiesProxy::builder(&session.conn)
            .destination("org.bluez")
            .map_err(|e| Error::new(ErrorKind::ServiceUnavailable, e))?
            .path(path.clone())
            .map_err(|e| Error::new(ErrorKind::ServiceUnavailable, e))?
            .build()
            .await
            .map_err(|e| Error::new(ErrorKind::ServiceUnavailable, e))?;

        Ok(Self {
            session: session.clone(),
            path,
            properties,
        })
    }

    /// Returns the D-Bus object path of this adapter.
    pub fn path(&self) -> &ObjectPath<'static> {
        &self.path
    }

    /// Powers the adapter on or off.
    pub async fn ensure_powered(&self, powered: bool) -> Result<()> {
        self.ensure_bool("Powered", powered).await
    }

    /// Makes the adapter visible (or invisible) to scanning devices.
    pub async fn ensure_discoverable(&self, discoverable: bool) -> Result<()> {
        self.ensure_bool("Discoverable", discoverable).await
    }

    /// Allows or disallows incoming pairing requests.
    pub async fn ensure_pairable(&self, pairable: bool) -> Result<()> {
        self.ensure_bool("Pairable", pairable).await
    }

    /// Ensures a boolean adapter property holds `desired`.
    ///
    /// The property is only written when its current value differs, so a redundant call
    /// never resets adapter state.
    async fn ensure_bool(&self, property: &str, desired: bool) -> Result<()> {
        let interface = adapter_interface()?;
        let current = self
            .properties
            .get(interface.clone(), property)
            .await
            .map_err(|e| Error::new(ErrorKind::ServiceUnavailable, e))?;

        if matches!(&*current, Value::Bool(b) if *b == desired) {
            log::debug!("adapter property {} is already {}", property, desired);
            return Ok(());
        }

        log::debug!("setting adapter property {} to {}", property, desired);
        self.properties
            .set(interface, property, &Value::Bool(desired))
            .await
            .map_err(|e| Error::new(ErrorKind::ServiceUnavailable, e))
    }

    /// Returns all devices paired with this adapter.
    pub async fn paired_devices(&self) -> Result<Vec<PairedDevice>> {
        let manager = self.session.object_manager().await?;
        let objects = manager
            .get_managed_objects()
            .await
            .map_err(|e| Error::new(ErrorKind::ServiceUnavailable, e))?;

        let mut devices = Vec::new();
        for (path, interfaces) in &objects {
            if !path.starts_with(self.path.as_str()) {
                continue;
            }

            let Some(properties) = interfaces.get(device::DEVICE_INTERFACE) else { continue };
            match device::decode_paired_device(properties) {
                Some(dev) => devices.push(dev),
                None => log::trace!("skipping device at {}", path),
            }
        }

        Ok(devices)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use zbus::{
        names::OwnedInterfaceName,
        zvariant::{OwnedObjectPath, OwnedValue},
    };

    use super::*;

    fn entry(
        path: &str,
        interfaces: &[&str],
    ) -> (
        OwnedObjectPath,
        HashMap<OwnedInterfaceName, HashMap<String, OwnedValue>>,
    ) {
        let path = OwnedObjectPath::from(ObjectPath::try_from(path.to_string()).unwrap());
        let interfaces = interfaces
            .iter()
            .map(|name| {
                let name = InterfaceName::try_from(name.to_string()).unwrap();
                (OwnedInterfaceName::from(name), HashMap::new())
            })
            .collect();
        (path, interfaces)
    }

    #[test]
    fn finds_adapter_among_other_objects() {
        let objects: ManagedObjects = [
            entry("/org/bluez", &["org.bluez.AgentManager1"]),
            entry(
                "/org/bluez/hci0",
                &["org.freedesktop.DBus.Properties", "org.bluez.Adapter1"],
            ),
            entry("/org/bluez/hci0/dev_AA_BB_CC_11_22_33", &["org.bluez.Device1"]),
        ]
        .into_iter()
        .collect();

        let path = find_adapter(&objects).unwrap();
        assert_eq!(path.as_str(), "/org/bluez/hci0");
    }

    #[test]
    fn no_adapter() {
        let objects: ManagedObjects = [
            entry("/org/bluez", &["org.bluez.AgentManager1"]),
            entry("/org/bluez/hci0/dev_AA_BB_CC_11_22_33", &["org.bluez.Device1"]),
        ]
        .into_iter()
        .collect();

        assert!(find_adapter(&objects).is_none());
    }

    #[test]
    fn empty_enumeration() {
        assert!(find_adapter(&ManagedObjects::new()).is_none());
    }
}
