//! BLE advertisement registration.
//!
//! BlueZ implements the peripheral role by letting a client export an advertisement
//! object on the bus and register its path with the LE advertising manager. The daemon
//! then calls back into the exported object: it reads the advertisement's properties
//! when the registration is processed, and invokes `Release` on it when it withdraws
//! the advertisement on its own.

use std::collections::HashMap;

use zbus::{dbus_interface, zvariant::ObjectPath};

use crate::{uuid::Uuid, Adapter, Error, ErrorKind, Result, Session};

/// The fixed object path the advertisement object is exported under.
const ADVERTISEMENT_PATH: &str = "/org/herald/advertisement0";

fn advertisement_path() -> Result<ObjectPath<'static>> {
    ObjectPath::try_from(ADVERTISEMENT_PATH).map_err(|e| Error::new(ErrorKind::Unknown, e))
}

mod private {
    use std::collections::HashMap;

    use zbus::{
        dbus_proxy,
        zvariant::{ObjectPath, Value},
    };

    #[dbus_proxy(
        interface = "org.bluez.LEAdvertisingManager1",
        default_service = "org.bluez",
        assume_defaults = false
    )]
    trait LeAdvertisingManager {
        async fn register_advertisement(
            &self,
            advertisement: &ObjectPath<'_>,
            options: HashMap<&str, Value<'_>>,
        ) -> zbus::Result<()>;

        async fn unregister_advertisement(
            &self,
            advertisement: &ObjectPath<'_>,
        ) -> zbus::Result<()>;
    }
}

use private::LeAdvertisingManagerProxy;

/// Describes the broadcast sent out while the peripheral role is active.
///
/// The descriptor is fixed for the lifetime of one activation; to change it, stop the
/// running advertisement and start a new one.
#[derive(Debug, Clone)]
pub struct Advertisement {
    /// The device name shown to scanning devices.
    pub local_name: String,
    /// The service UUID carried in the broadcast.
    pub service_uuid: Uuid,
}

/// The advertisement object BlueZ reads back over the bus.
struct AdvertisementObject {
    local_name: String,
    service_uuid: Uuid,
}

#[dbus_interface(name = "org.bluez.LEAdvertisement1")]
impl AdvertisementObject {
    /// Called by BlueZ when it withdraws the advertisement on its own, eg. because the
    /// adapter was powered off externally.
    ///
    /// The handler only acknowledges. It runs on the dispatch loop of the connection
    /// that hosts this object, so it must not block and must not tear down the
    /// [`Advertiser`] itself; a later [`Advertiser::stop`] treats the then-redundant
    /// remote unregister as advisory.
    fn release(&self) {
        log::info!("advertisement released by BlueZ");
    }

    #[dbus_interface(property, name = "Type")]
    fn kind(&self) -> &str {
        "peripheral"
    }

    #[dbus_interface(property, name = "ServiceUUIDs")]
    fn service_uuids(&self) -> Vec<String> {
        vec![self.service_uuid.to_string()]
    }

    #[dbus_interface(property)]
    fn local_name(&self) -> &str {
        &self.local_name
    }
}

/// Makes the host discoverable and connectable as a BLE peripheral.
///
/// At most one advertisement is active per [`Advertiser`]. All bus resources created by
/// a [`start`][Advertiser::start] call are owned by the advertiser and released
/// together by [`stop`][Advertiser::stop]; when a start attempt fails partway, the
/// resources it created are rolled back before the error is returned.
pub struct Advertiser {
    session: Session,
    active: Option<Active>,
}

/// Bus handles owned by an active advertisement, released as a unit on teardown.
struct Active {
    adapter: Adapter,
    manager: LeAdvertisingManagerProxy<'static>,
}

impl Advertiser {
    /// Creates an advertiser on the given session.
    ///
    /// No bus traffic happens until [`Advertiser::start`] is called.
    pub fn new(session: &Session) -> Self {
        Self {
            session: session.clone(),
            active: None,
        }
    }

    /// Returns whether an advertisement is currently registered.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Starts advertising, making the host visible to scanning devices.
    ///
    /// Locates the adapter, ensures it is powered, discoverable and pairable (in that
    /// order, writing only the properties that differ), exports the advertisement
    /// object and registers its path with BlueZ. If any step fails, everything created
    /// by this attempt is released before the error is returned: a failed start leaves
    /// no exported object and no half-registered advertisement behind.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::AlreadyActive`] if an advertisement is already
    /// registered; the running advertisement is unaffected.
    pub async fn start(&mut self, advertisement: Advertisement) -> Result<()> {
        if self.active.is_some() {
            return Err(Error::new(
                ErrorKind::AlreadyActive,
                "advertisement already active",
            ));
        }

        let adapter = Adapter::locate(&self.session).await?;

        log::debug!("configuring adapter {}", adapter.path());
        adapter.ensure_powered(true).await?;
        adapter.ensure_discoverable(true).await?;
        adapter.ensure_pairable(true).await?;

        let manager = LeAdvertisingManagerProxy::new(&self.session.conn, adapter.path().clone())
            .await
            .map_err(|e| Error::new(ErrorKind::ServiceUnavailable, e))?;

        let path = advertisement_path()?;

        log::debug!("exporting advertisement object at {}", path);
        let object = AdvertisementObject {
            local_name: advertisement.local_name,
            service_uuid: advertisement.service_uuid,
        };
        let exported = self
            .session
            .conn
            .object_server()
            .at(ADVERTISEMENT_PATH, object)
            .await
            .map_err(|e| Error::new(ErrorKind::RegistrationFailed, e))?;
        if !exported {
            return Err(Error::new(
                ErrorKind::RegistrationFailed,
                format!("an advertisement object is already exported at {}", path),
            ));
        }

        log::debug!("registering advertisement with BlueZ");
        if let Err(e) = manager.register_advertisement(&path, HashMap::new()).await {
            // The daemon rejected the advertisement; take the object down again so the
            // failed start leaves nothing exported on the bus.
            unexport(&self.session).await;
            return Err(Error::new(ErrorKind::ServiceUnavailable, e));
        }

        log::info!("advertisement registered at {}", path);
        self.active = Some(Active { adapter, manager });
        Ok(())
    }

    /// Stops the running advertisement and releases every resource held by it.
    ///
    /// Returns success without issuing any calls if no advertisement is active. A
    /// failure of the remote unregister call is logged but does not block teardown:
    /// the advertisement object is unexported and all bus handles are dropped
    /// unconditionally.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(active) = self.active.take() else {
            log::debug!("stop requested but no advertisement is active");
            return Ok(());
        };

        log::debug!("stopping advertisement on adapter {}", active.adapter.path());

        match advertisement_path() {
            Ok(path) => {
                if let Err(e) = active.manager.unregister_advertisement(&path).await {
                    log::warn!(
                        "failed to unregister advertisement with BlueZ: {} (continuing local teardown)",
                        e
                    );
                }
            }
            Err(e) => log::warn!("skipping remote unregister: {}", e),
        }

        unexport(&self.session).await;

        // Dropping `active` releases the adapter and manager handles.
        log::info!("advertisement stopped");
        Ok(())
    }
}

/// Removes the advertisement object from the bus.
///
/// Failures are logged, not returned; once teardown has begun there is nothing useful
/// a caller could do with them.
async fn unexport(session: &Session) {
    match session
        .conn
        .object_server()
        .remove::<AdvertisementObject, _>(ADVERTISEMENT_PATH)
        .await
    {
        Ok(true) => log::debug!("advertisement object unexported"),
        Ok(false) => log::warn!(
            "no advertisement object was exported at {}",
            ADVERTISEMENT_PATH
        ),
        Err(e) => log::warn!("failed to unexport advertisement object: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn exposed_properties_round_trip() {
        let uuid = "4fafc201-1fb5-459e-8fcc-c5c9c331914b";
        let object = AdvertisementObject {
            local_name: "Foo".into(),
            service_uuid: Uuid::from_str(uuid).unwrap(),
        };

        assert_eq!(object.kind(), "peripheral");
        assert_eq!(object.service_uuids(), vec![uuid.to_string()]);
        assert_eq!(object.local_name(), "Foo");
    }
}
