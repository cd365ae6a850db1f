//! BLE peripheral advertising and device management through BlueZ' D-Bus interface.
//!
//! The main entry point is [`Advertiser`], which makes the host discoverable and
//! connectable as a BLE peripheral. [`Adapter`] and [`device::Device`] cover the
//! surrounding one-shot flows: listing paired devices, pairing, connecting and
//! disconnecting.

mod adapter;
pub mod address;
mod advertising;
pub mod device;
mod error;
pub mod uuid;

pub use adapter::Adapter;
pub use advertising::{Advertisement, Advertiser};
pub use error::{Error, ErrorKind, Result};

use zbus::{fdo::ObjectManagerProxy, Connection};

/// A cloneable handle to the system D-Bus connection.
///
/// This type is used to construct various objects in this library. All objects created
/// from the same [`Session`] share one bus connection.
#[derive(Clone)]
pub struct Session {
    conn: Connection,
}

impl Session {
    /// Connects to the system bus.
    pub async fn new() -> Result<Self> {
        Ok(Self {
            conn: Connection::system()
                .await
                .map_err(|e| Error::new(ErrorKind::Connection, e))?,
        })
    }

    /// Connects to the BlueZ D-Bus object manager.
    async fn object_manager(&self) -> Result<ObjectManagerProxy<'static>> {
        ObjectManagerProxy::builder(&self.conn)
            .destination("org.bluez")
            .map_err(|e| Error::new(ErrorKind::ServiceUnavailable, e))?
            .path("/")
            .map_err(|e| Error::new(ErrorKind::ServiceUnavailable, e))?
            .build()
            .await
            .map_err(|e| Error::new(ErrorKind::ServiceUnavailable, e))
    }
}
