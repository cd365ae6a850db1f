use core::fmt;

/// A result type hardwired to use [`Error`] as its error type.
pub type Result<T> = std::result::Result<T, Error>;

/// The primary error type used throughout this library.
///
/// Every error carries an [`ErrorKind`] classifying the failure and a human-readable
/// message describing what went wrong. For some kinds, [`Error::remediation`] offers a
/// hint on how the condition might be resolved.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

/// Broad classification of an [`Error`], returned by [`Error::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The system message bus could not be reached.
    Connection,
    /// BlueZ is not running, or a call to it failed.
    ServiceUnavailable,
    /// The advertisement object could not be exported on the bus.
    RegistrationFailed,
    /// An advertisement is already active on this [`Advertiser`][crate::Advertiser].
    AlreadyActive,
    /// No Bluetooth adapter is present on the system.
    AdapterNotFound,
    /// The device is not known to BlueZ, or its address is malformed.
    DeviceNotFound,
    /// Pairing was rejected or failed.
    PairingFailed,
    /// The device did not respond to a pairing request in time.
    PairingTimeout,
    /// The connection attempt was rejected or failed.
    ConnectionFailed,
    /// The device did not respond to a connection attempt in time.
    ConnectionTimeout,
    /// Disconnecting from the device failed.
    DisconnectFailed,
    /// Any failure that fits no other kind.
    Unknown,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, message: impl fmt::Display) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }

    /// Returns the [`ErrorKind`] classifying this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns a hint describing how the failure might be resolved, if one applies.
    pub fn remediation(&self) -> Option<&'static str> {
        match self.kind {
            ErrorKind::Connection => Some("ensure the system D-Bus daemon is running"),
            ErrorKind::ServiceUnavailable => {
                Some("ensure the BlueZ service is running and Bluetooth is enabled")
            }
            ErrorKind::AdapterNotFound => {
                Some("ensure a Bluetooth adapter is present and not blocked by rfkill")
            }
            ErrorKind::DeviceNotFound => {
                Some("ensure the device is discoverable and within range")
            }
            ErrorKind::PairingFailed => Some("ensure the device is in pairing mode"),
            ErrorKind::PairingTimeout | ErrorKind::ConnectionTimeout => {
                Some("ensure the device is powered on and within range")
            }
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}
