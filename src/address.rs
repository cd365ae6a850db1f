//! Bluetooth device addresses.

use core::fmt;
use std::{fmt::Write, str::FromStr};

/// A 6-Byte Bluetooth device address.
///
/// Parsed from the colon-separated form BlueZ reports (`AA:BB:CC:11:22:33`) via the
/// [`FromStr`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 6]);

impl Address {
    #[inline]
    pub fn from_bytes(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Returns the D-Bus object path BlueZ assigns to this device under the given
    /// adapter path (eg. `/org/bluez/hci0/dev_AA_BB_CC_11_22_33`).
    pub(crate) fn object_path(&self, adapter_path: &str) -> String {
        format!("{}/dev_{}", adapter_path, self.to_string().replace(':', "_"))
    }
}

impl From<[u8; 6]> for Address {
    #[inline]
    fn from(value: [u8; 6]) -> Self {
        Self(value)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_char(':')?;
            }

            write!(f, "{:02X}", byte)?;
        }

        Ok(())
    }
}

/// Parses a Bluetooth [`Address`] from a colon-separated hex string.
///
/// Example: `aa:ff:00:33:22:11`
impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0; 6];
        let mut parts = s.split(':');
        for byte in &mut bytes {
            let part = parts.next().ok_or(ParseAddressError(()))?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(ParseAddressError(()));
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| ParseAddressError(()))?;
        }

        if parts.next().is_some() {
            return Err(ParseAddressError(()));
        }

        Ok(Self(bytes))
    }
}

/// The error type returned by the [`FromStr`] implementation of [`Address`].
#[derive(Debug)]
pub struct ParseAddressError(());

impl fmt::Display for ParseAddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid device address")
    }
}

impl std::error::Error for ParseAddressError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        let s = "AA:BB:CC:11:22:33";
        let addr = Address::from_str(s).unwrap();
        assert_eq!(addr.to_string(), s);
        assert_eq!(Address::from_str("aa:bb:cc:11:22:33").unwrap(), addr);
    }

    #[test]
    fn invalid() {
        Address::from_str("").unwrap_err();
        Address::from_str("aa:bb:cc:11:22:3").unwrap_err();
        Address::from_str("aa:bb:cc:11:22:333").unwrap_err();
        Address::from_str("aa:bb:cc:11:22:33:").unwrap_err();
        Address::from_str("aa:bb:cc:11:22:33:44").unwrap_err();
        Address::from_str("aa:bb:cc:11:22:33 ").unwrap_err();
        Address::from_str("za:bb:cc:11:22:33").unwrap_err();
        Address::from_str("+a:bb:cc:11:22:33").unwrap_err();
    }

    #[test]
    fn device_path() {
        let addr = Address::from_str("aa:bb:cc:11:22:33").unwrap();
        assert_eq!(
            addr.object_path("/org/bluez/hci0"),
            "/org/bluez/hci0/dev_AA_BB_CC_11_22_33"
        );
    }
}
