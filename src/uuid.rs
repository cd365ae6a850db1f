//! Bluetooth service UUIDs.

use core::fmt;
use std::{fmt::Write, str::FromStr};

/// A 128-bit UUID, identifying a Bluetooth service.
///
/// # Construction
///
/// [`Uuid`]s are parsed from their textual `8-4-4-4-12` form via [`FromStr`], created
/// from raw bytes via [`Uuid::from_bytes`], or derived from a 16-bit "alias" assigned by
/// the Bluetooth SIG via [`Uuid::from_u16`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uuid([u8; 16]);

impl Uuid {
    /// The Bluetooth base UUID all 16-bit aliases expand into.
    const BASE: Self = Self([
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0x80, 0x5f, 0x9b,
        0x34, 0xfb,
    ]);

    /// Creates a [`Uuid`] from its raw big-endian bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Creates a [`Uuid`] from a 16-bit alias.
    pub const fn from_u16(short: u16) -> Self {
        let [hi, lo] = short.to_be_bytes();
        let mut uuid = Self::BASE;
        uuid.0[2] = hi;
        uuid.0[3] = lo;
        uuid
    }
}

impl FromStr for Uuid {
    type Err = ParseUuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Hex digit groups of a textual UUID like 7c9ac820-0886-4e50-bcca-588b883f8649.
        const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != GROUPS.len() {
            return Err(ParseUuidError(()));
        }

        let mut bytes = [0; 16];
        let mut i = 0;
        for (part, len) in parts.iter().zip(GROUPS) {
            if part.len() != len || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(ParseUuidError(()));
            }

            for pair in part.as_bytes().chunks(2) {
                let hex = std::str::from_utf8(pair).map_err(|_| ParseUuidError(()))?;
                bytes[i] = u8::from_str_radix(hex, 16).map_err(|_| ParseUuidError(()))?;
                i += 1;
            }
        }

        Ok(Self(bytes))
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_char('-')?;
            }
            write!(f, "{:02x}", byte)?;
        }

        Ok(())
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// The error type returned by the [`FromStr`] implementation of [`Uuid`].
#[derive(Debug)]
pub struct ParseUuidError(());

impl fmt::Display for ParseUuidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("malformed UUID")
    }
}

impl std::error::Error for ParseUuidError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let s = "4fafc201-1fb5-459e-8fcc-c5c9c331914b";
        assert_eq!(Uuid::from_str(s).unwrap().to_string(), s);
        assert_eq!(
            Uuid::BASE.to_string(),
            "00000000-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn uppercase_input() {
        let uuid = Uuid::from_str("4FAFC201-1FB5-459E-8FCC-C5C9C331914B").unwrap();
        assert_eq!(uuid.to_string(), "4fafc201-1fb5-459e-8fcc-c5c9c331914b");
    }

    #[test]
    fn from_alias() {
        assert_eq!(
            Uuid::from_u16(0x180d).to_string(),
            "0000180d-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn invalid() {
        Uuid::from_str("").unwrap_err();
        Uuid::from_str("4fafc201").unwrap_err();
        Uuid::from_str("4fafc201-1fb5-459e-8fcc").unwrap_err();
        Uuid::from_str("4fafc201-1fb5-459e-8fcc-c5c9c331914").unwrap_err();
        Uuid::from_str("4fafc201-1fb5-459e-8fcc-c5c9c331914b-00").unwrap_err();
        Uuid::from_str("4fafc201+1fb5-459e-8fcc-c5c9c331914b").unwrap_err();
        Uuid::from_str("gfafc201-1fb5-459e-8fcc-c5c9c331914b").unwrap_err();
    }
}
