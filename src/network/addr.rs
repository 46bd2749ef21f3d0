//! IPv4 address inputs accepted by the encoder setters.
//!
//! Addresses may be given in dotted-decimal form (`"192.168.0.1"`) or
//! numerically. Hostnames are never resolved here.

use std::net::Ipv4Addr;

use tracing::debug;

use crate::error::{Error, Result};

/// Conversion into a 4-byte IPv4 address.
pub trait IntoIpv4 {
    fn into_ipv4(self) -> Result<Ipv4Addr>;
}

impl IntoIpv4 for &str {
    /// Four period-separated decimal octets, each 0-255.
    fn into_ipv4(self) -> Result<Ipv4Addr> {
        self.parse::<Ipv4Addr>()
            .map_err(|_| Error::InvalidAddress(self.to_owned()))
    }
}

impl IntoIpv4 for &String {
    fn into_ipv4(self) -> Result<Ipv4Addr> {
        self.as_str().into_ipv4()
    }
}

impl IntoIpv4 for String {
    fn into_ipv4(self) -> Result<Ipv4Addr> {
        self.as_str().into_ipv4()
    }
}

impl IntoIpv4 for Ipv4Addr {
    fn into_ipv4(self) -> Result<Ipv4Addr> {
        Ok(self)
    }
}

impl IntoIpv4 for [u8; 4] {
    fn into_ipv4(self) -> Result<Ipv4Addr> {
        Ok(Ipv4Addr::from(self))
    }
}

impl IntoIpv4 for u32 {
    fn into_ipv4(self) -> Result<Ipv4Addr> {
        Ok(Ipv4Addr::from(self))
    }
}

/// Unwrap an address that must be configured before packing.
pub(crate) fn require(addr: Option<Ipv4Addr>, field: &'static str) -> Result<Ipv4Addr> {
    addr.ok_or_else(|| {
        debug!(field, "refusing to pack without an address");
        Error::MissingField { field }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_dotted_decimal() {
        assert_eq!("192.168.0.1".into_ipv4().unwrap(), Ipv4Addr::new(192, 168, 0, 1));
        assert_eq!("0.0.0.0".into_ipv4().unwrap(), Ipv4Addr::UNSPECIFIED);
        assert_eq!(
            String::from("255.255.255.255").into_ipv4().unwrap(),
            Ipv4Addr::BROADCAST
        );
    }

    #[test]
    fn test_numeric_forms() {
        assert_eq!(0x0808_0808u32.into_ipv4().unwrap(), Ipv4Addr::new(8, 8, 8, 8));
        assert_eq!([10u8, 0, 0, 1].into_ipv4().unwrap(), Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn test_require() {
        assert!(require(Some(Ipv4Addr::LOCALHOST), "source address").is_ok());
        let err = require(None, "destination address").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.to_string(), "destination address must be set before packing");
    }

    #[test]
    fn test_malformed_addresses() {
        let inputs = [
            "256.0.0.1",
            "1.2.3",
            "1.2.3.4.5",
            "",
            "a.b.c.d",
            "example.com",
            "1..2.3",
            "01.2.3.4",
        ];
        for input in inputs {
            let err = input.into_ipv4().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValueRange, "{input}");
            assert!(matches!(err, Error::InvalidAddress(ref s) if s == input));
        }
    }
}
