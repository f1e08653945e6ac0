use core::{fmt, str::FromStr};
use std::net::Ipv6Addr;

/// Prefix of the global address assigned to each node.
pub const GLOBAL_PREFIX: Ipv6Addr = Ipv6Addr::new(0xaaaa, 0, 0, 0, 0, 0, 0, 0);

/// Address of the collector, the root of the mesh.
pub const DEFAULT_COLLECTOR: Ipv6Addr = Ipv6Addr::new(0xaaaa, 0, 0, 0, 0, 0, 0, 1);

/// An EUI-64 link layer address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkLayerAddress(pub [u8; 8]);

impl LinkLayerAddress {
    /// Node identity, taken from the last two bytes of the address.
    pub fn node_identity(&self) -> u16 {
        u16::from_be_bytes([self.0[6], self.0[7]])
    }

    /// Interface identifier, the address with the universal/local bit inverted.
    pub fn interface_identifier(&self) -> [u8; 8] {
        let mut iid = self.0;
        iid[0] ^= 0x02;
        iid
    }

    pub fn global_address(&self, prefix: Ipv6Addr) -> Ipv6Addr {
        let mut octets = prefix.octets();
        octets[8..].copy_from_slice(&self.interface_identifier());
        Ipv6Addr::from(octets)
    }
}

impl fmt::Display for LinkLayerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Link layer address must be 8 colon separated hex bytes")]
pub struct ParseLinkLayerAddressError;

impl FromStr for LinkLayerAddress {
    type Err = ParseLinkLayerAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut address = [0u8; 8];
        let mut parts = s.split(':');

        for b in address.iter_mut() {
            let part = parts.next().ok_or(ParseLinkLayerAddressError)?;
            if part.is_empty() || part.len() > 2 {
                return Err(ParseLinkLayerAddressError);
            }
            *b = u8::from_str_radix(part, 16).map_err(|_| ParseLinkLayerAddressError)?;
        }

        if parts.next().is_some() {
            return Err(ParseLinkLayerAddressError);
        }

        Ok(Self(address))
    }
}
