//! Deterministic derivation of node and workload identifiers
//!
//! When no allocator has handed out addressing for a secondary network, the
//! addresses of a subnet are laid out as:
//! - first host: node gateway
//! - second host: node management port
//! - third host: the workload
//!
//! MACs are derived from IPs so the same IP always yields the same MAC.

use ipnetwork::IpNetwork;
use mac_address::MacAddress;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::debug;

/// Leading octets of every MAC derived from an IP
const DERIVED_MAC_PREFIX: [u8; 2] = [0x0a, 0x58];

/// Source of the per-node addresses carved out of a subnet
pub trait NodeAddressing {
    /// Address of the node's gateway on `subnet`
    fn gateway_address(&self, subnet: &IpNetwork) -> Option<IpNetwork>;

    /// Address of the node's management port on `subnet`
    fn management_address(&self, subnet: &IpNetwork) -> Option<IpNetwork>;
}

/// Gateway on the first host address, management port on the second
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialAddressing;

impl NodeAddressing for SequentialAddressing {
    fn gateway_address(&self, subnet: &IpNetwork) -> Option<IpNetwork> {
        nth_address(subnet, 1)
    }

    fn management_address(&self, subnet: &IpNetwork) -> Option<IpNetwork> {
        nth_address(subnet, 2)
    }
}

/// The `n`th address of `subnet` (0 being the network address), carrying the
/// subnet prefix; `None` when the subnet is too small
pub fn nth_address(subnet: &IpNetwork, n: u128) -> Option<IpNetwork> {
    let ip = offset_ip(subnet.network(), n)?;
    if !subnet.contains(ip) {
        return None;
    }
    IpNetwork::new(ip, subnet.prefix()).ok()
}

fn offset_ip(ip: IpAddr, n: u128) -> Option<IpAddr> {
    match ip {
        IpAddr::V4(v4) => {
            let n = u32::try_from(n).ok()?;
            let next = u32::from(v4).checked_add(n)?;
            Some(IpAddr::V4(Ipv4Addr::from(next)))
        }
        IpAddr::V6(v6) => {
            let next = u128::from(v6).checked_add(n)?;
            Some(IpAddr::V6(Ipv6Addr::from(next)))
        }
    }
}

/// The address following `ip`; `None` past the end of the address family
pub fn next_ip(ip: IpAddr) -> Option<IpAddr> {
    offset_ip(ip, 1)
}

/// MAC address derived from an IP: `0a:58` followed by the IPv4 octets, or
/// by the last four octets of an IPv6 address
pub fn ip_to_mac(ip: IpAddr) -> MacAddress {
    let tail = match ip {
        IpAddr::V4(v4) => v4.octets(),
        IpAddr::V6(v6) => {
            let octets = v6.octets();
            [octets[12], octets[13], octets[14], octets[15]]
        }
    };
    MacAddress::new([
        DERIVED_MAC_PREFIX[0],
        DERIVED_MAC_PREFIX[1],
        tail[0],
        tail[1],
        tail[2],
        tail[3],
    ])
}

/// Colon separated lowercase hex, the form stored in the database
pub fn format_mac(mac: &MacAddress) -> String {
    let b = mac.bytes();
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        b[0], b[1], b[2], b[3], b[4], b[5]
    )
}

/// Workload address of `subnet`: the one right after the management address
pub fn workload_address(subnet: &IpNetwork, addressing: &dyn NodeAddressing) -> Option<IpNetwork> {
    let management = addressing.management_address(subnet)?;
    let ip = next_ip(management.ip())?;
    if !subnet.contains(ip) {
        return None;
    }
    IpNetwork::new(ip, subnet.prefix()).ok()
}

/// Identifiers of a workload on a subnet without an allocator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedIdentifiers {
    pub address: IpNetwork,
    pub mac: MacAddress,
    /// Default gateway of the workload: the node management address
    pub gateway: IpAddr,
}

/// Derive the workload identifiers for `subnet`; `None` when the subnet is
/// absent or cannot hold the addresses
pub fn derive_identifiers(
    subnet: Option<&IpNetwork>,
    addressing: &dyn NodeAddressing,
) -> Option<DerivedIdentifiers> {
    let subnet = subnet?;
    let gateway = addressing.management_address(subnet)?.ip();
    let address = workload_address(subnet, addressing)?;
    Some(DerivedIdentifiers {
        address,
        mac: ip_to_mac(address.ip()),
        gateway,
    })
}

/// [`derive_identifiers`] for a subnet in text form; malformed text yields `None`
pub fn derive_from_str(subnet: &str, addressing: &dyn NodeAddressing) -> Option<DerivedIdentifiers> {
    match subnet.trim().parse::<IpNetwork>() {
        Ok(subnet) => derive_identifiers(Some(&subnet), addressing),
        Err(e) => {
            debug!("Cannot derive identifiers from subnet {:?}: {}", subnet, e);
            None
        }
    }
}

/// Tunnel identifiers for attachments in declaration order, starting at 1
///
/// Consumers cache these ids; declaring the same attachments in another
/// order renumbers them.
pub fn assign_tunnel_ids<I, S>(attachments: I) -> Vec<(String, u32)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    attachments
        .into_iter()
        .zip(1u32..)
        .map(|(name, id)| (name.as_ref().to_string(), id))
        .collect()
}
