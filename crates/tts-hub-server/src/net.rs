//! Local address detection.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Reply used when no usable interface is found.
pub const NO_INTERFACE: &str = "NO ETH INTERFACE FOUND";

/// Best-effort non-loopback IPv4 address of this host.
///
/// Asks the routing table which source address would reach a public host;
/// no packet is sent.
pub fn external_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    if socket.connect("8.8.8.8:80").is_err() && socket.connect("1.1.1.1:80").is_err() {
        return None;
    }
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(v4) if is_external(&v4) => Some(v4),
        _ => None,
    }
}

fn is_external(ip: &Ipv4Addr) -> bool {
    !(ip.is_loopback() || ip.is_unspecified() || ip.is_link_local())
}
