//! Probe-target eligibility.
//!
//! The status selector fetches `/stats` from announced peers. Announced
//! addresses are attacker-controlled, so only public unicast IPv4 targets
//! are allowed unless private ranges are explicitly enabled.

use std::fmt;
use std::net::Ipv4Addr;

/// Why an announced address may not be probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeRejection {
    /// Not a dotted-quad IPv4 address.
    NotIpv4,
    /// `0.0.0.0`.
    Unspecified,
    /// RFC 6890 special-use, multicast or reserved.
    SpecialUse,
    /// RFC 1918, loopback or link-local.
    Private,
}

impl fmt::Display for ProbeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotIpv4 => write!(f, "not an IPv4 address"),
            Self::Unspecified => write!(f, "unspecified address"),
            Self::SpecialUse => write!(f, "special-use range"),
            Self::Private => write!(f, "private range"),
        }
    }
}

/// Check whether `ip` may be probed.
pub fn probe_target(ip: &str, allow_private: bool) -> Result<Ipv4Addr, ProbeRejection> {
    let addr: Ipv4Addr = ip.trim().parse().map_err(|_| ProbeRejection::NotIpv4)?;
    if addr.is_unspecified() {
        return Err(ProbeRejection::Unspecified);
    }
    if is_special_use(addr) {
        return Err(ProbeRejection::SpecialUse);
    }
    if !allow_private && is_private(addr) {
        return Err(ProbeRejection::Private);
    }
    Ok(addr)
}

pub fn is_probe_eligible(ip: &str, allow_private: bool) -> bool {
    probe_target(ip, allow_private).is_ok()
}

fn is_special_use(addr: Ipv4Addr) -> bool {
    let [a, b, c, _] = addr.octets();
    a == 0
        || (a == 100 && (64..=127).contains(&b))
        || (a == 192 && b == 0 && c == 0)
        || (a == 192 && b == 88 && c == 99)
        || (a == 198 && (b == 18 || b == 19))
        || a >= 224
}

fn is_private(addr: Ipv4Addr) -> bool {
    let [a, b, _, _] = addr.octets();
    a == 10
        || (a == 172 && (16..=31).contains(&b))
        || (a == 192 && b == 168)
        || a == 127
        || (a == 169 && b == 254)
}
