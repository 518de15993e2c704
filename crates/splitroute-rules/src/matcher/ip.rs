//! IP CIDR matcher.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::{Ipv4Net, Ipv6Net};
use tracing::debug;

use crate::addr::{parse_cidr_v4, parse_cidr_v6};

/// Check whether `ip` lies inside an IPv4 block: `(ip & mask) == network`.
pub fn match_cidr_v4(ip: Ipv4Addr, cidr: &Ipv4Net) -> bool {
    let mask = u32::from(cidr.netmask());
    u32::from(ip) & mask == u32::from(cidr.network()) & mask
}

/// Check whether `ip` lies inside an IPv6 block.
///
/// Whole bytes are compared up to `prefix / 8`, then the remaining
/// `prefix % 8` bits of the next byte from the most significant side.
pub fn match_cidr_v6(ip: Ipv6Addr, cidr: &Ipv6Net) -> bool {
    let prefix = usize::from(cidr.prefix_len());
    let full = prefix / 8;
    let rem = prefix % 8;
    let ip = ip.octets();
    let net = cidr.network().octets();

    if ip[..full] != net[..full] {
        return false;
    }
    if rem == 0 {
        return true;
    }
    let mask = 0xffu8 << (8 - rem);
    ip[full] & mask == net[full] & mask
}

/// Matcher for a rule's IPv4 and IPv6 CIDR lists.
///
/// CIDRs are stored in sorted, deduplicated vectors. Lookup is a linear
/// scan since containment checks cannot use simple binary search.
#[derive(Debug)]
pub struct CidrMatcher {
    v4: Vec<Ipv4Net>,
    v6: Vec<Ipv6Net>,
}

impl CidrMatcher {
    /// Create a new CIDR matcher from unsorted lists.
    pub fn new(mut v4: Vec<Ipv4Net>, mut v6: Vec<Ipv6Net>) -> Self {
        v4.sort();
        v4.dedup();
        v6.sort();
        v6.dedup();
        Self { v4, v6 }
    }

    /// Build a matcher from textual CIDR entries.
    ///
    /// Entries are trimmed; blank and malformed entries are dropped so the
    /// rest of the list keeps working.
    pub fn from_entries<S: AsRef<str>>(v4: &[S], v6: &[S]) -> Self {
        let v4 = v4
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .filter_map(|s| {
                parse_cidr_v4(s)
                    .inspect_err(|e| debug!(error = %e, "dropping IPv4 CIDR entry"))
                    .ok()
            })
            .collect();
        let v6 = v6
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .filter_map(|s| {
                parse_cidr_v6(s)
                    .inspect_err(|e| debug!(error = %e, "dropping IPv6 CIDR entry"))
                    .ok()
            })
            .collect();
        Self::new(v4, v6)
    }

    /// Create an empty CIDR matcher.
    pub fn empty() -> Self {
        Self {
            v4: Vec::new(),
            v6: Vec::new(),
        }
    }

    /// Check if an IP address is contained in any CIDR range.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match ip {
            IpAddr::V4(v4) => self.contains_v4(v4),
            IpAddr::V6(v6) => self.contains_v6(v6),
        }
    }

    fn contains_v4(&self, addr: Ipv4Addr) -> bool {
        self.v4.iter().any(|cidr| match_cidr_v4(addr, cidr))
    }

    fn contains_v6(&self, addr: Ipv6Addr) -> bool {
        self.v6.iter().any(|cidr| match_cidr_v6(addr, cidr))
    }

    /// Returns true if no CIDRs are registered.
    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }

    /// Total number of CIDR entries.
    pub fn len(&self) -> usize {
        self.v4.len() + self.v6.len()
    }
}

impl Default for CidrMatcher {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    fn v6(s: &str) -> Ipv6Addr {
        s.parse().unwrap()
    }

    #[test]
    fn match_v4_prefix() {
        let cidr = parse_cidr_v4("192.168.0.0/16").unwrap();
        assert!(match_cidr_v4(v4("192.168.1.50"), &cidr));
        assert!(!match_cidr_v4(v4("192.169.1.50"), &cidr));
    }

    #[test]
    fn match_v4_zero_prefix_matches_all() {
        let cidr = parse_cidr_v4("1.2.3.4/0").unwrap();
        assert!(match_cidr_v4(v4("8.8.8.8"), &cidr));
        assert!(match_cidr_v4(v4("255.255.255.255"), &cidr));
    }

    #[test]
    fn match_v6_partial_byte() {
        // fc00::/7 covers fc00::/8 and fd00::/8
        let cidr = parse_cidr_v6("fc00::/7").unwrap();
        assert!(match_cidr_v6(v6("fc00::1"), &cidr));
        assert!(match_cidr_v6(v6("fd12:3456::1"), &cidr));
        assert!(!match_cidr_v6(v6("fe00::1"), &cidr));

        let cidr = parse_cidr_v6("fe80::/10").unwrap();
        assert!(match_cidr_v6(v6("fe80::1"), &cidr));
        assert!(match_cidr_v6(v6("febf::1"), &cidr));
        assert!(!match_cidr_v6(v6("fec0::1"), &cidr));
    }

    #[test]
    fn match_v6_full_and_zero() {
        let lo = parse_cidr_v6("::1/128").unwrap();
        assert!(match_cidr_v6(Ipv6Addr::LOCALHOST, &lo));
        assert!(!match_cidr_v6(v6("::2"), &lo));

        let any = parse_cidr_v6("::/0").unwrap();
        assert!(match_cidr_v6(v6("2001:db8::1"), &any));
    }

    #[test]
    fn cidr_v4_contains() {
        let m = CidrMatcher::from_entries(&["192.168.0.0/16", "10.0.0.0/8"], &[]);
        assert!(m.contains(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))));
        assert!(m.contains(IpAddr::V4(Ipv4Addr::new(10, 255, 255, 255))));
        assert!(!m.contains(IpAddr::V4(Ipv4Addr::new(172, 16, 0, 1))));
        assert!(!m.contains(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))));
    }

    #[test]
    fn cidr_families_are_separate() {
        let m = CidrMatcher::from_entries(&["0.0.0.0/0"], &[]);
        assert!(!m.contains(IpAddr::V6(Ipv6Addr::LOCALHOST)));

        let m = CidrMatcher::from_entries(&[], &["::/0"]);
        assert!(!m.contains(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    }

    #[test]
    fn bad_entries_are_dropped() {
        let m = CidrMatcher::from_entries(
            &["10.0.0.0/33", "garbage", " 127.0.0.0/8 ", ""],
            &["fc00::/200", "::1/128"],
        );
        assert_eq!(m.len(), 2);
        assert!(m.contains(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        assert!(m.contains(IpAddr::V6(Ipv6Addr::LOCALHOST)));
    }

    #[test]
    fn cidr_empty() {
        let m = CidrMatcher::empty();
        assert!(!m.contains(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        assert!(m.is_empty());
    }
}
