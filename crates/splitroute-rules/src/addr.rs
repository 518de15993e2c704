//! Address and CIDR literal parsing.
//!
//! The accepted grammar is deliberately narrower than `std::net`'s:
//! IPv4 octets may carry leading zeros (`010` is ten, not octal), while
//! IPv6 literals only support plain hex groups with at most one `::`.
//! Embedded IPv4 (`::ffff:1.2.3.4`) and zone IDs (`fe80::1%eth0`) are
//! rejected.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::{Ipv4Net, Ipv6Net};

use crate::error::RulesError;

/// Parse a dotted-quad IPv4 literal.
///
/// Exactly four `.`-separated groups of 1-3 decimal digits, each `0..=255`.
pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr, RulesError> {
    let invalid = || RulesError::InvalidAddress(text.to_string());

    let mut octets = [0u8; 4];
    let mut parts = text.split('.');
    for octet in &mut octets {
        let part = parts.next().ok_or_else(invalid)?;
        *octet = parse_octet(part).ok_or_else(invalid)?;
    }
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok(Ipv4Addr::from(octets))
}

/// Parse an IPv6 literal with optional `::` zero-run compression.
///
/// Without `::` all eight groups must be present. With `::` the explicit
/// groups on both sides may total at most eight; the gap is zero-filled.
pub fn parse_ipv6(text: &str) -> Result<Ipv6Addr, RulesError> {
    let invalid = || RulesError::InvalidAddress(text.to_string());

    let mut halves = text.split("::");
    let head = halves.next().unwrap_or_default();
    let tail = halves.next();
    if halves.next().is_some() {
        return Err(invalid());
    }

    let left = parse_groups(head).ok_or_else(invalid)?;
    let right = match tail {
        Some(tail) => parse_groups(tail).ok_or_else(invalid)?,
        None => Vec::new(),
    };

    let total = left.len() + right.len();
    let complete = match tail {
        Some(_) => total <= 8,
        None => total == 8,
    };
    if !complete {
        return Err(invalid());
    }

    let mut words = [0u16; 8];
    words[..left.len()].copy_from_slice(&left);
    words[8 - right.len()..].copy_from_slice(&right);
    Ok(Ipv6Addr::from(words))
}

/// Parse an IPv4 CIDR block such as `192.168.0.0/16`.
///
/// Host bits are cleared, so `192.168.1.1/16` yields `192.168.0.0/16`.
/// A `/0` prefix produces an all-zero mask that matches every address.
pub fn parse_cidr_v4(text: &str) -> Result<Ipv4Net, RulesError> {
    let invalid = || RulesError::InvalidCidr(text.to_string());

    let (addr, bits) = text.split_once('/').ok_or_else(invalid)?;
    let addr = parse_ipv4(addr).map_err(|_| invalid())?;
    let prefix = parse_prefix(bits, 32).ok_or_else(invalid)?;
    Ipv4Net::new(addr, prefix)
        .map(|net| net.trunc())
        .map_err(|_| invalid())
}

/// Parse an IPv6 CIDR block such as `fc00::/7`.
pub fn parse_cidr_v6(text: &str) -> Result<Ipv6Net, RulesError> {
    let invalid = || RulesError::InvalidCidr(text.to_string());

    let (addr, bits) = text.split_once('/').ok_or_else(invalid)?;
    let addr = parse_ipv6(addr).map_err(|_| invalid())?;
    let prefix = parse_prefix(bits, 128).ok_or_else(invalid)?;
    Ipv6Net::new(addr, prefix).map_err(|_| invalid())
}

/// Interpret a request host as an IP literal.
///
/// IPv4 is tried first, then IPv6. Returns `None` for domain names.
pub fn parse_host(host: &str) -> Option<IpAddr> {
    parse_ipv4(host)
        .map(IpAddr::V4)
        .or_else(|_| parse_ipv6(host).map(IpAddr::V6))
        .ok()
}

fn parse_octet(part: &str) -> Option<u8> {
    if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse::<u16>().ok().and_then(|v| u8::try_from(v).ok())
}

fn parse_groups(part: &str) -> Option<Vec<u16>> {
    if part.is_empty() {
        return Some(Vec::new());
    }
    part.split(':').map(parse_group).collect()
}

fn parse_group(group: &str) -> Option<u16> {
    if group.is_empty() || group.len() > 4 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(group, 16).ok()
}

fn parse_prefix(bits: &str, max: u8) -> Option<u8> {
    if bits.is_empty() || bits.len() > 3 || !bits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    bits.parse::<u8>().ok().filter(|&n| n <= max)
}
