//! Rule matchers for each match axis.

pub mod domain;
pub mod ip;
pub mod port;
pub mod protocol;

pub use domain::{DomainMatcher, glob_match, match_domain, normalize_host};
pub use ip::{CidrMatcher, match_cidr_v4, match_cidr_v6};
pub use port::{PortMatcher, parse_port_token};
pub use protocol::ProtocolMatcher;
