//! Routing rule evaluator for splitroute.
//!
//! Decides whether a connection goes direct, through the proxy, or is
//! blocked, by matching an ordered set of rules against the destination
//! host, port and protocol.
//!
//! # Architecture
//!
//! - **Address parser** (`addr`): IPv4 / IPv6 literals and CIDR blocks
//! - **Matchers**: `DomainMatcher` (exact, suffix and glob), `CidrMatcher`,
//!   `PortMatcher` (inclusive ranges), `ProtocolMatcher`
//! - **Rule set builder** (`ruleset`): injects the private-network rule and
//!   applies the priority mode
//! - **Engine**: `RuleEngine` compiles a `RoutingConfig` once and evaluates
//!   requests first-match-wins; `HotRuleEngine` swaps snapshots atomically
//!
//! Malformed CIDRs and port tokens never abort evaluation. They are dropped
//! from the rule they belong to and the remaining entries keep matching.
//!
//! # Example
//!
//! ```
//! use splitroute_rules::{Action, MatchRequest, Rule, RoutingConfig, evaluate};
//!
//! let config = RoutingConfig {
//!     rules: vec![Rule {
//!         domains: vec!["*.corp.example.com".into()],
//!         protocols: vec!["tcp".into()],
//!         action: Some(Action::Direct),
//!         ..Rule::new("corp")
//!     }],
//!     ..RoutingConfig::default()
//! };
//!
//! let hit = evaluate(&config, &MatchRequest::new("api.corp.example.com", 443, "tcp"));
//! assert_eq!(hit.action, Action::Direct);
//! assert_eq!(hit.rule, "corp");
//!
//! let miss = evaluate(&config, &MatchRequest::new("example.org", 443, "tcp"));
//! assert_eq!(miss.action, Action::Proxy);
//! assert_eq!(miss.rule, "(default)");
//! ```

pub mod addr;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod rule;
pub mod ruleset;

pub use engine::{HotRuleEngine, RuleEngine, RuleSummary, evaluate};
pub use error::RulesError;
pub use rule::{Action, MatchRequest, MatchResult, PriorityMode, Rule, RoutingConfig};
pub use ruleset::build_effective_rules;
