//! # splitroute
//!
//! Rule-based split routing: for each destination host, port and protocol,
//! decide whether the connection goes direct, through the proxy, or is
//! blocked.
//!
//! ## Crates
//!
//! - [`splitroute_core`] - Default values and the private-network table
//! - [`splitroute_rules`] - Matchers, rule ordering and the evaluator
//! - [`splitroute_config`] - Configuration loading, resolution and lint

pub mod cli;

pub use splitroute_config as config;
pub use splitroute_core as core;
pub use splitroute_rules as rules;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use splitroute_config::{ConfigError, lint_routing, load_document, load_routing};
    pub use splitroute_rules::{
        Action, HotRuleEngine, MatchRequest, MatchResult, RoutingConfig, RuleEngine, evaluate,
    };
}
