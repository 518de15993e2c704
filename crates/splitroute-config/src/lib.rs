//! Configuration loading for splitroute.
//!
//! Reads the application document (JSON, JSONC, YAML or TOML), extracts
//! `proxy_rules.routing`, fills every default and resolves it into the
//! immutable [`RoutingConfig`](splitroute_rules::RoutingConfig) the engine
//! evaluates.
//!
//! [`load_routing`] and [`load_routing_strict`] are the one-call entry
//! points for embedding the engine. Callers that also need the logging
//! settings load the [`AppDocument`] once with [`load_document`] and use
//! [`AppDocument::routing_or_default`] instead.

mod defaults;
mod loader;
mod types;
mod validate;

pub use loader::{ConfigError, load_document, load_routing, load_routing_strict};
pub use types::{AppDocument, LoggingConfig, ProxyRulesSection, RoutingSection, RuleSection};
pub use validate::{RoutingWarning, lint_routing};
