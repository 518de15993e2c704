//! Non-fatal routing lint.
//!
//! The engine tolerates malformed entries by dropping them. Linting reports
//! the same problems up front so an operator can fix the file.

use std::fmt;

use rustc_hash::FxHashSet;
use splitroute_core::defaults;
use splitroute_rules::{
    Action, PriorityMode,
    addr::{parse_cidr_v4, parse_cidr_v6},
    matcher::parse_port_token,
};

use crate::{RoutingSection, RuleSection};

/// One lint finding. `rule` is `None` for routing-level findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingWarning {
    pub rule: Option<String>,
    pub message: String,
}

impl RoutingWarning {
    fn routing(message: impl Into<String>) -> Self {
        Self {
            rule: None,
            message: message.into(),
        }
    }

    fn rule(name: &str, message: impl Into<String>) -> Self {
        Self {
            rule: Some(name.to_string()),
            message: message.into(),
        }
    }
}

impl fmt::Display for RoutingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule {
            Some(rule) => write!(f, "rule {rule}: {}", self.message),
            None => write!(f, "routing: {}", self.message),
        }
    }
}

/// Lint a raw routing section. An empty result means the engine will use
/// every entry as written.
pub fn lint_routing(section: &RoutingSection) -> Vec<RoutingWarning> {
    let mut warnings = Vec::new();

    if let Some(mode) = section.priority_mode.as_deref().map(str::trim)
        && !mode.is_empty()
        && mode.parse::<PriorityMode>().is_err()
    {
        warnings.push(RoutingWarning::routing(format!(
            "unknown priority_mode {mode:?}, using order"
        )));
    }
    if let Some(Action::Other(name)) = section.default_action.as_deref().and_then(Action::parse) {
        warnings.push(RoutingWarning::routing(format!(
            "default_action {name:?} is not proxy, direct or block"
        )));
    }

    let number_mode = section.resolved_priority_mode() == PriorityMode::Number;
    let mut seen = FxHashSet::default();
    for (index, rule) in section.rules.iter().enumerate() {
        let name = rule.resolved_name(index);
        if !seen.insert(name.clone()) {
            warnings.push(RoutingWarning::rule(&name, "duplicate rule name"));
        }
        lint_rule(&name, rule, &mut warnings);

        if number_mode
            && section.uses_default_private()
            && rule.resolved_priority() >= defaults::PRIVATE_RULE_PRIORITY
        {
            warnings.push(RoutingWarning::rule(
                &name,
                format!(
                    "priority {} competes with the built-in {} rule ({})",
                    rule.resolved_priority(),
                    defaults::PRIVATE_RULE_NAME,
                    defaults::PRIVATE_RULE_PRIORITY
                ),
            ));
        }
    }
    warnings
}

fn lint_rule(name: &str, rule: &RuleSection, warnings: &mut Vec<RoutingWarning>) {
    let entries = |list: &Option<Vec<String>>| -> Vec<String> {
        list.iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    };

    for cidr in entries(&rule.ip_cidrs_v4) {
        if let Err(e) = parse_cidr_v4(&cidr) {
            warnings.push(RoutingWarning::rule(name, e.to_string()));
        }
    }
    for cidr in entries(&rule.ip_cidrs_v6) {
        if let Err(e) = parse_cidr_v6(&cidr) {
            warnings.push(RoutingWarning::rule(name, e.to_string()));
        }
    }
    for token in entries(&rule.ports) {
        if let Err(e) = parse_port_token(&token) {
            warnings.push(RoutingWarning::rule(name, e.to_string()));
        }
    }
    if rule
        .domains
        .iter()
        .flatten()
        .any(|d| d.trim().is_empty())
    {
        warnings.push(RoutingWarning::rule(name, "empty domain pattern"));
    }
    if let Some(Action::Other(action)) = rule.action.as_deref().and_then(Action::parse) {
        warnings.push(RoutingWarning::rule(
            name,
            format!("action {action:?} is not proxy, direct or block"),
        ));
    }

    let has_targets = !entries(&rule.domains).is_empty()
        || !entries(&rule.ip_cidrs_v4).is_empty()
        || !entries(&rule.ip_cidrs_v6).is_empty();
    if rule.is_enabled() && !has_targets {
        warnings.push(RoutingWarning::rule(
            name,
            "no domains or CIDRs, rule can never match",
        ));
    }
}
