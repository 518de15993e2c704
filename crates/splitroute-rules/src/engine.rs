//! Rule engine: compiles a routing config and matches requests.

use std::net::IpAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info};

use crate::addr::parse_host;
use crate::matcher::{CidrMatcher, DomainMatcher, PortMatcher, ProtocolMatcher, normalize_host};
use crate::rule::{Action, MatchRequest, MatchResult, PriorityMode, Rule, RoutingConfig};
use crate::ruleset::build_effective_rules;

/// Evaluate one request against a routing config.
///
/// Pure and deterministic. Compiles the config on every call; callers
/// routing many connections should build a [`RuleEngine`] once instead.
pub fn evaluate(config: &RoutingConfig, request: &MatchRequest<'_>) -> MatchResult {
    if !config.enabled {
        return MatchResult::disabled();
    }
    RuleEngine::from_config(config).match_request(request)
}

/// A rule with all of its match lists pre-parsed.
#[derive(Debug)]
struct CompiledRule {
    name: String,
    enabled: bool,
    action: Action,
    priority: i64,
    protocols: ProtocolMatcher,
    ports: PortMatcher,
    domains: DomainMatcher,
    cidrs: CidrMatcher,
}

impl CompiledRule {
    fn compile(rule: &Rule, default_action: &Action) -> Self {
        Self {
            name: rule.name.clone(),
            enabled: rule.enabled,
            action: rule
                .action
                .clone()
                .unwrap_or_else(|| default_action.clone()),
            priority: rule.priority,
            protocols: ProtocolMatcher::from_names(&rule.protocols),
            ports: PortMatcher::from_tokens(&rule.ports),
            domains: DomainMatcher::from_patterns(&rule.domains),
            cidrs: CidrMatcher::from_entries(&rule.ip_cidrs_v4, &rule.ip_cidrs_v6),
        }
    }

    fn matches(&self, request: &MatchRequest<'_>, host: Option<&str>, ip: Option<IpAddr>) -> bool {
        if !self.protocols.matches(request.protocol) {
            return false;
        }
        if !self.ports.matches(request.port) {
            return false;
        }
        if host.is_some_and(|h| self.domains.matches_normalized(h)) {
            return true;
        }
        ip.is_some_and(|ip| self.cidrs.contains(ip))
    }
}

/// Summary of one entry in the effective rule order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSummary<'a> {
    pub name: &'a str,
    pub enabled: bool,
    /// Resolved action, with the routing default already applied.
    pub action: &'a Action,
    pub priority: i64,
}

/// The compiled rule engine.
///
/// Send + Sync, designed to be shared via `Arc<RuleEngine>`.
pub struct RuleEngine {
    enabled: bool,
    priority_mode: PriorityMode,
    rules: Vec<CompiledRule>,
    default_action: Action,
}

impl RuleEngine {
    /// Compile a routing config.
    ///
    /// Never fails: malformed CIDRs and port tokens are dropped from the
    /// rule they appear in and the rest of the rule keeps working.
    pub fn from_config(config: &RoutingConfig) -> Self {
        let rules: Vec<CompiledRule> = build_effective_rules(config)
            .iter()
            .map(|rule| {
                let compiled = CompiledRule::compile(rule, &config.default_action);
                debug!(
                    name = %compiled.name,
                    enabled = compiled.enabled,
                    priority = compiled.priority,
                    action = %compiled.action,
                    domains = compiled.domains.len(),
                    cidrs = compiled.cidrs.len(),
                    ports = compiled.ports.len(),
                    "compiled rule"
                );
                compiled
            })
            .collect();

        Self {
            enabled: config.enabled,
            priority_mode: config.priority_mode,
            rules,
            default_action: config.default_action.clone(),
        }
    }

    /// Route a request.
    ///
    /// Enabled rules are tried in effective order and the first match wins.
    /// If none matches, the default action is returned with rule `(default)`.
    pub fn match_request(&self, request: &MatchRequest<'_>) -> MatchResult {
        if !self.enabled {
            return MatchResult::disabled();
        }

        let host = request.host.trim();
        let ip = parse_host(host);
        let domain = normalize_host(host);

        self.rules
            .iter()
            .filter(|rule| rule.enabled)
            .find(|rule| rule.matches(request, domain.as_deref(), ip))
            .map(|rule| MatchResult::new(rule.action.clone(), rule.name.as_str()))
            .unwrap_or_else(|| MatchResult::fallback(self.default_action.clone()))
    }

    /// Rules in the order they are evaluated, disabled ones included.
    pub fn effective_rules(&self) -> impl Iterator<Item = RuleSummary<'_>> {
        self.rules.iter().map(|rule| RuleSummary {
            name: &rule.name,
            enabled: rule.enabled,
            action: &rule.action,
            priority: rule.priority,
        })
    }

    /// Whether routing is switched on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The ordering mode the engine was built with.
    pub fn priority_mode(&self) -> PriorityMode {
        self.priority_mode
    }

    /// Action returned when no rule matches.
    pub fn default_action(&self) -> &Action {
        &self.default_action
    }

    /// Number of compiled rules, including disabled ones and the private rule.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl From<&RoutingConfig> for RuleEngine {
    fn from(config: &RoutingConfig) -> Self {
        Self::from_config(config)
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("enabled", &self.enabled)
            .field("priority_mode", &self.priority_mode)
            .field("rules", &self.rules.len())
            .field("default_action", &self.default_action)
            .finish()
    }
}

// ── Hot-reloadable engine ──

/// A hot-reloadable wrapper around `RuleEngine`.
///
/// Uses `ArcSwap` for lock-free reads and atomic replacement. A match
/// that has already loaded a snapshot finishes against it even if a new
/// one is published meanwhile.
pub struct HotRuleEngine {
    inner: ArcSwap<RuleEngine>,
}

impl HotRuleEngine {
    /// Create a new hot-reloadable engine with the given initial engine.
    pub fn new(engine: RuleEngine) -> Self {
        Self {
            inner: ArcSwap::new(Arc::new(engine)),
        }
    }

    /// Compile a config and wrap it.
    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(RuleEngine::from_config(config))
    }

    /// Match a request against the current rules.
    pub fn match_request(&self, request: &MatchRequest<'_>) -> MatchResult {
        self.inner.load().match_request(request)
    }

    /// Atomically replace the engine with a new one.
    pub fn update(&self, engine: RuleEngine) {
        info!(
            rules = engine.rule_count(),
            enabled = engine.is_enabled(),
            mode = %engine.priority_mode(),
            "publishing routing snapshot"
        );
        self.inner.store(Arc::new(engine));
    }

    /// Compile a config and publish it.
    pub fn publish(&self, config: &RoutingConfig) {
        self.update(RuleEngine::from_config(config));
    }

    /// The engine currently published.
    pub fn snapshot(&self) -> Arc<RuleEngine> {
        self.inner.load_full()
    }

    /// Number of rules in the current engine.
    pub fn rule_count(&self) -> usize {
        self.inner.load().rule_count()
    }
}

impl std::fmt::Debug for HotRuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotRuleEngine")
            .field("inner", &*self.inner.load())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req<'a>(host: &'a str, port: u16, protocol: &'a str) -> MatchRequest<'a> {
        MatchRequest::new(host, port, protocol)
    }

    fn routing(rules: Vec<Rule>) -> RoutingConfig {
        RoutingConfig {
            use_default_private: false,
            rules,
            ..RoutingConfig::default()
        }
    }

    #[test]
    fn disabled_routing_short_circuits() {
        let cfg = RoutingConfig {
            enabled: false,
            default_action: Action::Block,
            rules: vec![Rule {
                domains: vec!["*".into()],
                action: Some(Action::Direct),
                ..Rule::new("catch-all")
            }],
            ..RoutingConfig::default()
        };
        let result = evaluate(&cfg, &req("example.com", 443, "tcp"));
        assert_eq!(result, MatchResult::new(Action::Proxy, "(disabled)"));
        assert_eq!(
            RuleEngine::from_config(&cfg).match_request(&req("10.0.0.1", 22, "udp")),
            MatchResult::disabled()
        );
    }

    #[test]
    fn no_match_returns_default() {
        let cfg = RoutingConfig {
            default_action: Action::Direct,
            ..routing(vec![])
        };
        assert_eq!(
            evaluate(&cfg, &req("example.org", 443, "tcp")),
            MatchResult::new(Action::Direct, "(default)")
        );
    }

    #[test]
    fn private_rule_routes_lan_direct() {
        let cfg = RoutingConfig::default();
        assert_eq!(
            evaluate(&cfg, &req("192.168.1.1", 0, "tcp")),
            MatchResult::new(Action::Direct, "default-private")
        );
        assert_eq!(
            evaluate(&cfg, &req("fe80::1", 443, "tcp")),
            MatchResult::new(Action::Direct, "default-private")
        );
        assert_eq!(
            evaluate(&cfg, &req("8.8.8.8", 53, "tcp")),
            MatchResult::new(Action::Proxy, "(default)")
        );
    }

    #[test]
    fn private_rule_is_tcp_only() {
        let cfg = RoutingConfig::default();
        assert_eq!(
            evaluate(&cfg, &req("192.168.1.1", 53, "udp")),
            MatchResult::fallback(Action::Proxy)
        );
    }

    #[test]
    fn rule_without_action_inherits_default() {
        let cfg = RoutingConfig {
            default_action: Action::Block,
            ..routing(vec![Rule {
                domains: vec!["ads.example.com".into()],
                ..Rule::new("ads")
            }])
        };
        assert_eq!(
            evaluate(&cfg, &req("ads.example.com", 80, "tcp")),
            MatchResult::new(Action::Block, "ads")
        );
    }

    #[test]
    fn disabled_rule_is_skipped() {
        let cfg = routing(vec![
            Rule {
                enabled: false,
                domains: vec![".example.com".into()],
                action: Some(Action::Block),
                ..Rule::new("off")
            },
            Rule {
                domains: vec![".example.com".into()],
                action: Some(Action::Direct),
                ..Rule::new("on")
            },
        ]);
        assert_eq!(
            evaluate(&cfg, &req("www.example.com", 443, "tcp")),
            MatchResult::new(Action::Direct, "on")
        );
    }

    #[test]
    fn protocol_and_port_gate_the_rule() {
        let cfg = routing(vec![Rule {
            domains: vec![".example.com".into()],
            ports: vec!["443".into()],
            protocols: vec!["tcp".into()],
            action: Some(Action::Direct),
            ..Rule::new("web")
        }]);
        assert_eq!(
            evaluate(&cfg, &req("example.com", 443, "TCP")).rule,
            "web"
        );
        assert_eq!(
            evaluate(&cfg, &req("example.com", 443, "udp")).rule,
            "(default)"
        );
        assert_eq!(
            evaluate(&cfg, &req("example.com", 80, "tcp")).rule,
            "(default)"
        );
    }

    #[test]
    fn domain_and_cidr_are_alternatives() {
        let cfg = routing(vec![Rule {
            domains: vec![".lan".into()],
            ip_cidrs_v4: vec!["10.0.0.0/8".into()],
            ip_cidrs_v6: vec!["fd00::/8".into()],
            action: Some(Action::Direct),
            ..Rule::new("lan")
        }]);
        for host in ["nas.lan", "10.1.2.3", "fd00::42"] {
            assert_eq!(evaluate(&cfg, &req(host, 443, "tcp")).rule, "lan", "{host}");
        }
        assert_eq!(evaluate(&cfg, &req("11.0.0.1", 443, "tcp")).rule, "(default)");
    }

    #[test]
    fn ip_literal_host_is_offered_to_domain_patterns() {
        let cfg = routing(vec![Rule {
            domains: vec!["10.0.0.1".into()],
            action: Some(Action::Block),
            ..Rule::new("literal")
        }]);
        assert_eq!(evaluate(&cfg, &req("10.0.0.1", 80, "tcp")).rule, "literal");
    }

    #[test]
    fn bad_entries_do_not_disable_rule() {
        let cfg = routing(vec![Rule {
            ip_cidrs_v4: vec!["10.0.0.0/99".into(), "192.168.0.0/16".into()],
            ports: vec!["http".into(), "80".into()],
            action: Some(Action::Direct),
            ..Rule::new("typo")
        }]);
        assert_eq!(evaluate(&cfg, &req("192.168.5.5", 80, "tcp")).rule, "typo");
        assert_eq!(evaluate(&cfg, &req("192.168.5.5", 81, "tcp")).rule, "(default)");
    }

    #[test]
    fn rule_with_only_bad_cidrs_never_matches() {
        let cfg = routing(vec![Rule {
            ip_cidrs_v4: vec!["not-a-cidr".into()],
            action: Some(Action::Block),
            ..Rule::new("broken")
        }]);
        assert_eq!(evaluate(&cfg, &req("1.2.3.4", 80, "tcp")).rule, "(default)");
        assert_eq!(evaluate(&cfg, &req("example.com", 80, "tcp")).rule, "(default)");
    }

    #[test]
    fn rule_without_targets_never_matches() {
        let cfg = RoutingConfig {
            default_action: Action::Direct,
            ..routing(vec![
                Rule {
                    action: Some(Action::Block),
                    protocols: vec!["tcp".into()],
                    ..Rule::new("new-rule")
                },
                Rule {
                    ports: vec!["22".into()],
                    domains: vec![" ".into()],
                    action: Some(Action::Block),
                    ..Rule::new("blank-domain")
                },
            ])
        };
        assert_eq!(
            evaluate(&cfg, &req("example.org", 443, "tcp")),
            MatchResult::new(Action::Direct, "(default)")
        );
        assert_eq!(
            evaluate(&cfg, &req("10.0.0.1", 22, "tcp")),
            MatchResult::new(Action::Direct, "(default)")
        );
    }

    #[test]
    fn host_is_trimmed_before_parsing() {
        let cfg = RoutingConfig::default();
        assert_eq!(
            evaluate(&cfg, &req(" 127.0.0.1 ", 80, "tcp")).rule,
            "default-private"
        );
    }

    #[test]
    fn effective_rules_report_resolved_actions() {
        let cfg = RoutingConfig {
            priority_mode: PriorityMode::Number,
            default_action: Action::Block,
            rules: vec![
                Rule {
                    priority: 5,
                    ..Rule::new("inherit")
                },
                Rule {
                    priority: 5000,
                    action: Some(Action::Proxy),
                    ..Rule::new("top")
                },
            ],
            ..RoutingConfig::default()
        };
        let engine = RuleEngine::from_config(&cfg);
        let listed: Vec<_> = engine
            .effective_rules()
            .map(|r| (r.name, r.action.clone(), r.priority))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("top", Action::Proxy, 5000),
                ("default-private", Action::Direct, 1000),
                ("inherit", Action::Block, 5),
            ]
        );
    }

    #[test]
    fn engine_matches_evaluate() {
        let cfg = RoutingConfig {
            rules: vec![Rule {
                domains: vec!["*.corp.example.com".into()],
                protocols: vec!["tcp".into()],
                action: Some(Action::Direct),
                ..Rule::new("corp")
            }],
            ..RoutingConfig::default()
        };
        let engine = RuleEngine::from_config(&cfg);
        for (host, port, proto) in [
            ("api.corp.example.com", 443, "tcp"),
            ("example.org", 443, "tcp"),
            ("10.0.0.1", 0, "tcp"),
            ("api.corp.example.com", 443, "udp"),
        ] {
            let r = req(host, port, proto);
            assert_eq!(engine.match_request(&r), evaluate(&cfg, &r));
        }
    }

    #[test]
    fn engine_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleEngine>();
        assert_send_sync::<HotRuleEngine>();
    }

    #[test]
    fn hot_engine_publishes_new_snapshot() {
        let hot = HotRuleEngine::from_config(&RoutingConfig::default());
        let before = hot.snapshot();
        assert_eq!(hot.match_request(&req("10.0.0.1", 80, "tcp")).rule, "default-private");

        hot.publish(&RoutingConfig {
            enabled: false,
            ..RoutingConfig::default()
        });
        assert_eq!(hot.match_request(&req("10.0.0.1", 80, "tcp")), MatchResult::disabled());

        // a snapshot taken earlier keeps its own rules
        assert_eq!(
            before.match_request(&req("10.0.0.1", 80, "tcp")).rule,
            "default-private"
        );
    }
}
