//! Command implementations for the `splitroute` binary.

use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};

use clap::Args;
use splitroute_config::{
    AppDocument, ConfigError, LoggingConfig, RoutingSection, RoutingWarning, lint_routing,
    load_document,
};
use splitroute_rules::{MatchRequest, MatchResult, PriorityMode, RoutingConfig, RuleEngine};
use tracing::{debug, warn};
use tracing_subscriber::{
    EnvFilter, fmt, fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt,
};

type CliResult = Result<(), Box<dyn Error>>;

/// Arguments for `splitroute match`.
#[derive(Args, Debug, Clone)]
pub struct MatchArgs {
    /// Config file path (json/jsonc/yaml/toml).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Destination domain name or IP literal.
    #[arg(long)]
    pub host: String,

    /// Destination port; 0 means unknown.
    #[arg(long, default_value_t = 0)]
    pub port: u16,

    /// Transport protocol.
    #[arg(long, default_value = "tcp")]
    pub proto: String,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `splitroute rules`.
#[derive(Args, Debug, Clone)]
pub struct RulesArgs {
    /// Config file path (json/jsonc/yaml/toml).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,
}

/// Arguments for `splitroute check`.
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Config file path (json/jsonc/yaml/toml).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Fail when any lint warning is reported.
    #[arg(long)]
    pub strict: bool,
}

/// A config file with the parts the commands need.
pub struct Loaded {
    path: PathBuf,
    doc: AppDocument,
    section: RoutingSection,
}

impl Loaded {
    /// Read and parse a config file without touching global state.
    pub fn open(path: &Path) -> Result<Self, ConfigError> {
        let doc = load_document(path)?;
        let section = doc.routing_or_default();
        Ok(Self {
            path: path.to_path_buf(),
            doc,
            section,
        })
    }

    /// Resolved routing config.
    pub fn routing(&self) -> RoutingConfig {
        self.section.resolve()
    }

    /// Lint findings for the routing section.
    pub fn warnings(&self) -> Vec<RoutingWarning> {
        lint_routing(&self.section)
    }

    fn init_tracing(&self, log_level: Option<&str>) {
        let mut logging = self.doc.effective_logging();
        if let Some(level) = log_level {
            logging.level = Some(level.to_string());
        }
        init_tracing(&logging);
        if self.doc.routing().is_none() {
            debug!(path = %self.path.display(), "no proxy_rules.routing section, using defaults");
        }
    }
}

fn log_warnings(warnings: &[RoutingWarning]) {
    for w in warnings {
        warn!(rule = w.rule.as_deref().unwrap_or("-"), "{}", w.message);
    }
}

/// Route the destination named by `args` against a loaded config.
pub fn match_destination(loaded: &Loaded, args: &MatchArgs) -> MatchResult {
    RuleEngine::from_config(&loaded.routing())
        .match_request(&MatchRequest::new(&args.host, args.port, &args.proto))
}

/// Route one destination and print the decision.
pub fn run_match(args: MatchArgs, log_level: Option<&str>) -> CliResult {
    let loaded = Loaded::open(&args.config)?;
    loaded.init_tracing(log_level);
    log_warnings(&loaded.warnings());

    let result = match_destination(&loaded, &args);
    if args.json {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        println!("{result}");
    }
    Ok(())
}

/// Print the effective rule order.
pub fn run_rules(args: RulesArgs, log_level: Option<&str>) -> CliResult {
    let loaded = Loaded::open(&args.config)?;
    loaded.init_tracing(log_level);
    log_warnings(&loaded.warnings());

    print!("{}", RuleListing(&RuleEngine::from_config(&loaded.routing())));
    Ok(())
}

/// Load, resolve and lint a config file.
///
/// In strict mode a missing routing section or any lint finding fails.
pub fn run_check(args: CheckArgs, log_level: Option<&str>) -> CliResult {
    let loaded = Loaded::open(&args.config)?;
    loaded.init_tracing(log_level);

    if args.strict && loaded.doc.routing().is_none() {
        return Err(ConfigError::MissingRouting(args.config.display().to_string()).into());
    }

    let warnings = loaded.warnings();
    for w in &warnings {
        println!("warning: {w}");
    }
    println!(
        "{}: {} rule(s), {} warning(s)",
        args.config.display(),
        loaded.section.rules.len(),
        warnings.len()
    );

    if args.strict && !warnings.is_empty() {
        return Err(format!("{} lint warning(s) in strict mode", warnings.len()).into());
    }
    Ok(())
}

/// Human-readable listing of the evaluation order.
pub struct RuleListing<'a>(pub &'a RuleEngine);

impl std::fmt::Display for RuleListing<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let engine = self.0;
        if !engine.is_enabled() {
            writeln!(f, "routing disabled: every connection is proxied")?;
        }

        let mode_hint = match engine.priority_mode() {
            PriorityMode::Order => "list order is evaluation order",
            PriorityMode::Number => "higher priority first, ties keep list order",
        };
        writeln!(f, "priority_mode={} ({mode_hint})", engine.priority_mode())?;

        for (i, rule) in engine.effective_rules().enumerate() {
            writeln!(
                f,
                "{:>3}. {}{} action={} priority={}",
                i + 1,
                rule.name,
                if rule.enabled { "" } else { " [disabled]" },
                rule.action,
                rule.priority
            )?;
        }
        writeln!(f, "  -. (default) action={}", engine.default_action())
    }
}

fn init_tracing(config: &LoggingConfig) {
    let base_level = config.level.as_deref().unwrap_or("info");
    let mut filter_str = base_level.to_string();

    for (module, level) in &config.filters {
        filter_str.push(',');
        filter_str.push_str(module);
        filter_str.push('=');
        filter_str.push_str(level);
    }

    let filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new("info"));

    let writer = match config.output.as_deref() {
        Some("stdout") => BoxMakeWriter::new(io::stdout),
        _ => BoxMakeWriter::new(io::stderr),
    };

    // a subscriber may already be installed when commands run in-process
    let registry = tracing_subscriber::registry().with(filter);
    let _ = match config.format.as_deref().unwrap_or("pretty") {
        "json" => registry.with(fmt::layer().json().with_writer(writer)).try_init(),
        "compact" => registry.with(fmt::layer().compact().with_writer(writer)).try_init(),
        _ => registry.with(fmt::layer().with_writer(writer)).try_init(),
    };
}
