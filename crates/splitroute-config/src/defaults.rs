//! Default value functions for serde deserialization.
//!
//! These functions forward to constants defined in `splitroute_core::defaults`.

use splitroute_core::defaults;

/// Generate default value functions that forward to splitroute_core::defaults constants.
macro_rules! default_fns {
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                defaults::$const_name
            }
        )*
    };
}

default_fns! {
    default_routing_enabled => DEFAULT_ROUTING_ENABLED: bool,
    default_use_private     => DEFAULT_USE_PRIVATE: bool,
    default_rule_enabled    => DEFAULT_RULE_ENABLED: bool,
    default_rule_priority   => DEFAULT_RULE_PRIORITY: i64,
}

/// Protocols assumed when a rule omits the `protocols` field.
pub(crate) fn default_rule_protocols() -> Vec<String> {
    defaults::DEFAULT_RULE_PROTOCOLS
        .iter()
        .map(|p| p.to_string())
        .collect()
}

/// Generated name for the rule at `index` (zero-based).
pub(crate) fn default_rule_name(index: usize) -> String {
    format!("{}{}", defaults::DEFAULT_RULE_NAME_PREFIX, index + 1)
}
