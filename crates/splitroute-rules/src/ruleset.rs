//! Effective rule set construction.

use std::borrow::Cow;
use std::cmp::Reverse;

use crate::rule::{PriorityMode, Rule, RoutingConfig};

/// Build the ordered list of rules actually consulted during evaluation.
///
/// The built-in private rule, when enabled, is placed first *before*
/// ordering, so in `number` mode it wins ties against user rules of the
/// same priority. The sort is stable; equal priorities keep list order.
pub fn build_effective_rules(config: &RoutingConfig) -> Vec<Cow<'_, Rule>> {
    let mut rules = Vec::with_capacity(config.rules.len() + 1);
    if config.use_default_private {
        rules.push(Cow::Owned(Rule::default_private()));
    }
    rules.extend(config.rules.iter().map(Cow::Borrowed));

    if config.priority_mode == PriorityMode::Number {
        rules.sort_by_key(|rule| Reverse(rule.priority));
    }
    rules
}
