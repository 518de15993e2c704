//! Error types for the rule evaluator.
//!
//! None of these abort an evaluation. A failed parse only removes the
//! offending entry from the rule it belongs to.

use thiserror::Error;

/// Errors produced at the parse boundaries of the evaluator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid CIDR: {0}")]
    InvalidCidr(String),

    #[error("invalid port token: {0}")]
    InvalidPortToken(String),
}
