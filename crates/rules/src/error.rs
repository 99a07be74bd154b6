//! Error types produced while compiling a rule set.
//!
//! Rule errors are configuration-time failures. They surface when a
//! [`RuleSetDefinition`](crate::RuleSetDefinition) is compiled into a
//! [`RuleSet`](crate::RuleSet), never while records are being validated, so a
//! batch either starts with a usable rule set or does not start at all.
//!
//! ```rust
//! use rules::{PatternDefinition, RuleError, RuleSet, RuleSetDefinition};
//!
//! let definition = RuleSetDefinition {
//!     range_patterns: vec![PatternDefinition::Template("from <amount>".into())],
//!     ..Default::default()
//! };
//!
//! match RuleSet::compile(definition) {
//!     Err(RuleError::UnknownPlaceholder { placeholder, .. }) => assert_eq!(placeholder, "amount"),
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! ```
use thiserror::Error;

use crate::definition::Bound;

/// Errors that can occur when compiling a rule set definition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RuleError {
    /// A template declares no `<num>` slot, so it can never yield an amount.
    #[error("pattern {pattern:?} has no <num> placeholder")]
    MissingNumber { pattern: String },

    /// A template declares more numbers than a min/max pair can hold.
    #[error("pattern {pattern:?} has {count} <num> placeholders; at most two are allowed")]
    TooManyNumbers { pattern: String, count: usize },

    #[error("pattern {pattern:?} has more than one <currency> placeholder")]
    DuplicateCurrency { pattern: String },

    #[error("pattern {pattern:?} uses unknown placeholder <{placeholder}>")]
    UnknownPlaceholder { pattern: String, placeholder: String },

    #[error("pattern {pattern:?} has an unterminated placeholder")]
    UnclosedPlaceholder { pattern: String },

    /// The declared bound does not fit the number of `<num>` slots.
    #[error("pattern {pattern:?} declares bound `{bound}` but has {count} <num> placeholder(s)")]
    BoundMismatch {
        pattern: String,
        bound: Bound,
        count: usize,
    },

    #[error("pattern {pattern:?} uses <currency> but the rule set defines no currencies")]
    NoCurrencies { pattern: String },

    #[error("experience pattern {pattern:?} cannot use <currency>")]
    CurrencyInExperience { pattern: String },

    /// The generated expression was rejected by the regex engine.
    #[error("pattern {pattern:?} compiled to an invalid expression: {message}")]
    InvalidExpression { pattern: String, message: String },

    #[error("currency {code:?} has an empty code or alias")]
    EmptyAlias { code: String },

    #[error("seniority level {level:?} has an inverted years hint ({min} > {max})")]
    InvertedYearsHint { level: String, min: u8, max: u8 },
}
