//! # Listing Rules
//!
//! Static recognition rules for the job-listing normalizer: currency tables,
//! salary and experience text patterns, pay periods, negotiability keywords
//! and seniority keyword groups.
//!
//! Rules are authored as a serializable [`RuleSetDefinition`] (usually loaded
//! from YAML by the caller) and compiled once into an immutable [`RuleSet`].
//! Compilation validates every template up front and reports problems as
//! [`RuleError`]; a compiled rule set never fails at lookup time.
//!
//! ## Pattern templates
//!
//! | Token | Matches |
//! |-------|---------|
//! | `<num>` | `15000`, `15,000`, `15000.50`, `15k` |
//! | `<currency>` | any code or alias from `currencies`, canonicalized to the code |
//! | whitespace | any whitespace run, including none |
//! | `-` | hyphen, en dash or em dash |
//!
//! Patterns are tried in declared order and the first match wins.
//!
//! ```rust
//! use rules::RuleSet;
//!
//! let rules = RuleSet::standard();
//! let salary = rules.match_salary("15,000 - 20,000 AED").expect("salary");
//! assert_eq!(salary.min, Some(15000.0));
//! assert_eq!(salary.max, Some(20000.0));
//! assert_eq!(salary.currency.as_deref(), Some("AED"));
//! ```
mod definition;
mod error;
mod pattern;
mod ruleset;

pub use definition::{
    Bound, DetectionStrategy, OrderedTable, PatternDefinition, RuleSetDefinition,
    SeniorityDefinition, YearsHint,
};
pub use error::RuleError;
pub use pattern::{CompiledPattern, parse_amount};
pub use ruleset::{PatternMatch, RuleSet, standard_definition};
