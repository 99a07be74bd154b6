//! Template compiler for the salary and experience pattern language.
//!
//! A template such as `"<num> - <num> <currency>"` is translated into a
//! case-insensitive, unanchored regular expression. Placeholders become capture
//! groups; whitespace becomes an optional whitespace run; `-` accepts hyphen,
//! en dash and em dash. Literals that start with a letter or digit are
//! anchored on a word boundary so `"to"` never matches inside `"toronto"`.
use regex::Regex;

use crate::definition::Bound;
use crate::error::RuleError;

const NUMBER_GROUP: &str = r"(\d[\d,]*(?:\.\d+)?(?:\s?k\b)?)";
const DASH_CLASS: &str = "[-\u{2013}\u{2014}]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Number,
    Currency,
}

#[derive(Debug, PartialEq, Eq)]
enum Piece<'a> {
    Literal(&'a str),
    Space,
    Placeholder(&'a str),
}

/// A compiled template ready to be searched.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    template: String,
    regex: Regex,
    bound: Bound,
    slots: Vec<Slot>,
}

/// Numbers and currency token captured by one successful search.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Capture<'t> {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<&'t str>,
    pub matched: &'t str,
}

impl CompiledPattern {
    /// Compiles `template`. `currency_alternation` is the escaped alias
    /// alternation of the owning rule set, or `None` when no currency
    /// placeholder is permitted.
    pub(crate) fn compile(
        template: &str,
        bound: Option<Bound>,
        currency_alternation: Option<&str>,
        allow_currency: bool,
    ) -> Result<Self, RuleError> {
        let pieces = split_template(template)?;

        let mut slots = Vec::new();
        for piece in &pieces {
            if let Piece::Placeholder(name) = piece {
                match *name {
                    "num" => slots.push(Slot::Number),
                    "currency" => slots.push(Slot::Currency),
                    other => {
                        return Err(RuleError::UnknownPlaceholder {
                            pattern: template.to_string(),
                            placeholder: other.to_string(),
                        });
                    }
                }
            }
        }

        let numbers = slots.iter().filter(|slot| **slot == Slot::Number).count();
        let currencies = slots.len() - numbers;
        if numbers == 0 {
            return Err(RuleError::MissingNumber {
                pattern: template.to_string(),
            });
        }
        if numbers > 2 {
            return Err(RuleError::TooManyNumbers {
                pattern: template.to_string(),
                count: numbers,
            });
        }
        if currencies > 1 {
            return Err(RuleError::DuplicateCurrency {
                pattern: template.to_string(),
            });
        }
        if currencies == 1 && !allow_currency {
            return Err(RuleError::CurrencyInExperience {
                pattern: template.to_string(),
            });
        }

        let bound = bound.unwrap_or(if numbers == 2 {
            Bound::Range
        } else {
            Bound::Exact
        });
        let expected = if bound == Bound::Range { 2 } else { 1 };
        if numbers != expected {
            return Err(RuleError::BoundMismatch {
                pattern: template.to_string(),
                bound,
                count: numbers,
            });
        }

        let alternation = match (currencies, currency_alternation) {
            (0, _) => None,
            (_, Some(alternation)) => Some(alternation),
            (_, None) => {
                return Err(RuleError::NoCurrencies {
                    pattern: template.to_string(),
                });
            }
        };

        let source = build_expression(&pieces, alternation);
        let regex = Regex::new(&source).map_err(|err| RuleError::InvalidExpression {
            pattern: template.to_string(),
            message: err.to_string(),
        })?;

        Ok(Self {
            template: template.to_string(),
            regex,
            bound,
            slots,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn bound(&self) -> Bound {
        self.bound
    }

    pub fn has_currency(&self) -> bool {
        self.slots.contains(&Slot::Currency)
    }

    /// Searches `text` and returns the first capture whose numbers parse and
    /// whose currency word, if any, stands on its own.
    ///
    /// A candidate whose currency sits inside a longer word is skipped and the
    /// search resumes right after that word fragment.
    pub(crate) fn search<'t>(&self, text: &'t str) -> Option<Capture<'t>> {
        let mut at = 0;
        while let Some(caps) = self.regex.captures_at(text, at) {
            let whole = caps.get(0)?;
            at = whole.end();

            let mut numbers = Vec::with_capacity(2);
            let mut currency = None;
            let mut parsed = true;
            for (index, slot) in self.slots.iter().enumerate() {
                let Some(group) = caps.get(index + 1) else {
                    parsed = false;
                    break;
                };
                match slot {
                    Slot::Number => match parse_amount(group.as_str()) {
                        Some(value) => numbers.push(value),
                        None => {
                            parsed = false;
                            break;
                        }
                    },
                    Slot::Currency => {
                        if !stands_alone(text, group.start(), group.end()) {
                            at = group.end();
                            parsed = false;
                            break;
                        }
                        currency = Some(group.as_str());
                    }
                }
            }
            if !parsed {
                continue;
            }

            let (min, max) = match (self.bound, numbers.as_slice()) {
                (Bound::Range, [low, high]) => (Some(*low), Some(*high)),
                (Bound::Min, [value]) => (Some(*value), None),
                (Bound::Max, [value]) => (None, Some(*value)),
                (Bound::Exact, [value]) => (Some(*value), Some(*value)),
                _ => continue,
            };
            let matched = whole.as_str();
            return Some(Capture {
                min,
                max,
                currency,
                matched,
            });
        }
        None
    }
}

/// Word aliases (letters and spaces only) must not touch a letter on either
/// side, so `le` is never read out of `learning`. Symbol aliases match anywhere.
fn stands_alone(text: &str, start: usize, end: usize) -> bool {
    let token = &text[start..end];
    if !token.chars().all(|c| c.is_alphabetic() || c.is_whitespace()) {
        return true;
    }
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphabetic) && !after.is_some_and(char::is_alphabetic)
}

/// Parses a locale-neutral amount: `15,000`, `15000.50`, `15k`, `2.5 K`.
pub fn parse_amount(token: &str) -> Option<f64> {
    let lowered = token.trim().to_ascii_lowercase();
    let (digits, multiplier) = match lowered.strip_suffix('k') {
        Some(rest) => (rest.trim_end(), 1000.0),
        None => (lowered.as_str(), 1.0),
    };
    let cleaned: String = digits.chars().filter(|ch| *ch != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    let value = cleaned.parse::<f64>().ok()? * multiplier;
    value.is_finite().then_some(value)
}

fn split_template(template: &str) -> Result<Vec<Piece<'_>>, RuleError> {
    let mut pieces = Vec::new();
    let mut rest = template;
    while let Some(ch) = rest.chars().next() {
        if ch == '<' {
            let close = rest.find('>').ok_or_else(|| RuleError::UnclosedPlaceholder {
                pattern: template.to_string(),
            })?;
            pieces.push(Piece::Placeholder(rest[1..close].trim()));
            rest = &rest[close + 1..];
        } else if ch.is_whitespace() {
            let end = rest
                .find(|c: char| !c.is_whitespace())
                .unwrap_or(rest.len());
            pieces.push(Piece::Space);
            rest = &rest[end..];
        } else {
            let end = rest
                .find(|c: char| c == '<' || c.is_whitespace())
                .unwrap_or(rest.len());
            pieces.push(Piece::Literal(&rest[..end]));
            rest = &rest[end..];
        }
    }
    Ok(pieces)
}

fn build_expression(pieces: &[Piece<'_>], currency_alternation: Option<&str>) -> String {
    let mut expression = String::from("(?i)");
    for piece in pieces {
        match piece {
            Piece::Space => expression.push_str(r"\s*"),
            Piece::Placeholder("num") => expression.push_str(NUMBER_GROUP),
            Piece::Placeholder(_) => {
                expression.push('(');
                expression.push_str(currency_alternation.unwrap_or_default());
                expression.push(')');
            }
            Piece::Literal(literal) => {
                if literal.starts_with(|c: char| c.is_alphanumeric()) {
                    expression.push_str(r"\b");
                }
                for ch in literal.chars() {
                    if ch == '-' {
                        expression.push_str(DASH_CLASS);
                    } else {
                        let mut buf = [0u8; 4];
                        expression.push_str(&regex::escape(ch.encode_utf8(&mut buf)));
                    }
                }
            }
        }
    }
    expression
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(template: &str, bound: Option<Bound>) -> Result<CompiledPattern, RuleError> {
        CompiledPattern::compile(template, bound, Some("aed|egp|\\$"), true)
    }

    #[test]
    fn parse_amount_handles_grouping_decimals_and_thousands() {
        assert_eq!(parse_amount("15,000"), Some(15000.0));
        assert_eq!(parse_amount("15000.50"), Some(15000.5));
        assert_eq!(parse_amount("15k"), Some(15000.0));
        assert_eq!(parse_amount("2.5 K"), Some(2500.0));
        assert_eq!(parse_amount(",,"), None);
        assert_eq!(parse_amount("k"), None);
    }

    #[test]
    fn splits_templates_into_pieces() {
        let pieces = split_template("from <num>  <currency>").expect("split");
        assert_eq!(
            pieces,
            vec![
                Piece::Literal("from"),
                Piece::Space,
                Piece::Placeholder("num"),
                Piece::Space,
                Piece::Placeholder("currency"),
            ]
        );
    }

    #[test]
    fn range_template_captures_both_bounds_and_currency() {
        let pattern = compile("<num> - <num> <currency>", None).expect("compile");
        let capture = pattern
            .search("Salary: 15,000 \u{2013} 20,000 AED monthly")
            .expect("match");
        assert_eq!(capture.min, Some(15000.0));
        assert_eq!(capture.max, Some(20000.0));
        assert_eq!(capture.currency, Some("AED"));
    }

    #[test]
    fn whitespace_in_template_is_optional() {
        let pattern = compile("<num> - <num>", None).expect("compile");
        let capture = pattern.search("5000-7000").expect("match");
        assert_eq!((capture.min, capture.max), (Some(5000.0), Some(7000.0)));
    }

    #[test]
    fn word_literals_respect_boundaries() {
        let pattern = compile("to <num>", Some(Bound::Max)).expect("compile");
        assert!(pattern.search("toronto 5000").is_none());
        let capture = pattern.search("up to 5000").expect("match");
        assert_eq!((capture.min, capture.max), (None, Some(5000.0)));
    }

    #[test]
    fn currency_words_must_stand_alone() {
        let pattern = CompiledPattern::compile("<num> <currency>", None, Some("dh|le|\\$"), true)
            .expect("compile");
        assert!(pattern.search("2 learning days").is_none());
        assert!(pattern.search("5000 dhabi allowance").is_none());

        let capture = pattern.search("2 learning days, 5000 LE").expect("match");
        assert_eq!(capture.min, Some(5000.0));
        assert_eq!(capture.currency, Some("LE"));
        assert_eq!(pattern.search("900$ bonus").and_then(|c| c.currency), Some("$"));
    }

    #[test]
    fn single_number_defaults_to_exact() {
        let pattern = compile("<num> <currency>", None).expect("compile");
        assert_eq!(pattern.bound(), Bound::Exact);
        let capture = pattern.search("about 9000 EGP").expect("match");
        assert_eq!((capture.min, capture.max), (Some(9000.0), Some(9000.0)));
    }

    #[test]
    fn compile_rejects_malformed_templates() {
        assert!(matches!(
            compile("negotiable", None),
            Err(RuleError::MissingNumber { .. })
        ));
        assert!(matches!(
            compile("<num> <num> <num>", None),
            Err(RuleError::TooManyNumbers { count: 3, .. })
        ));
        assert!(matches!(
            compile("<currency> <num> <currency>", None),
            Err(RuleError::DuplicateCurrency { .. })
        ));
        assert!(matches!(
            compile("<num> - <num>", Some(Bound::Min)),
            Err(RuleError::BoundMismatch { count: 2, .. })
        ));
        assert!(matches!(
            compile("<num", None),
            Err(RuleError::UnclosedPlaceholder { .. })
        ));
        assert!(matches!(
            CompiledPattern::compile("<num> <currency>", None, None, true),
            Err(RuleError::NoCurrencies { .. })
        ));
        assert!(matches!(
            CompiledPattern::compile("<num> <currency>", None, Some("aed"), false),
            Err(RuleError::CurrencyInExperience { .. })
        ));
    }
}
