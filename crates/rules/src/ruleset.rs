//! Compiled, immutable rule set.
//!
//! A [`RuleSet`] is built once from a [`RuleSetDefinition`] and then shared
//! read-only (typically behind an `Arc`) by every worker validating records.
//! All lookups are case-insensitive. An empty rule set is valid and simply
//! recognizes nothing.
use std::collections::HashMap;

use regex::Regex;

use crate::definition::{
    Bound, DetectionStrategy, PatternDefinition, RuleSetDefinition, SeniorityDefinition,
    YearsHint,
};
use crate::error::RuleError;
use crate::pattern::CompiledPattern;

/// Result of a successful salary or experience pattern search.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    /// Position of the winning pattern in its declared list.
    pub pattern_index: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Canonical currency code, if the text named one.
    pub currency: Option<String>,
    /// The slice of the input the pattern matched.
    pub matched: String,
}

#[derive(Debug, Clone, Default)]
struct CurrencyTable {
    codes: Vec<String>,
    aliases: HashMap<String, usize>,
    alternation: Option<String>,
    scanner: Option<Regex>,
}

#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    definition: RuleSetDefinition,
    currencies: CurrencyTable,
    salary_patterns: Vec<CompiledPattern>,
    experience_patterns: Vec<CompiledPattern>,
    periods: Vec<(String, Vec<String>)>,
    negotiable: Vec<String>,
    strategy: DetectionStrategy,
    levels: Vec<(String, Vec<String>)>,
    years: Vec<(String, YearsHint)>,
}

impl RuleSet {
    /// A rule set that recognizes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn compile(definition: RuleSetDefinition) -> Result<Self, RuleError> {
        let currencies = compile_currencies(&definition)?;
        let alternation = currencies.alternation.as_deref();

        let salary_patterns = compile_patterns(&definition.range_patterns, alternation, true)?;
        let experience_patterns =
            compile_patterns(&definition.experience_patterns, alternation, false)?;

        let periods = definition
            .periods
            .iter()
            .map(|(label, keywords)| (label.to_string(), lowered(keywords)))
            .collect();
        let negotiable = lowered(&definition.negotiable_keywords);

        let SeniorityDefinition {
            detection_strategy,
            levels,
            years,
        } = &definition.seniority;
        let levels = levels
            .iter()
            .map(|(level, keywords)| (level.to_string(), lowered(keywords)))
            .collect();
        let mut hints = Vec::with_capacity(years.len());
        for (level, hint) in years.iter() {
            if let (Some(min), Some(max)) = (hint.min, hint.max) {
                if min > max {
                    return Err(RuleError::InvertedYearsHint {
                        level: level.to_string(),
                        min,
                        max,
                    });
                }
            }
            hints.push((level.to_string(), *hint));
        }

        Ok(Self {
            strategy: *detection_strategy,
            definition,
            currencies,
            salary_patterns,
            experience_patterns,
            periods,
            negotiable,
            levels,
            years: hints,
        })
    }

    /// The built-in rule set covering the Gulf and Egyptian job markets.
    ///
    /// # Panics
    ///
    /// Panics if [`standard_definition`] stops compiling; the
    /// `standard_rule_set_compiles` test guards against that.
    pub fn standard() -> Self {
        Self::compile(standard_definition()).expect("built-in rule set compiles")
    }

    pub fn definition(&self) -> &RuleSetDefinition {
        &self.definition
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.codes.is_empty()
            && self.salary_patterns.is_empty()
            && self.experience_patterns.is_empty()
            && self.periods.is_empty()
            && self.negotiable.is_empty()
            && self.levels.is_empty()
            && self.years.is_empty()
    }

    pub fn salary_pattern_count(&self) -> usize {
        self.salary_patterns.len()
    }

    pub fn experience_pattern_count(&self) -> usize {
        self.experience_patterns.len()
    }

    pub fn currency_codes(&self) -> impl Iterator<Item = &str> {
        self.currencies.codes.iter().map(String::as_str)
    }

    pub fn detection_strategy(&self) -> DetectionStrategy {
        self.strategy
    }

    /// First salary pattern, in declared order, that matches `text`.
    ///
    /// When the winning pattern carries no `<currency>` slot the whole text
    /// is scanned for a currency alias instead.
    pub fn match_salary(&self, text: &str) -> Option<PatternMatch> {
        self.salary_patterns
            .iter()
            .enumerate()
            .find_map(|(index, pattern)| {
                let capture = pattern.search(text)?;
                let currency = match capture.currency {
                    Some(token) => self.resolve_currency(token),
                    None => self.detect_currency(text),
                };
                Some(PatternMatch {
                    pattern_index: index,
                    min: capture.min,
                    max: capture.max,
                    currency: currency.map(str::to_string),
                    matched: capture.matched.to_string(),
                })
            })
    }

    pub fn match_experience(&self, text: &str) -> Option<PatternMatch> {
        self.experience_patterns
            .iter()
            .enumerate()
            .find_map(|(index, pattern)| {
                let capture = pattern.search(text)?;
                Some(PatternMatch {
                    pattern_index: index,
                    min: capture.min,
                    max: capture.max,
                    currency: None,
                    matched: capture.matched.to_string(),
                })
            })
    }

    /// Maps a code or alias to its canonical code.
    pub fn resolve_currency(&self, token: &str) -> Option<&str> {
        let key = alias_key(token);
        self.currencies
            .aliases
            .get(&key)
            .map(|index| self.currencies.codes[*index].as_str())
    }

    /// Earliest currency alias mentioned anywhere in `text`.
    pub fn detect_currency(&self, text: &str) -> Option<&str> {
        let scanner = self.currencies.scanner.as_ref()?;
        let caps = scanner.captures(text)?;
        let token = caps.get(1).or_else(|| caps.get(2))?;
        self.resolve_currency(token.as_str())
    }

    /// Canonical period label for the first period whose keyword occurs.
    pub fn detect_period(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.periods
            .iter()
            .find(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|keyword| find_keyword(&lowered, keyword).is_some())
            })
            .map(|(label, _)| label.as_str())
    }

    pub fn is_negotiable(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.negotiable
            .iter()
            .any(|keyword| find_keyword(&lowered, keyword).is_some())
    }

    /// Detects a seniority level name in `text` using the configured strategy.
    pub fn detect_seniority(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        match self.strategy {
            DetectionStrategy::FirstMatch => self
                .levels
                .iter()
                .find(|(_, keywords)| {
                    keywords
                        .iter()
                        .any(|keyword| find_keyword(&lowered, keyword).is_some())
                })
                .map(|(level, _)| level.as_str()),
            DetectionStrategy::LongestKeyword => {
                let mut best: Option<(&str, usize)> = None;
                for (level, keywords) in &self.levels {
                    for keyword in keywords {
                        if find_keyword(&lowered, keyword).is_none() {
                            continue;
                        }
                        let len = keyword.chars().count();
                        if best.is_none_or(|(_, current)| len > current) {
                            best = Some((level.as_str(), len));
                        }
                    }
                }
                best.map(|(level, _)| level)
            }
        }
    }

    pub fn seniority_years(&self, level: &str) -> Option<YearsHint> {
        self.years
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(level))
            .map(|(_, hint)| *hint)
    }
}

fn lowered(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|keyword| keyword.trim_start().to_lowercase())
        .filter(|keyword| !keyword.trim().is_empty())
        .collect()
}

/// Finds `keyword` in `haystack` (both lowercase). Alphanumeric edges of the
/// keyword must not touch alphanumeric characters of the haystack.
fn find_keyword(haystack: &str, keyword: &str) -> Option<usize> {
    let needs_start = keyword.starts_with(|c: char| c.is_alphanumeric());
    let needs_end = keyword.ends_with(|c: char| c.is_alphanumeric());
    haystack.match_indices(keyword).map(|(at, _)| at).find(|at| {
        let before_ok =
            !needs_start || !haystack[..*at].chars().next_back().is_some_and(char::is_alphanumeric);
        let after_ok = !needs_end
            || !haystack[at + keyword.len()..]
                .chars()
                .next()
                .is_some_and(char::is_alphanumeric);
        before_ok && after_ok
    })
}

fn compile_currencies(definition: &RuleSetDefinition) -> Result<CurrencyTable, RuleError> {
    let mut table = CurrencyTable::default();
    let mut words: Vec<String> = Vec::new();
    let mut symbols: Vec<String> = Vec::new();

    for (code, aliases) in definition.currencies.iter() {
        let canonical = code.trim().to_uppercase();
        if canonical.is_empty() {
            return Err(RuleError::EmptyAlias {
                code: code.to_string(),
            });
        }
        let index = table.codes.len();
        table.codes.push(canonical);

        for alias in std::iter::once(code).chain(aliases.iter().map(String::as_str)) {
            let key = alias_key(alias);
            if key.is_empty() {
                return Err(RuleError::EmptyAlias {
                    code: code.to_string(),
                });
            }
            if table.aliases.contains_key(&key) {
                continue;
            }
            table.aliases.insert(key.clone(), index);
            if key.chars().all(|c| c.is_alphabetic() || c.is_whitespace()) {
                words.push(key);
            } else {
                symbols.push(key);
            }
        }
    }

    if table.codes.is_empty() {
        return Ok(table);
    }

    let mut all: Vec<&String> = words.iter().chain(symbols.iter()).collect();
    all.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    table.alternation = Some(alternation(all.into_iter()));

    let mut parts = Vec::new();
    if !words.is_empty() {
        let mut sorted: Vec<&String> = words.iter().collect();
        sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        parts.push(format!(
            r"(?:^|[^\p{{L}}])({})(?:$|[^\p{{L}}])",
            alternation(sorted.into_iter())
        ));
    } else {
        parts.push("(\\z.)".to_string());
    }
    if !symbols.is_empty() {
        let mut sorted: Vec<&String> = symbols.iter().collect();
        sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        parts.push(format!("({})", alternation(sorted.into_iter())));
    }
    let source = format!("(?i){}", parts.join("|"));
    let scanner = Regex::new(&source).map_err(|err| RuleError::InvalidExpression {
        pattern: "<currency>".to_string(),
        message: err.to_string(),
    })?;
    table.scanner = Some(scanner);
    Ok(table)
}

fn alias_key(alias: &str) -> String {
    alias
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn alternation<'a>(aliases: impl Iterator<Item = &'a String>) -> String {
    aliases
        .map(|alias| regex::escape(alias).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|")
}

fn compile_patterns(
    definitions: &[PatternDefinition],
    alternation: Option<&str>,
    allow_currency: bool,
) -> Result<Vec<CompiledPattern>, RuleError> {
    definitions
        .iter()
        .map(|definition| {
            CompiledPattern::compile(
                definition.template(),
                definition.bound(),
                alternation,
                allow_currency,
            )
        })
        .collect()
}

/// Definition of the built-in rule set. `configs/rules.yml` mirrors it.
pub fn standard_definition() -> RuleSetDefinition {
    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    let currencies = [
        ("EGP", strings(&["le", "l.e.", "e£", "egyptian pound", "egyptian pounds"])),
        ("AED", strings(&["dhs", "dh", "dirham", "dirhams"])),
        ("SAR", strings(&["riyal", "riyals", "saudi riyal", "saudi riyals"])),
        ("KWD", strings(&["kd", "kuwaiti dinar", "kuwaiti dinars"])),
        ("USD", strings(&["$", "us$", "dollar", "dollars"])),
        ("EUR", strings(&["€", "euro", "euros"])),
    ]
    .into_iter()
    .collect();

    let range_patterns = vec![
        PatternDefinition::from("<currency> <num> - <num>"),
        PatternDefinition::from("<num> - <num> <currency>"),
        PatternDefinition::from("<num> to <num> <currency>"),
        PatternDefinition::from("<num> - <num>"),
        PatternDefinition::from("<num> to <num>"),
        PatternDefinition::from("between <num> and <num>"),
        PatternDefinition::with_bound("from <num> <currency>", Bound::Min),
        PatternDefinition::with_bound("from <num>", Bound::Min),
        PatternDefinition::with_bound("up to <num> <currency>", Bound::Max),
        PatternDefinition::with_bound("up to <num>", Bound::Max),
        PatternDefinition::from("<currency> <num>"),
        PatternDefinition::from("<num> <currency>"),
    ];

    let experience_patterns = vec![
        PatternDefinition::from("<num> - <num> year"),
        PatternDefinition::from("<num> to <num> year"),
        PatternDefinition::with_bound("<num> + year", Bound::Min),
        PatternDefinition::with_bound("at least <num> year", Bound::Min),
        PatternDefinition::with_bound("minimum <num> year", Bound::Min),
        PatternDefinition::with_bound("up to <num> year", Bound::Max),
        PatternDefinition::with_bound("<num> year", Bound::Min),
    ];

    let periods = [
        ("per month", strings(&["per month", "monthly", "/month", "/mo", "a month"])),
        ("per year", strings(&["per year", "yearly", "annually", "per annum", "/year", "/yr"])),
        ("per week", strings(&["per week", "weekly", "/week"])),
        ("per day", strings(&["per day", "daily", "/day"])),
        ("per hour", strings(&["per hour", "hourly", "/hour", "/hr"])),
    ]
    .into_iter()
    .collect();

    let levels = [
        ("executive", strings(&["chief", "ceo", "cto", "cfo", "coo", "vice president", "vp"])),
        ("director", strings(&["director", "head of"])),
        ("manager", strings(&["manager"])),
        ("lead", strings(&["lead", "principal"])),
        ("senior", strings(&["senior", "sr"])),
        ("mid", strings(&["mid-level", "mid level", "intermediate"])),
        ("junior", strings(&["junior", "jr"])),
        (
            "entry",
            strings(&[
                "entry level",
                "entry-level",
                "fresh graduate",
                "graduate",
                "intern",
                "trainee",
            ]),
        ),
    ]
    .into_iter()
    .collect();

    let years = [
        ("entry", YearsHint { min: Some(0), max: Some(1) }),
        ("junior", YearsHint { min: Some(1), max: Some(3) }),
        ("mid", YearsHint { min: Some(3), max: Some(5) }),
        ("senior", YearsHint { min: Some(5), max: None }),
        ("lead", YearsHint { min: Some(7), max: None }),
    ]
    .into_iter()
    .collect();

    RuleSetDefinition {
        currencies,
        range_patterns,
        experience_patterns,
        periods,
        negotiable_keywords: strings(&["negotiable", "neg.", "negotiate"]),
        seniority: SeniorityDefinition {
            detection_strategy: DetectionStrategy::FirstMatch,
            levels,
            years,
        },
    }
}
