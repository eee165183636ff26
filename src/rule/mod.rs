//! Rewrite rules and the machinery for applying one rule to a buffer.

pub mod expr;
pub mod fluent;
pub mod pattern;
pub mod quote;

pub use fluent::{ContainsRule, FluentMatcher, FluentRule};
pub use pattern::PatternRule;
pub use quote::QuoteRule;

use std::ops::Range;

/// A located occurrence of a rule's pattern in a buffer.
///
/// Captures are byte ranges into the buffer the span was found in and are
/// only meaningful for that buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
    pub captures: Vec<Range<usize>>,
}

impl MatchSpan {
    /// Creates a span covering `range` with no captures.
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
            captures: Vec::new(),
        }
    }

    /// Adds a captured sub-span.
    pub fn with_capture(mut self, range: Range<usize>) -> Self {
        self.captures.push(range);
        self
    }

    /// Returns the text of capture `index`, or an empty string.
    pub fn capture<'a>(&self, source: &'a str, index: usize) -> &'a str {
        self.captures
            .get(index)
            .and_then(|r| source.get(r.clone()))
            .unwrap_or("")
    }

    /// Returns the matched text.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Identity and ordering constraints of a rule.
#[derive(Debug, Clone, Default)]
pub struct RuleMeta {
    pub name: String,
    pub description: String,
    /// Rules that must run after this one.
    pub precedes: Vec<String>,
    /// Rules whose malformed output this rule repairs. A repair rule must
    /// sit in a later pass than every rule it repairs.
    pub repairs: Vec<String>,
}

impl RuleMeta {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Declares that this rule must run before `rule`.
    pub fn precedes(mut self, rule: impl Into<String>) -> Self {
        self.precedes.push(rule.into());
        self
    }

    /// Declares that this rule repairs output produced by `rule`.
    pub fn repairs(mut self, rule: impl Into<String>) -> Self {
        self.repairs.push(rule.into());
        self
    }
}

/// A single (matcher, rewriter) pair.
pub trait Rule: Send + Sync {
    /// Name, description and ordering constraints.
    fn meta(&self) -> &RuleMeta;

    /// Finds every occurrence of this rule's pattern in `source`.
    fn find_matches(&self, source: &str) -> Vec<MatchSpan>;

    /// Produces the replacement text for a span found in `source`.
    fn rewrite(&self, source: &str, span: &MatchSpan) -> String;

    fn name(&self) -> &str {
        &self.meta().name
    }

    fn describe(&self) -> String {
        self.meta().description.clone()
    }
}

/// The buffer produced by one rule application.
#[derive(Debug, Clone)]
pub struct RuleApplication {
    pub text: String,
    pub replaced: usize,
}

/// Applies `rule` to every non-overlapping match in `source`.
///
/// When matches overlap the leftmost wins. Rewrites that reproduce the
/// matched text are not counted.
pub fn apply_rule(rule: &dyn Rule, source: &str) -> RuleApplication {
    let mut spans = rule.find_matches(source);
    spans.sort_by_key(|s| (s.start, std::cmp::Reverse(s.end)));

    let mut text = String::with_capacity(source.len());
    let mut cursor = 0;
    let mut replaced = 0;

    for span in &spans {
        if span.start < cursor {
            continue;
        }
        let replacement = rule.rewrite(source, span);
        if replacement == span.text(source) {
            continue;
        }
        text.push_str(&source[cursor..span.start]);
        text.push_str(&replacement);
        cursor = span.end;
        replaced += 1;
    }
    text.push_str(&source[cursor..]);

    RuleApplication { text, replaced }
}
