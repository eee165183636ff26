//! Regex rules: narrow textual signatures with a `$n` replacement template.
//!
//! The correction rules for malformed output left by earlier, less precise
//! rewrites live here. Each one recognises a single known-bad shape.

use super::{MatchSpan, Rule, RuleMeta};
use crate::error::Result;
use regex::Regex;

/// Two-operand assertions whose second operand an over-eager rewrite can
/// leave detached from its receiver.
const PAIR_ASSERTIONS: &str = "Contains|DoesNotContain|Equal|NotEqual|StartsWith|EndsWith";

/// A regex replacement rule.
pub struct PatternRule {
    meta: RuleMeta,
    pattern: Regex,
    replacement: String,
}

impl PatternRule {
    /// Compiles `pattern`; the replacement uses `$1`/`${name}` references.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self> {
        let pattern = Regex::new(pattern)?;
        let replacement = replacement.into();
        let description = format!("Replace pattern '{}' with '{}'", pattern.as_str(), replacement);
        Ok(Self {
            meta: RuleMeta::new(name, description),
            pattern,
            replacement,
        })
    }

    /// Replaces the generated description.
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.meta.description = description.into();
        self
    }

    /// Declares that this rule repairs output produced by `rule`.
    pub fn repairs(mut self, rule: impl Into<String>) -> Self {
        self.meta = self.meta.repairs(rule);
        self
    }

    /// Declares that this rule must run before `rule`.
    pub fn precedes(mut self, rule: impl Into<String>) -> Self {
        self.meta = self.meta.precedes(rule);
        self
    }

    /// `recv.Assert.Contains(a, b)` -> `Assert.Contains(a, recv.b)`.
    ///
    /// The receiver's last segment must start lower-case or with `_`, so a
    /// qualified `Xunit.Assert.Equal(..)` never matches.
    pub fn receiver_prefixed_pair() -> Result<Self> {
        let pattern = format!(
            r"\b((?:[A-Za-z_][A-Za-z0-9_]*\.)*[a-z_][A-Za-z0-9_]*)\.Assert\.({PAIR_ASSERTIONS})\(([^,()\n]+(?:\([^()\n]*\))?[^,()\n]*), ([A-Za-z_][A-Za-z0-9_]*)\)"
        );
        Ok(Self::new("repair-receiver-prefixed-pair", &pattern, "Assert.$2($3, $1.$4)")?
            .described("recv.Assert.M(a, b) -> Assert.M(a, recv.b)"))
    }

    /// `recv.Assert.Contains(a)` -> `Assert.Contains(a, recv)`.
    pub fn receiver_prefixed_single() -> Result<Self> {
        let pattern = r"\b((?:[A-Za-z_][A-Za-z0-9_]*\.)*[a-z_][A-Za-z0-9_]*)\.Assert\.(Contains|DoesNotContain)\(([^,()\n]+(?:\([^()\n]*\))?[^,()\n]*)\)";
        Ok(Self::new("repair-receiver-prefixed-single", pattern, "Assert.$2($3, $1)")?
            .described("recv.Assert.Contains(a) -> Assert.Contains(a, recv)"))
    }
}

impl Rule for PatternRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn find_matches(&self, source: &str) -> Vec<MatchSpan> {
        self.pattern
            .captures_iter(source)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let span = caps
                    .iter()
                    .skip(1)
                    .fold(MatchSpan::new(whole.range()), |span, group| {
                        span.with_capture(group.map(|g| g.range()).unwrap_or(0..0))
                    });
                Some(span)
            })
            .collect()
    }

    fn rewrite(&self, source: &str, span: &MatchSpan) -> String {
        let Some(caps) = self.pattern.captures_at(source, span.start) else {
            return span.text(source).to_string();
        };
        let mut out = String::new();
        caps.expand(&self.replacement, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::apply_rule;

    #[test]
    fn test_custom_pattern_rule() {
        let rule = PatternRule::new("swap", r"(\w+)\.IsOk\(\)", "Check($1)").unwrap();
        assert_eq!(apply_rule(&rule, "a.IsOk(); b.IsOk();").text, "Check(a); Check(b);");
        assert!(rule.describe().contains("IsOk"));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        assert!(PatternRule::new("bad", r"(unclosed", "").is_err());
    }

    #[test]
    fn test_repair_pair() {
        let rule = PatternRule::receiver_prefixed_pair().unwrap();
        assert_eq!(
            apply_rule(&rule, "actor.Assert.Contains(\"x\", log);").text,
            "Assert.Contains(\"x\", actor.log);"
        );
        assert_eq!(
            apply_rule(&rule, "machine.Assert.Equal(3, Count);").text,
            "Assert.Equal(3, machine.Count);"
        );
    }

    #[test]
    fn test_repair_pair_with_call_argument() {
        let rule = PatternRule::receiver_prefixed_pair().unwrap();
        assert_eq!(
            apply_rule(&rule, "this.actor.Assert.Equal(Id(2), Current);").text,
            "Assert.Equal(Id(2), this.actor.Current);"
        );
    }

    #[test]
    fn test_repair_single() {
        let rule = PatternRule::receiver_prefixed_single().unwrap();
        assert_eq!(
            apply_rule(&rule, "pingHits.Assert.Contains(\"ping\");").text,
            "Assert.Contains(\"ping\", pingHits);"
        );
    }

    #[test]
    fn test_repairs_leave_qualified_and_correct_calls() {
        let pair = PatternRule::receiver_prefixed_pair().unwrap();
        let single = PatternRule::receiver_prefixed_single().unwrap();
        for source in [
            "Xunit.Assert.Equal(1, value);",
            "Assert.Contains(\"x\", actor.log);",
            "Assert.Equal(3, machine.Count);",
        ] {
            assert_eq!(apply_rule(&pair, source).text, source);
            assert_eq!(apply_rule(&single, source).text, source);
        }
    }

    #[test]
    fn test_optional_group_becomes_empty_capture() {
        let rule = PatternRule::new("opt", r"a(b)?c", "[$1]").unwrap();
        let spans = rule.find_matches("ac");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].capture("ac", 0), "");
        assert_eq!(apply_rule(&rule, "ac abc").text, "[] [b]");
    }
}
