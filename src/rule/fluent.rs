//! Grammar rules for `receiver.Should().Matcher(args)` call shapes.

use super::expr;
use super::{MatchSpan, Rule, RuleMeta, apply_rule};
use std::fmt;
use std::ops::Range;

/// The marker every fluent assertion chain starts with.
pub const SHOULD: &str = ".Should()";

/// A named fluent check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FluentMatcher {
    NotBeNull,
    BeNull,
    Be,
    NotBe,
    BeTrue,
    BeFalse,
    Contain,
    NotContain,
    HaveCount,
    BeEmpty,
    NotBeEmpty,
    BeGreaterThan,
    BeLessThan,
    BeGreaterOrEqualTo,
    BeGreaterThanOrEqualTo,
    BeLessThanOrEqualTo,
    StartWith,
    EndWith,
    BeEquivalentTo,
}

/// How a matcher is re-emitted as a call-based assertion.
enum Template {
    /// `Assert.X(subject)`
    Subject(&'static str),
    /// `Assert.X(expected, subject)`
    Expected(&'static str),
    /// `Assert.Equal(n, subject.Count)`
    Count,
    /// `Assert.True(subject <op> n)`
    Compare(&'static str),
}

impl FluentMatcher {
    pub const ALL: [FluentMatcher; 19] = [
        FluentMatcher::NotBeNull,
        FluentMatcher::BeNull,
        FluentMatcher::Be,
        FluentMatcher::NotBe,
        FluentMatcher::BeTrue,
        FluentMatcher::BeFalse,
        FluentMatcher::Contain,
        FluentMatcher::NotContain,
        FluentMatcher::HaveCount,
        FluentMatcher::BeEmpty,
        FluentMatcher::NotBeEmpty,
        FluentMatcher::BeGreaterThan,
        FluentMatcher::BeLessThan,
        FluentMatcher::BeGreaterOrEqualTo,
        FluentMatcher::BeGreaterThanOrEqualTo,
        FluentMatcher::BeLessThanOrEqualTo,
        FluentMatcher::StartWith,
        FluentMatcher::EndWith,
        FluentMatcher::BeEquivalentTo,
    ];

    /// The method name as written after `.Should().`.
    pub fn name(self) -> &'static str {
        match self {
            FluentMatcher::NotBeNull => "NotBeNull",
            FluentMatcher::BeNull => "BeNull",
            FluentMatcher::Be => "Be",
            FluentMatcher::NotBe => "NotBe",
            FluentMatcher::BeTrue => "BeTrue",
            FluentMatcher::BeFalse => "BeFalse",
            FluentMatcher::Contain => "Contain",
            FluentMatcher::NotContain => "NotContain",
            FluentMatcher::HaveCount => "HaveCount",
            FluentMatcher::BeEmpty => "BeEmpty",
            FluentMatcher::NotBeEmpty => "NotBeEmpty",
            FluentMatcher::BeGreaterThan => "BeGreaterThan",
            FluentMatcher::BeLessThan => "BeLessThan",
            FluentMatcher::BeGreaterOrEqualTo => "BeGreaterOrEqualTo",
            FluentMatcher::BeGreaterThanOrEqualTo => "BeGreaterThanOrEqualTo",
            FluentMatcher::BeLessThanOrEqualTo => "BeLessThanOrEqualTo",
            FluentMatcher::StartWith => "StartWith",
            FluentMatcher::EndWith => "EndWith",
            FluentMatcher::BeEquivalentTo => "BeEquivalentTo",
        }
    }

    /// Looks up a matcher by its method name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    fn template(self) -> Template {
        match self {
            FluentMatcher::NotBeNull => Template::Subject("NotNull"),
            FluentMatcher::BeNull => Template::Subject("Null"),
            FluentMatcher::BeTrue => Template::Subject("True"),
            FluentMatcher::BeFalse => Template::Subject("False"),
            FluentMatcher::BeEmpty => Template::Subject("Empty"),
            FluentMatcher::NotBeEmpty => Template::Subject("NotEmpty"),
            FluentMatcher::Be | FluentMatcher::BeEquivalentTo => Template::Expected("Equal"),
            FluentMatcher::NotBe => Template::Expected("NotEqual"),
            FluentMatcher::Contain => Template::Expected("Contains"),
            FluentMatcher::NotContain => Template::Expected("DoesNotContain"),
            FluentMatcher::StartWith => Template::Expected("StartsWith"),
            FluentMatcher::EndWith => Template::Expected("EndsWith"),
            FluentMatcher::HaveCount => Template::Count,
            FluentMatcher::BeGreaterThan => Template::Compare(">"),
            FluentMatcher::BeLessThan => Template::Compare("<"),
            FluentMatcher::BeGreaterOrEqualTo | FluentMatcher::BeGreaterThanOrEqualTo => {
                Template::Compare(">=")
            }
            FluentMatcher::BeLessThanOrEqualTo => Template::Compare("<="),
        }
    }

    /// Returns true if the matcher needs an expected-value argument.
    pub fn takes_argument(self) -> bool {
        !matches!(self.template(), Template::Subject(_))
    }

    /// The stable rule name, e.g. `fluent-have-count`.
    pub fn rule_name(self) -> String {
        let mut name = String::from("fluent");
        for c in self.name().chars() {
            if c.is_ascii_uppercase() {
                name.push('-');
            }
            name.push(c.to_ascii_lowercase());
        }
        name
    }

    /// Renders the call-based assertion for a receiver and its arguments.
    pub fn render(self, receiver: &str, args: &[&str]) -> String {
        let subject = expr::strip_outer_parens(receiver);
        let expected = args.first().copied().unwrap_or_default();
        match self.template() {
            Template::Subject(assert) => match (self, args) {
                (FluentMatcher::BeTrue | FluentMatcher::BeFalse, [reason]) if !reason.is_empty() => {
                    format!("Assert.{assert}({subject}, {reason})")
                }
                _ => format!("Assert.{assert}({subject})"),
            },
            Template::Expected(assert) => format!("Assert.{assert}({expected}, {subject})"),
            Template::Count => format!("Assert.Equal({expected}, {receiver}.Count)"),
            Template::Compare(op) => {
                let operand = if expr::has_top_level_operator(expected) {
                    format!("({expected})")
                } else {
                    expected.to_string()
                };
                format!("Assert.True({receiver} {op} {operand})")
            }
        }
    }
}

impl fmt::Display for FluentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed `receiver.Should().Name(args)` occurrence.
#[derive(Debug, Clone)]
pub struct FluentCall {
    pub start: usize,
    pub end: usize,
    pub receiver: Range<usize>,
    pub name: Range<usize>,
    pub args: Range<usize>,
}

/// Parses the fluent call whose `.Should()` begins at `at`. A call that
/// continues into a chain such as `.And.HaveCount(2)` is not parsed.
pub fn parse_call(source: &str, at: usize) -> Option<FluentCall> {
    let after = at + SHOULD.len();
    if source.as_bytes().get(after) != Some(&b'.') {
        return None;
    }
    let (_, name_end) = expr::ident_at(source, after + 1)?;
    if source.as_bytes().get(name_end) != Some(&b'(') {
        return None;
    }
    let close = expr::matching_close(source, name_end)?;
    let rest = source[close + 1..].trim_start();
    if rest.starts_with('.') || rest.starts_with("?.") {
        return None;
    }
    let start = expr::receiver_start(source, at)?;
    Some(FluentCall {
        start,
        end: close + 1,
        receiver: start..at,
        name: after + 1..name_end,
        args: name_end + 1..close,
    })
}

/// Iterates every well-formed fluent call in `source`.
pub fn fluent_calls(source: &str) -> impl Iterator<Item = FluentCall> + '_ {
    source
        .match_indices(SHOULD)
        .filter_map(move |(at, _)| parse_call(source, at))
}

/// Rewrites one matcher, e.g. `x.Should().Be(v)` to `Assert.Equal(v, x)`.
pub struct FluentRule {
    meta: RuleMeta,
    matcher: FluentMatcher,
}

impl FluentRule {
    pub fn new(matcher: FluentMatcher) -> Self {
        let sample: &[&str] = if matcher.takes_argument() { &["v"] } else { &[] };
        let description = format!(
            "r.Should().{}({}) -> {}",
            matcher,
            sample.join(""),
            matcher.render("r", sample)
        );
        Self {
            meta: RuleMeta::new(matcher.rule_name(), description),
            matcher,
        }
    }

    /// Adds an ordering constraint: this rule runs before `rule`.
    pub fn precedes(mut self, rule: impl Into<String>) -> Self {
        self.meta = self.meta.precedes(rule);
        self
    }
}

impl Rule for FluentRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn find_matches(&self, source: &str) -> Vec<MatchSpan> {
        fluent_calls(source)
            .filter(|call| &source[call.name.clone()] == self.matcher.name())
            .filter(|call| {
                let args = expr::split_top_level(&source[call.args.clone()]);
                !self.matcher.takes_argument() || args.first().is_some_and(|a| !a.is_empty())
            })
            .map(|call| {
                MatchSpan::new(call.start..call.end)
                    .with_capture(call.receiver)
                    .with_capture(call.name)
                    .with_capture(call.args)
            })
            .collect()
    }

    fn rewrite(&self, source: &str, span: &MatchSpan) -> String {
        // Calls nested in the receiver or arguments overlap this span, so
        // they are rewritten here.
        let receiver = apply_rule(self, span.capture(source, 0)).text;
        let args = apply_rule(self, span.capture(source, 2)).text;
        self.matcher.render(&receiver, &expr::split_top_level(&args))
    }
}

/// Rewrites `x.Contains(item).Should().BeTrue()` to `Assert.Contains(item, x)`
/// and the `BeFalse` form to `Assert.DoesNotContain(item, x)`.
///
/// Must run before the generic `BeTrue`/`BeFalse` rules, which would
/// otherwise claim the whole chain.
pub struct ContainsRule {
    meta: RuleMeta,
    negated: bool,
}

impl ContainsRule {
    /// The `BeTrue` form.
    pub fn when_true() -> Self {
        Self {
            meta: RuleMeta::new(
                "contains-be-true",
                "r.Contains(v).Should().BeTrue() -> Assert.Contains(v, r)",
            )
            .precedes(FluentMatcher::BeTrue.rule_name()),
            negated: false,
        }
    }

    /// The `BeFalse` form.
    pub fn when_false() -> Self {
        Self {
            meta: RuleMeta::new(
                "contains-be-false",
                "r.Contains(v).Should().BeFalse() -> Assert.DoesNotContain(v, r)",
            )
            .precedes(FluentMatcher::BeFalse.rule_name()),
            negated: true,
        }
    }

    fn target(&self) -> FluentMatcher {
        if self.negated {
            FluentMatcher::BeFalse
        } else {
            FluentMatcher::BeTrue
        }
    }

    /// Splits a receiver ending in `.Contains(item)` into collection and item.
    fn split_receiver(source: &str, receiver: Range<usize>) -> Option<(Range<usize>, Range<usize>)> {
        const CONTAINS: &str = ".Contains";
        let close = receiver.end.checked_sub(1)?;
        if source.as_bytes().get(close) != Some(&b')') {
            return None;
        }
        let open = expr::matching_open(source, close)?;
        if open < receiver.start + CONTAINS.len() || !source[..open].ends_with(CONTAINS) {
            return None;
        }
        let collection = receiver.start..open - CONTAINS.len();
        let item = open + 1..close;
        let collection_text = &source[collection.clone()];
        if collection_text.is_empty() || collection_text.ends_with('?') {
            return None;
        }
        match expr::split_top_level(&source[item.clone()]).as_slice() {
            [single] if !single.is_empty() => Some((collection, item)),
            _ => None,
        }
    }
}

impl Rule for ContainsRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn find_matches(&self, source: &str) -> Vec<MatchSpan> {
        let target = self.target().name();
        fluent_calls(source)
            .filter(|call| &source[call.name.clone()] == target)
            .filter_map(|call| {
                let (collection, item) = Self::split_receiver(source, call.receiver.clone())?;
                Some(
                    MatchSpan::new(call.start..call.end)
                        .with_capture(collection)
                        .with_capture(item),
                )
            })
            .collect()
    }

    fn rewrite(&self, source: &str, span: &MatchSpan) -> String {
        let assert = if self.negated { "DoesNotContain" } else { "Contains" };
        let collection = apply_rule(self, span.capture(source, 0)).text;
        let item = apply_rule(self, span.capture(source, 1)).text;
        format!("Assert.{assert}({}, {collection})", item.trim())
    }
}
