//! Pre-built migrations.

use crate::error::Result;
use crate::pass::{Pass, Pipeline};
use crate::rule::fluent::SHOULD;
use crate::rule::quote::DEFAULT_MARKERS;
use crate::rule::{ContainsRule, FluentMatcher, FluentRule, PatternRule, QuoteRule};
use crate::selector::FileSelector;

/// A reusable migration: which files to visit and which passes to run.
///
/// # Example
///
/// ```rust
/// use assert_migrate::pass::{Pass, Pipeline};
/// use assert_migrate::presets::Preset;
/// use assert_migrate::rule::PatternRule;
/// use assert_migrate::selector::FileSelector;
///
/// struct RenameHelper;
///
/// impl Preset for RenameHelper {
///     fn name(&self) -> &str {
///         "rename-helper"
///     }
///
///     fn description(&self) -> &str {
///         "Rename TestHelper to Fixture"
///     }
///
///     fn selector(&self) -> FileSelector {
///         FileSelector::new().extension("cs")
///     }
///
///     fn pipeline(&self) -> assert_migrate::error::Result<Pipeline> {
///         Ok(Pipeline::new(self.name())
///             .marker("TestHelper")
///             .pass(Pass::new("rename").rule(PatternRule::new(
///                 "rename-helper",
///                 r"\bTestHelper\b",
///                 "Fixture",
///             )?)))
///     }
/// }
/// ```
pub trait Preset: Send + Sync {
    /// Unique name for this migration.
    fn name(&self) -> &str;

    /// Human-readable description of what this migration does.
    fn description(&self) -> &str;

    /// The files this migration applies to.
    fn selector(&self) -> FileSelector;

    /// Builds the passes to run.
    fn pipeline(&self) -> Result<Pipeline>;
}

fn source_selector() -> FileSelector {
    FileSelector::new()
        .extension("cs")
        .exclude("**/bin/**")
        .exclude("**/obj/**")
        .exclude("**/.git/**")
}

/// Fluent `x.Should().M(v)` assertions to xUnit `Assert.M(v, x)` calls.
///
/// Passes, in order:
/// - `composed`: `x.Contains(v).Should().BeTrue()/BeFalse()`, which must
///   claim the chain before the generic boolean rules do;
/// - `common`: one rule per matcher;
/// - `corrections`: narrow repairs for receiver-prefixed `Assert` calls.
pub struct FluentToXunit;

/// Matchers whose two-operand output the correction rules repair.
const REPAIRED: [FluentMatcher; 6] = [
    FluentMatcher::Contain,
    FluentMatcher::NotContain,
    FluentMatcher::Be,
    FluentMatcher::NotBe,
    FluentMatcher::StartWith,
    FluentMatcher::EndWith,
];

impl Preset for FluentToXunit {
    fn name(&self) -> &str {
        "fluent-to-xunit"
    }

    fn description(&self) -> &str {
        "Rewrite fluent .Should() assertions as xUnit Assert calls"
    }

    fn selector(&self) -> FileSelector {
        source_selector()
    }

    fn pipeline(&self) -> Result<Pipeline> {
        let composed = Pass::new("composed")
            .rule(ContainsRule::when_true())
            .rule(ContainsRule::when_false());

        let common = FluentMatcher::ALL
            .into_iter()
            .fold(Pass::new("common"), |pass, m| pass.rule(FluentRule::new(m)));

        let mut pair = PatternRule::receiver_prefixed_pair()?;
        let mut single = PatternRule::receiver_prefixed_single()?;
        for matcher in REPAIRED {
            pair = pair.repairs(matcher.rule_name());
        }
        for matcher in [FluentMatcher::Contain, FluentMatcher::NotContain] {
            single = single.repairs(matcher.rule_name());
        }
        let corrections = Pass::new("corrections").rule(pair).rule(single);

        Ok(Pipeline::new(self.name())
            .marker(SHOULD)
            .marker(".Assert.")
            .residue(SHOULD)
            .pass(composed)
            .pass(common)
            .pass(corrections))
    }
}

/// Doubled quotes in verbatim JSON literals to single quotes.
pub struct JsonQuotes {
    markers: Vec<String>,
}

impl JsonQuotes {
    /// Uses custom line keywords instead of the defaults.
    pub fn new(markers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for JsonQuotes {
    fn default() -> Self {
        Self::new(DEFAULT_MARKERS.iter().copied())
    }
}

impl Preset for JsonQuotes {
    fn name(&self) -> &str {
        "json-quotes"
    }

    fn description(&self) -> &str {
        "Rewrite \"\" as ' inside verbatim JSON literals"
    }

    fn selector(&self) -> FileSelector {
        source_selector()
    }

    fn pipeline(&self) -> Result<Pipeline> {
        Ok(Pipeline::new(self.name())
            .marker("\"\"")
            .pass(Pass::new("quotes").rule(QuoteRule::new(self.markers.iter().cloned()))))
    }
}

/// Convenience function to create the assertion migration.
pub fn fluent_to_xunit() -> FluentToXunit {
    FluentToXunit
}

/// Convenience function to create the quote migration with default markers.
pub fn json_quotes() -> JsonQuotes {
    JsonQuotes::default()
}

/// Every built-in migration.
pub fn all() -> Vec<Box<dyn Preset>> {
    vec![Box::new(fluent_to_xunit()), Box::new(json_quotes())]
}
