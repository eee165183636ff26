//! Passes and pipelines: ordered groups of rules applied to one buffer.
//!
//! Within a pass every rule scans the whole current buffer, so later rules
//! see the output of earlier ones. Passes run once each, in order; there is
//! no fixed-point loop.

use crate::error::{MigrateError, Result};
use crate::rule::{Rule, apply_rule};
use std::collections::HashMap;
use tracing::debug;

/// An ordered list of rules applied together.
pub struct Pass {
    name: String,
    rules: Vec<Box<dyn Rule>>,
}

impl Pass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// Appends a rule.
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Appends a boxed rule.
    pub fn boxed(mut self, rule: Box<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// How many replacements one rule made in one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    pub pass: String,
    pub rule: String,
    pub count: usize,
}

/// The result of running a pipeline over one buffer.
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub text: String,
    pub hits: Vec<RuleHit>,
}

impl PassOutcome {
    /// Total replacements across all rules.
    pub fn replacements(&self) -> usize {
        self.hits.iter().map(|h| h.count).sum()
    }
}

/// A marker occurrence no rule resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    /// 1-based line number.
    pub line: usize,
    pub snippet: String,
}

/// A named sequence of passes plus the marker substrings that make a
/// buffer worth running it on.
pub struct Pipeline {
    name: String,
    passes: Vec<Pass>,
    markers: Vec<String>,
    residue: Option<String>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passes: Vec::new(),
            markers: Vec::new(),
            residue: None,
        }
    }

    /// Appends a pass. Empty passes are dropped.
    pub fn pass(mut self, pass: Pass) -> Self {
        if !pass.is_empty() {
            self.passes.push(pass);
        }
        self
    }

    /// Adds a pre-filter marker.
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.push(marker.into());
        self
    }

    /// Replaces the pre-filter markers.
    pub fn with_markers(mut self, markers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the substring whose survival after the last pass counts as an
    /// unresolved case.
    pub fn residue(mut self, marker: impl Into<String>) -> Self {
        self.residue = Some(marker.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Iterates every rule in execution order.
    pub fn rules(&self) -> impl Iterator<Item = (&Pass, &dyn Rule)> {
        self.passes
            .iter()
            .flat_map(|pass| pass.rules.iter().map(move |rule| (pass, rule.as_ref())))
    }

    /// Checks declared ordering constraints.
    ///
    /// A rule that `precedes` another must run before it; a rule that
    /// `repairs` another must sit in a strictly later pass.
    pub fn validate(&self) -> Result<()> {
        let mut positions: HashMap<&str, (usize, usize)> = HashMap::new();
        for (pass_idx, pass) in self.passes.iter().enumerate() {
            for (rule_idx, rule) in pass.rules.iter().enumerate() {
                if positions.insert(rule.name(), (pass_idx, rule_idx)).is_some() {
                    return Err(MigrateError::InvalidConfig(format!(
                        "duplicate rule name '{}' in pipeline '{}'",
                        rule.name(),
                        self.name
                    )));
                }
            }
        }

        for (_, rule) in self.rules() {
            let here = positions[rule.name()];
            let lookup = |other: &str| {
                positions
                    .get(other)
                    .copied()
                    .ok_or_else(|| MigrateError::UnknownRule {
                        rule: rule.name().to_string(),
                        missing: other.to_string(),
                    })
            };

            for later in &rule.meta().precedes {
                if lookup(later.as_str())? <= here {
                    return Err(MigrateError::RuleOrder {
                        rule: rule.name().to_string(),
                        message: format!("must run before '{later}'"),
                    });
                }
            }
            for repaired in &rule.meta().repairs {
                if lookup(repaired.as_str())?.0 >= here.0 {
                    return Err(MigrateError::RuleOrder {
                        rule: rule.name().to_string(),
                        message: format!("repairs '{repaired}' and must run in a later pass"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Runs every pass over `source`.
    pub fn run(&self, source: &str) -> PassOutcome {
        let mut text = source.to_string();
        let mut hits = Vec::new();

        for pass in &self.passes {
            for rule in &pass.rules {
                let applied = apply_rule(rule.as_ref(), &text);
                if applied.replaced > 0 {
                    debug!(
                        pass = pass.name(),
                        rule = rule.name(),
                        count = applied.replaced,
                        "rule applied"
                    );
                    hits.push(RuleHit {
                        pass: pass.name.clone(),
                        rule: rule.name().to_string(),
                        count: applied.replaced,
                    });
                    text = applied.text;
                }
            }
        }

        PassOutcome { text, hits }
    }

    /// Lists residue occurrences left in `text`.
    pub fn unresolved(&self, text: &str) -> Vec<Unresolved> {
        let Some(residue) = self.residue.as_deref() else {
            return Vec::new();
        };
        text.lines()
            .enumerate()
            .filter(|(_, line)| line.contains(residue))
            .map(|(idx, line)| Unresolved {
                line: idx + 1,
                snippet: line.trim().to_string(),
            })
            .collect()
    }
}
