//! # Assert Migrate
//!
//! Mechanical source-to-source migrations for C# test suites.
//!
//! This crate provides:
//! - Grammar rules that rewrite fluent `x.Should().Be(v)` assertions into
//!   xUnit `Assert.Equal(v, x)` calls
//! - Narrow correction rules for malformed output of earlier rewrites
//! - A line-gated normalizer for doubled quotes in embedded JSON literals
//! - Ordered passes with declared rule dependencies, checked before a run
//! - A directory traversal with dry runs, diffs and backups
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use assert_migrate::prelude::*;
//!
//! let log = Migration::preset("./Tests", &fluent_to_xunit())?
//!     .backup(".bak")
//!     .apply()?;
//!
//! println!("{log}");
//! # Ok::<(), assert_migrate::error::MigrateError>(())
//! ```
//!
//! ## Rewriting a buffer
//!
//! Pipelines are pure text-to-text functions, so they can run on strings
//! without touching the file system:
//!
//! ```rust
//! use assert_migrate::prelude::*;
//!
//! let pipeline = fluent_to_xunit().pipeline()?;
//! let outcome = pipeline.run("items.Should().HaveCount(3);");
//! assert_eq!(outcome.text, "Assert.Equal(3, items.Count);");
//! # Ok::<(), assert_migrate::error::MigrateError>(())
//! ```
//!
//! ## Custom rules
//!
//! ```rust
//! use assert_migrate::prelude::*;
//!
//! let pipeline = Pipeline::new("custom")
//!     .marker("Verify(")
//!     .pass(Pass::new("verify").rule(PatternRule::new(
//!         "verify-to-true",
//!         r"Verify\((\w+)\)",
//!         "Assert.True($1)",
//!     )?));
//! pipeline.validate()?;
//! assert_eq!(pipeline.run("Verify(ok);").text, "Assert.True(ok);");
//! # Ok::<(), assert_migrate::error::MigrateError>(())
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod migrate;
pub mod pass;
pub mod presets;
pub mod record;
pub mod report;
pub mod rule;
pub mod selector;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{MigrateConfig, RuleSpec};
    pub use crate::diff::DiffSummary;
    pub use crate::error::{MigrateError, Result};
    pub use crate::migrate::Migration;
    pub use crate::pass::{Pass, PassOutcome, Pipeline, RuleHit, Unresolved};
    pub use crate::presets::{FluentToXunit, JsonQuotes, Preset, fluent_to_xunit, json_quotes};
    pub use crate::record::FileRecord;
    pub use crate::report::{ChangeLog, FileChange, FileFailure, FileOutcome, UnresolvedFile};
    pub use crate::rule::{
        ContainsRule, FluentMatcher, FluentRule, MatchSpan, PatternRule, QuoteRule, Rule, RuleMeta,
    };
    pub use crate::selector::FileSelector;
}

pub use prelude::*;
