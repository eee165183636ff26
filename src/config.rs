//! Configuration file support.
//!
//! A configuration names the files to visit and may extend the built-in
//! pipelines with narrow regex rules for newly discovered malformed shapes.
//!
//! ```yaml
//! extensions:
//!   - cs
//! exclude:
//!   - "**/obj/**"
//! backup_suffix: .bak
//! extra_rules:
//!   - name: repair-actor-assert-true
//!     pattern: 'actor\.Assert\.True\((.*)\)'
//!     replacement: 'Assert.True($1)'
//!     repairs: fluent-be-true
//! ```

use crate::error::{MigrateError, Result};
use crate::pass::{Pass, Pipeline};
use crate::rule::PatternRule;
use crate::selector::FileSelector;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the pass that holds configured rules.
pub const CUSTOM_PASS: &str = "custom";

/// Settings shared by every pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    /// File extensions to visit, without the dot.
    pub extensions: Vec<String>,

    /// Only visit paths matching one of these globs (relative to the root).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,

    /// Skip paths matching any of these globs.
    pub exclude: Vec<String>,

    /// Save originals alongside rewritten files with this suffix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_suffix: Option<String>,

    /// Replaces the pipeline's pre-filter markers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markers: Option<Vec<String>>,

    /// Line keywords for the quote normalizer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_markers: Option<Vec<String>>,

    /// Regex rules appended as a final pass.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_rules: Vec<RuleSpec>,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["cs".to_string()],
            include: Vec::new(),
            exclude: vec![
                "**/bin/**".to_string(),
                "**/obj/**".to_string(),
                "**/.git/**".to_string(),
            ],
            backup_suffix: None,
            markers: None,
            quote_markers: None,
            extra_rules: Vec::new(),
        }
    }
}

/// A configured regex rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub pattern: String,
    pub replacement: String,
    /// Names of rules whose output this one repairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "one_or_many")]
    pub repairs: Vec<String>,
}

impl RuleSpec {
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            replacement: replacement.into(),
            repairs: Vec::new(),
        }
    }

    /// Compiles the rule.
    pub fn to_rule(&self) -> Result<PatternRule> {
        if self.name.trim().is_empty() {
            return Err(MigrateError::InvalidConfig(format!(
                "rule with pattern '{}' has no name",
                self.pattern
            )));
        }
        let rule = PatternRule::new(&self.name, &self.pattern, &self.replacement)?;
        Ok(self.repairs.iter().fold(rule, |rule, r| rule.repairs(r)))
    }
}

impl MigrateConfig {
    /// Loads a config, choosing the format by file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(path),
            Some("json") => Self::from_json(path),
            _ => Err(MigrateError::InvalidConfig(format!(
                "unsupported config format: {}",
                path.display()
            ))),
        }
    }

    /// Load config from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Load config from a JSON file.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save config to a YAML file.
    pub fn to_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Builds the file selector described by this config.
    pub fn selector(&self) -> FileSelector {
        let selector = FileSelector::new().extensions(self.extensions.iter().cloned());
        let selector = self.include.iter().fold(selector, |s, g| s.include(g.clone()));
        self.exclude.iter().fold(selector, |s, g| s.exclude(g.clone()))
    }

    /// Applies marker overrides and appends the custom pass.
    pub fn extend(&self, pipeline: Pipeline) -> Result<Pipeline> {
        let pipeline = match &self.markers {
            Some(markers) => pipeline.with_markers(markers.iter().cloned()),
            None => pipeline,
        };
        let mut custom = Pass::new(CUSTOM_PASS);
        for spec in &self.extra_rules {
            custom = custom.rule(spec.to_rule()?);
        }
        Ok(pipeline.pass(custom))
    }
}

/// Accepts `repairs: name` as well as `repairs: [a, b]`.
mod one_or_many {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    pub fn serialize<S: Serializer>(value: &Vec<String>, serializer: S) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(name) => vec![name],
            OneOrMany::Many(names) => names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = MigrateConfig::default();
        assert_eq!(config.extensions, vec!["cs"]);
        assert_eq!(config.exclude.len(), 3);
        assert!(config.backup_suffix.is_none());
    }

    #[test]
    fn test_yaml_format() {
        let yaml = r#"
extensions: [cs, csx]
backup_suffix: .bak
extra_rules:
  - name: repair-actor-true
    pattern: 'actor\.Assert\.True\((.*)\)'
    replacement: 'Assert.True($1)'
    repairs: fluent-be-true
"#;
        let config: MigrateConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.extensions, vec!["cs", "csx"]);
        // Unlisted fields keep their defaults.
        assert_eq!(config.exclude, MigrateConfig::default().exclude);
        assert_eq!(config.backup_suffix.as_deref(), Some(".bak"));
        assert_eq!(config.extra_rules[0].repairs, vec!["fluent-be-true"]);
    }

    #[test]
    fn test_load_by_extension() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("migrate.json");
        std::fs::write(&json, r#"{"extensions": ["csx"], "quote_markers": ["Payload"]}"#).unwrap();
        let config = MigrateConfig::load(&json).unwrap();
        assert_eq!(config.extensions, vec!["csx"]);
        assert_eq!(config.quote_markers, Some(vec!["Payload".to_string()]));

        let yaml = dir.path().join("migrate.yml");
        config.to_yaml(&yaml).unwrap();
        assert_eq!(MigrateConfig::load(&yaml).unwrap(), config);

        let toml = dir.path().join("migrate.toml");
        std::fs::write(&toml, "").unwrap();
        assert!(matches!(
            MigrateConfig::load(&toml),
            Err(MigrateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "extensions: {").unwrap();
        assert!(matches!(MigrateConfig::load(&path), Err(MigrateError::Yaml(_))));
    }

    #[test]
    fn test_extend_appends_custom_pass() {
        let config = MigrateConfig {
            markers: Some(vec!["Verify(".to_string()]),
            extra_rules: vec![RuleSpec::new("verify", r"Verify\((\w+)\)", "Assert.True($1)")],
            ..Default::default()
        };
        let pipeline = config.extend(Pipeline::new("p")).unwrap();
        assert_eq!(pipeline.markers(), ["Verify("]);
        assert_eq!(pipeline.passes()[0].name(), CUSTOM_PASS);
        assert_eq!(pipeline.run("Verify(ok);").text, "Assert.True(ok);");
    }

    #[test]
    fn test_no_extra_rules_adds_no_pass() {
        let pipeline = MigrateConfig::default().extend(Pipeline::new("p")).unwrap();
        assert!(pipeline.passes().is_empty());
    }

    #[test]
    fn test_invalid_rule_is_error() {
        let bad_regex = RuleSpec::new("bad", "(", "");
        assert!(matches!(bad_regex.to_rule(), Err(MigrateError::Regex(_))));
        let unnamed = RuleSpec::new(" ", "a", "b");
        assert!(matches!(unnamed.to_rule(), Err(MigrateError::InvalidConfig(_))));
    }

    #[test]
    fn test_rule_spec_carries_repairs() {
        let mut spec = RuleSpec::new("fix", "a", "b");
        spec.repairs = vec!["fluent-contain".to_string()];
        let rule = spec.to_rule().unwrap();
        assert_eq!(rule.meta().repairs, vec!["fluent-contain"]);
    }
}
