use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// A regex signal that is near-unique to one subclassification.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UniquePattern {
    pub pattern: String,
    pub confidence: f64,
    pub label: String,
}

/// A weaker layout/boilerplate signal; weights are relative and get
/// normalized against the rule's total structure weight.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StructurePattern {
    pub pattern: String,
    pub weight: f64,
}

/// Detection signals for one subclassification. Immutable after load.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Rule {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub parent_theme: String,
    pub subtheme_category: String,
    #[serde(default)]
    pub unique_patterns: Vec<UniquePattern>,
    #[serde(default)]
    pub definitive_phrases: BTreeMap<String, f64>,
    #[serde(default)]
    pub form_numbers: BTreeMap<String, f64>,
    #[serde(default)]
    pub structure_patterns: Vec<StructurePattern>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub filename_patterns: BTreeMap<String, f64>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub exclude_phrases: Vec<String>,
}

/// One theme's rule list, in declaration order. Declaration order is
/// the tie-break for equal confidences downstream.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleSet {
    pub theme: String,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Error)]
pub enum RuleSetError {
    #[error("rule set parse failed: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("duplicate rule name '{name}' in theme '{theme}'")]
    DuplicateRule { theme: String, name: String },
    #[error("rule '{rule}': {signal} confidence {value} outside [0, 1]")]
    ConfidenceOutOfRange {
        rule: String,
        signal: String,
        value: f64,
    },
    #[error("rule '{rule}': structure weight {value} must be positive")]
    NonPositiveWeight { rule: String, value: f64 },
}

impl RuleSet {
    /// Parse a rule set from TOML, stamping each rule with the theme
    /// name and validating invariants.
    pub fn from_toml_str(raw: &str) -> Result<Self, RuleSetError> {
        let mut set: RuleSet = toml::from_str(raw)?;
        for rule in &mut set.rules {
            rule.parent_theme = set.theme.clone();
        }
        set.validate()?;
        Ok(set)
    }

    fn validate(&self) -> Result<(), RuleSetError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.name.as_str()) {
                return Err(RuleSetError::DuplicateRule {
                    theme: self.theme.clone(),
                    name: rule.name.clone(),
                });
            }
            for p in &rule.unique_patterns {
                check_confidence(&rule.name, "unique_patterns", p.confidence)?;
            }
            for (_, c) in rule.definitive_phrases.iter().chain(&rule.form_numbers) {
                check_confidence(&rule.name, "definitive_phrases/form_numbers", *c)?;
            }
            for (_, c) in &rule.filename_patterns {
                check_confidence(&rule.name, "filename_patterns", *c)?;
            }
            for s in &rule.structure_patterns {
                if s.weight <= 0.0 {
                    return Err(RuleSetError::NonPositiveWeight {
                        rule: rule.name.clone(),
                        value: s.weight,
                    });
                }
            }
        }
        Ok(())
    }
}

fn check_confidence(rule: &str, signal: &str, value: f64) -> Result<(), RuleSetError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(RuleSetError::ConfidenceOutOfRange {
            rule: rule.to_string(),
            signal: signal.to_string(),
            value,
        });
    }
    Ok(())
}

/// Load user-authored rule sets from a directory of `.toml` files.
pub fn load_rule_sets_from_dir(dir: &Path) -> anyhow::Result<Vec<RuleSet>> {
    let mut sets = Vec::new();
    if !dir.exists() {
        return Ok(sets);
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some("toml")
        {
            let content = fs::read_to_string(entry.path())?;
            sets.push(RuleSet::from_toml_str(&content)?);
        }
    }
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_rule_set() {
        let set = RuleSet::from_toml_str(
            r#"
            theme = "Test"

            [[rules]]
            name = "alpha"
            display_name = "Alpha"
            subtheme_category = "General"
            keywords = ["one", "two"]

            [rules.definitive_phrases]
            "alpha signal" = 0.9
            "#,
        )
        .unwrap();
        assert_eq!(set.theme, "Test");
        assert_eq!(set.rules.len(), 1);
        assert_eq!(set.rules[0].parent_theme, "Test");
        assert_eq!(set.rules[0].definitive_phrases["alpha signal"], 0.9);
    }

    #[test]
    fn rejects_duplicate_rule_names() {
        let err = RuleSet::from_toml_str(
            r#"
            theme = "Test"

            [[rules]]
            name = "alpha"
            display_name = "Alpha"
            subtheme_category = "General"

            [[rules]]
            name = "alpha"
            display_name = "Alpha Again"
            subtheme_category = "General"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, RuleSetError::DuplicateRule { .. }));
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let err = RuleSet::from_toml_str(
            r#"
            theme = "Test"

            [[rules]]
            name = "alpha"
            display_name = "Alpha"
            subtheme_category = "General"
            unique_patterns = [
                { pattern = 'alpha', confidence = 1.5, label = "bad" },
            ]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, RuleSetError::ConfidenceOutOfRange { .. }));
    }

    #[test]
    fn loads_rule_sets_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("custom.toml"),
            r#"
            theme = "Custom"

            [[rules]]
            name = "thing"
            display_name = "Thing"
            subtheme_category = "Stuff"
            "#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let sets = load_rule_sets_from_dir(dir.path()).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].theme, "Custom");
    }

    #[test]
    fn missing_dir_is_empty() {
        let sets = load_rule_sets_from_dir(Path::new("/nonexistent/rules")).unwrap();
        assert!(sets.is_empty());
    }
}
