use crate::rules::{Rule, RuleSet};
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// A compiled primary-tier regex signal.
#[derive(Debug)]
pub struct CompiledPattern {
    pub regex: Regex,
    pub confidence: f64,
    pub label: String,
}

#[derive(Debug)]
pub struct CompiledStructure {
    pub regex: Regex,
    pub weight: f64,
}

/// One rule with every pattern pre-compiled and every literal
/// lowercased. Built once per classifier, read-only afterward.
#[derive(Debug)]
pub struct CompiledRule {
    pub name: String,
    pub display_name: String,
    pub subtheme_category: String,
    pub unique_patterns: Vec<CompiledPattern>,
    pub definitive_phrases: Vec<(String, f64)>,
    pub form_numbers: Vec<(String, f64)>,
    pub structure_patterns: Vec<CompiledStructure>,
    pub structure_weight_total: f64,
    pub keywords: HashSet<String>,
    pub filename_patterns: Vec<(String, f64)>,
    pub exclude_patterns: Vec<Regex>,
    pub exclude_phrases: Vec<String>,
}

/// A theme's compiled rules in declaration order, plus the
/// category -> rule-name index for enumeration APIs.
#[derive(Debug)]
pub struct CompiledRuleSet {
    pub theme: String,
    pub rules: Vec<CompiledRule>,
    pub categories: BTreeMap<String, Vec<String>>,
}

/// Compile every rule in the set. A malformed pattern is dropped and
/// logged; the rule stays usable with its remaining signals.
pub fn compile(set: &RuleSet) -> CompiledRuleSet {
    let mut rules = Vec::with_capacity(set.rules.len());
    let mut categories: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for rule in &set.rules {
        categories
            .entry(rule.subtheme_category.clone())
            .or_default()
            .push(rule.name.clone());
        rules.push(compile_rule(rule));
    }
    CompiledRuleSet {
        theme: set.theme.clone(),
        rules,
        categories,
    }
}

fn compile_rule(rule: &Rule) -> CompiledRule {
    let unique_patterns = rule
        .unique_patterns
        .iter()
        .filter_map(|p| {
            compile_pattern(&rule.name, &p.pattern).map(|regex| CompiledPattern {
                regex,
                confidence: p.confidence,
                label: p.label.clone(),
            })
        })
        .collect();

    let structure_patterns: Vec<CompiledStructure> = rule
        .structure_patterns
        .iter()
        .filter_map(|s| {
            compile_pattern(&rule.name, &s.pattern).map(|regex| CompiledStructure {
                regex,
                weight: s.weight,
            })
        })
        .collect();
    let structure_weight_total = structure_patterns.iter().map(|s| s.weight).sum();

    let exclude_patterns = rule
        .exclude_patterns
        .iter()
        .filter_map(|p| compile_pattern(&rule.name, p))
        .collect();

    CompiledRule {
        name: rule.name.clone(),
        display_name: rule.display_name.clone(),
        subtheme_category: rule.subtheme_category.clone(),
        unique_patterns,
        definitive_phrases: lowercase_map(&rule.definitive_phrases),
        form_numbers: lowercase_map(&rule.form_numbers),
        structure_patterns,
        structure_weight_total,
        keywords: rule.keywords.iter().map(|k| k.to_lowercase()).collect(),
        filename_patterns: lowercase_map(&rule.filename_patterns),
        exclude_patterns,
        exclude_phrases: rule
            .exclude_phrases
            .iter()
            .map(|p| p.to_lowercase())
            .collect(),
    }
}

fn lowercase_map(map: &BTreeMap<String, f64>) -> Vec<(String, f64)> {
    map.iter().map(|(k, v)| (k.to_lowercase(), *v)).collect()
}

fn compile_pattern(rule: &str, pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!(rule, pattern, %err, "dropping malformed pattern");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;

    #[test]
    fn malformed_pattern_is_dropped_not_fatal() {
        let set = RuleSet::from_toml_str(
            r#"
            theme = "Test"

            [[rules]]
            name = "mixed"
            display_name = "Mixed"
            subtheme_category = "General"
            unique_patterns = [
                { pattern = '(unclosed', confidence = 0.9, label = "bad" },
                { pattern = 'valid\s+pattern', confidence = 0.8, label = "good" },
            ]
            structure_patterns = [
                { pattern = '[', weight = 1.0 },
                { pattern = 'fine', weight = 2.0 },
            ]
            "#,
        )
        .unwrap();
        let compiled = compile(&set);
        let rule = &compiled.rules[0];
        assert_eq!(rule.unique_patterns.len(), 1);
        assert_eq!(rule.unique_patterns[0].label, "good");
        assert_eq!(rule.structure_patterns.len(), 1);
        assert_eq!(rule.structure_weight_total, 2.0);
    }

    #[test]
    fn builds_category_index_in_declaration_order() {
        let set = RuleSet::from_toml_str(
            r#"
            theme = "Test"

            [[rules]]
            name = "a"
            display_name = "A"
            subtheme_category = "One"

            [[rules]]
            name = "b"
            display_name = "B"
            subtheme_category = "Two"

            [[rules]]
            name = "c"
            display_name = "C"
            subtheme_category = "One"
            "#,
        )
        .unwrap();
        let compiled = compile(&set);
        assert_eq!(compiled.categories["One"], vec!["a", "c"]);
        assert_eq!(compiled.categories["Two"], vec!["b"]);
    }

    #[test]
    fn literals_are_lowercased() {
        let set = RuleSet::from_toml_str(
            r#"
            theme = "Test"

            [[rules]]
            name = "a"
            display_name = "A"
            subtheme_category = "One"
            keywords = ["Mixed", "CASE"]
            exclude_phrases = ["Do Not Match"]

            [rules.filename_patterns]
            "Statement" = 0.5
            "#,
        )
        .unwrap();
        let rule = &compile(&set).rules[0];
        assert!(rule.keywords.contains("mixed"));
        assert!(rule.keywords.contains("case"));
        assert_eq!(rule.filename_patterns[0].0, "statement");
        assert_eq!(rule.exclude_phrases[0], "do not match");
    }
}
